//! Merge of loosely-typed source graphs into persisted entities.
//!
//! - `mod.rs` - [`ObjectResolver`] facade
//! - `node.rs` - recursive per-node merge
//! - `collection.rs` - identity-based reconciliation of collection fields
//! - `names.rs` - candidate source names for a field
//! - `access.rs` - reads from source nodes
//! - `coerce.rs` - scalar coercion and date parsing

mod access;
mod coerce;
mod collection;
mod names;
mod node;

pub use coerce::parse_datetime;

use crate::config::{ResolutionFlags, ResolverConfig};
use crate::core::{ResolveError, Result};
use crate::entity::EntityHandle;
use crate::metadata::{AlternateNameSource, ClassDescriptor, DescriptorCache, EntityMetadataProvider};
use crate::store::EntityStore;
use names::PropertyNameResolver;
use node::{NodeResolver, Resolved};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{Level, debug_span, event};

/// Class identifier of a source node that carries no type of its own.
pub const UNTYPED_CLASS: &str = "object";

/// Entry point of a merge.
///
/// Holds the collaborators and the descriptor cache shared by every call. One
/// resolver can serve concurrent calls.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(MemoryStore::new().with_class(tag_schema));
/// let resolver = ObjectResolver::new(store.clone(), store.clone());
///
/// let tag = resolver.resolve(&json!({"id": 3, "title": "rust"}), "Tag")?;
/// store.flush()?;
/// ```
pub struct ObjectResolver {
    metadata: Arc<dyn EntityMetadataProvider>,
    store: Arc<dyn EntityStore>,
    alternate_names: Option<Arc<dyn AlternateNameSource>>,
    config: ResolverConfig,
    descriptors: DescriptorCache,
}

impl ObjectResolver {
    pub fn new(metadata: Arc<dyn EntityMetadataProvider>, store: Arc<dyn EntityStore>) -> Self {
        Self {
            metadata,
            store,
            alternate_names: None,
            config: ResolverConfig::default(),
            descriptors: DescriptorCache::new(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs a source of alternate field names. It is consulted only when
    /// [`ResolverConfig::serialized_name_tag`] is set.
    pub fn with_alternate_names(mut self, source: Arc<dyn AlternateNameSource>) -> Self {
        self.alternate_names = Some(source);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// [`resolve_object`](Self::resolve_object) with default flags and no existing target.
    pub fn resolve(&self, source: &JsonValue, class: &str) -> Result<Option<EntityHandle>> {
        self.resolve_object(source, Some(class), None, ResolutionFlags::default())
    }

    /// Merges `source` into an entity of `class`.
    ///
    /// The class falls back to the class of `target` when not given. With
    /// [`ResolutionFlags::persist`] the target is looked up by the source
    /// identity and every resolved entity is staged. An empty source resolves
    /// to `None`. Any failure aborts the whole call.
    pub fn resolve_object(
        &self,
        source: &JsonValue,
        class: Option<&str>,
        target: Option<EntityHandle>,
        flags: ResolutionFlags,
    ) -> Result<Option<EntityHandle>> {
        let class = self.target_class(class, target.as_ref())?;
        let span = debug_span!("resolve_object", class = %class, flags = flags.bits());
        let _enter = span.enter();

        if !self.metadata.is_known(&class) {
            return Err(ResolveError::ClassNotFound(class));
        }
        let class = if flags.skip_resolving_class_name {
            class
        } else {
            self.metadata.resolve_concrete_class(&class)?
        };

        let resolved = self.node_resolver(flags).resolve(source, &class, target)?;
        event!(Level::DEBUG, class = %class, resolved = resolved.is_some(), "resolution finished");

        Ok(resolved.and_then(Resolved::into_entity))
    }

    /// Concrete persistable class behind an interface, proxy or alias.
    pub fn concrete_class(&self, class: &str) -> Result<String> {
        if !self.metadata.is_known(class) {
            return Err(ResolveError::ClassNotFound(class.to_string()));
        }
        self.metadata.resolve_concrete_class(class)
    }

    pub fn descriptor(&self, class: &str) -> Result<Arc<ClassDescriptor>> {
        self.descriptors.get_or_load(class, self.metadata.as_ref())
    }

    /// Source names tried for `class::field`, in lookup order.
    pub fn name_variants(&self, class: &str, field: &str) -> Result<Vec<String>> {
        self.names().names_for(class, field)
    }

    fn target_class(&self, class: Option<&str>, target: Option<&EntityHandle>) -> Result<String> {
        let class = match (class.filter(|class| !class.is_empty()), target) {
            (Some(class), _) => class.to_string(),
            (None, Some(target)) => target.class_name()?,
            (None, None) => String::new(),
        };
        if class.is_empty() || class == UNTYPED_CLASS {
            return Err(ResolveError::UnableToGetClassName);
        }
        Ok(class)
    }

    fn names(&self) -> PropertyNameResolver<'_> {
        let alternates = match (&self.alternate_names, &self.config.serialized_name_tag) {
            (Some(source), Some(tag)) => Some((source.as_ref(), tag.as_str())),
            _ => None,
        };
        PropertyNameResolver::new(&self.descriptors, self.metadata.as_ref(), alternates)
    }

    fn node_resolver(&self, flags: ResolutionFlags) -> NodeResolver<'_> {
        NodeResolver {
            metadata: self.metadata.as_ref(),
            store: self.store.as_ref(),
            cache: &self.descriptors,
            names: self.names(),
            flags,
        }
    }
}

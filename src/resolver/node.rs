use super::access::{ValueAccessor, is_empty_node};
use super::coerce::coerce;
use super::collection::CollectionReconciler;
use super::names::PropertyNameResolver;
use crate::config::ResolutionFlags;
use crate::core::{ResolveError, Result, Value};
use crate::entity::EntityHandle;
use crate::metadata::{
    ClassDescriptor, DescriptorCache, EntityMetadataProvider, FieldCategory, IDENTITY_FIELD,
};
use crate::store::EntityStore;
use serde_json::Value as JsonValue;
use tracing::{Level, event};

/// Outcome of resolving one source node.
#[derive(Debug, Clone)]
pub(crate) enum Resolved {
    /// A managed entity, found or created.
    Entity(EntityHandle),
    /// The source node itself, returned when no class applies.
    Plain(JsonValue),
}

impl Resolved {
    pub(crate) fn into_entity(self) -> Option<EntityHandle> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Plain(_) => None,
        }
    }
}

/// Recursive merge of one source node into one target entity.
///
/// Built per `resolve_object` call; flags are fixed for the whole tree.
pub(crate) struct NodeResolver<'r> {
    pub(crate) metadata: &'r dyn EntityMetadataProvider,
    pub(crate) store: &'r dyn EntityStore,
    pub(crate) cache: &'r DescriptorCache,
    pub(crate) names: PropertyNameResolver<'r>,
    pub(crate) flags: ResolutionFlags,
}

impl<'r> NodeResolver<'r> {
    /// Resolves `source` as an instance of `class`, merging into `existing`
    /// when given. Empty nodes resolve to nothing.
    pub(crate) fn resolve(
        &self,
        source: &JsonValue,
        class: &str,
        existing: Option<EntityHandle>,
    ) -> Result<Option<Resolved>> {
        if is_empty_node(source) {
            return Ok(None);
        }
        if class.is_empty() {
            return Ok(Some(Resolved::Plain(source.clone())));
        }

        let descriptor = self.cache.get_or_load(class, self.metadata)?;
        let target = match existing {
            Some(target) => target,
            None => self.acquire(source, class)?,
        };

        self.apply_scalars(source, &target, &descriptor)?;
        self.apply_singles(source, &target, &descriptor)?;
        self.apply_collections(source, &target, &descriptor)?;

        if self.flags.persist {
            self.store.stage(&target)?;
        }

        Ok(Some(Resolved::Entity(target)))
    }

    /// Persisted instance matching the source identity, or a new one.
    fn acquire(&self, source: &JsonValue, class: &str) -> Result<EntityHandle> {
        if self.flags.persist {
            if let Some(id) = ValueAccessor::identity(source)? {
                if let Some(found) = self.store.find_by_id(class, &id)? {
                    event!(Level::TRACE, class, id = %id, "persisted target found");
                    return Ok(found);
                }
            }
        }
        self.store.instantiate(class)
    }

    fn apply_scalars(
        &self,
        source: &JsonValue,
        target: &EntityHandle,
        descriptor: &ClassDescriptor,
    ) -> Result<()> {
        let class = descriptor.class();

        for field in descriptor.fields(FieldCategory::Scalar) {
            if field.is_identity() && !target.read()?.is_writable(IDENTITY_FIELD) {
                self.check_identity(source, target, class)?;
                continue;
            }

            let names = self.names.names_for(class, &field.name)?;
            let Some(raw) = ValueAccessor::read(source, &names)? else {
                continue;
            };
            let value = match field.scalar_type() {
                Some(scalar_type) => coerce(raw, scalar_type),
                None => Value::from_json(raw),
            };

            event!(Level::TRACE, class, field = %field.name, value = %value, "scalar set");
            target
                .write()?
                .set(&field.name, value)
                .map_err(|reason| ResolveError::set_value(class, &field.name, reason))?;
        }

        Ok(())
    }

    /// Identity of a target without an identity setter: agreeing values pass,
    /// a differing non-empty source identity fails unless the check is off.
    fn check_identity(&self, source: &JsonValue, target: &EntityHandle, class: &str) -> Result<()> {
        let target_id = target.identity()?;
        let source_id = ValueAccessor::identity(source)?;

        match (target_id, source_id) {
            (Some(current), Some(incoming)) if current.identical(&incoming) => Ok(()),
            (_, Some(incoming)) if self.flags.error_if_cant_set_id => {
                event!(Level::DEBUG, class, id = %incoming, "identity cannot be written");
                Err(ResolveError::UnableToSetId {
                    class: class.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn apply_singles(
        &self,
        source: &JsonValue,
        target: &EntityHandle,
        descriptor: &ClassDescriptor,
    ) -> Result<()> {
        let class = descriptor.class();

        for field in descriptor.fields(FieldCategory::SingleAssociation) {
            let names = self.names.names_for(class, &field.name)?;
            let Some(raw) = ValueAccessor::read(source, &names)? else {
                continue;
            };

            let target_class = field.target_class().unwrap_or_default();
            let reference = match self.resolve(raw, target_class, None)? {
                Some(Resolved::Entity(entity)) => Some(entity),
                Some(Resolved::Plain(value)) => {
                    event!(Level::DEBUG, class, field = %field.name, value = %value, "untyped association value");
                    return Err(ResolveError::set_value(
                        class,
                        &field.name,
                        "association target has no class",
                    ));
                }
                None => None,
            };

            event!(Level::TRACE, class, field = %field.name, cleared = reference.is_none(), "association set");
            target
                .write()?
                .set_reference(&field.name, reference)
                .map_err(|reason| ResolveError::set_value(class, &field.name, reason))?;
        }

        Ok(())
    }

    fn apply_collections(
        &self,
        source: &JsonValue,
        target: &EntityHandle,
        descriptor: &ClassDescriptor,
    ) -> Result<()> {
        let class = descriptor.class();

        for field in descriptor.fields(FieldCategory::CollectionAssociation) {
            let names = self.names.names_for(class, &field.name)?;
            let Some(raw) = ValueAccessor::read(source, &names)? else {
                continue;
            };

            let items: Vec<&JsonValue> = match raw {
                JsonValue::Array(items) => items.iter().collect(),
                JsonValue::Object(map) => map.values().collect(),
                _ => Vec::new(),
            };

            CollectionReconciler::new(self, class, field).reconcile(&items, target)?;
        }

        Ok(())
    }
}

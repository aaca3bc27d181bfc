use super::{ClassDescriptor, EntityMetadataProvider};
use crate::core::Result;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{Level, event};

/// Descriptor table keyed by fully qualified class identifier.
///
/// Entries are never invalidated. Readers work on a copy-on-write snapshot, and
/// concurrent first population of one class is idempotent: descriptors are
/// computed outside the lock and the last writer wins with an equal value.
#[derive(Default)]
pub struct DescriptorCache {
    entries: RwLock<im::HashMap<String, Arc<ClassDescriptor>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached descriptor for `class`, loading it from `provider` on first use.
    pub fn get_or_load(
        &self,
        class: &str,
        provider: &dyn EntityMetadataProvider,
    ) -> Result<Arc<ClassDescriptor>> {
        if let Some(descriptor) = self.get(class) {
            return Ok(descriptor);
        }

        let fields = provider.fields_of(class)?;
        let descriptor = Arc::new(ClassDescriptor::new(class, fields));
        event!(Level::DEBUG, class, fields = descriptor_len(&descriptor), "class descriptor cached");

        // Entries are immutable values, so a poisoned lock holds nothing half-written.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(class.to_string(), Arc::clone(&descriptor));

        Ok(descriptor)
    }

    pub fn get(&self, class: &str) -> Option<Arc<ClassDescriptor>> {
        self.snapshot().get(class).cloned()
    }

    pub fn contains(&self, class: &str) -> bool {
        self.snapshot().contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cheap structural-sharing copy of the current table.
    pub fn snapshot(&self) -> im::HashMap<String, Arc<ClassDescriptor>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn descriptor_len(descriptor: &ClassDescriptor) -> usize {
    use super::FieldCategory::*;
    [Scalar, SingleAssociation, CollectionAssociation]
        .iter()
        .map(|category| descriptor.fields(*category).len())
        .sum()
}

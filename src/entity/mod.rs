//! Target entities as seen by the resolver.
//!
//! The resolver only talks to entities through the [`Entity`] trait, so any
//! persisted type can take part in a merge as long as it exposes named fields
//! and add/remove mutators for its collections.

mod record;

pub use record::{ClassSchema, Record};

use crate::core::{ResolveError, Result, Value};
use crate::metadata::IDENTITY_FIELD;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A typed record with named scalar fields and associations.
///
/// Mutating methods report rejection with a human readable reason; the resolver
/// turns it into [`ResolveError::UnableToSetValue`].
pub trait Entity: Send + Sync + fmt::Debug {
    /// Concrete class identifier of this instance.
    fn class_name(&self) -> &str;

    /// Scalar field value, `None` when the entity has no such field.
    fn get(&self, field: &str) -> Option<Value>;

    /// Whether the entity exposes a setter for `field`.
    fn is_writable(&self, field: &str) -> bool;

    fn set(&mut self, field: &str, value: Value) -> std::result::Result<(), String>;

    /// Current value of a single-valued association.
    fn reference(&self, field: &str) -> Option<EntityHandle>;

    fn set_reference(
        &mut self,
        field: &str,
        value: Option<EntityHandle>,
    ) -> std::result::Result<(), String>;

    /// Members of a collection association, `None` when it was never initialised.
    fn collection(&self, field: &str) -> Option<Vec<EntityHandle>>;

    /// Invokes a named collection mutator such as `addTag` or `removeTag`.
    fn apply_mutator(&mut self, mutator: &str, item: EntityHandle) -> std::result::Result<(), String>;

    /// Writes a store-generated identity, bypassing the public setter.
    fn assign_identity(&mut self, id: Value) -> std::result::Result<(), String> {
        self.set(IDENTITY_FIELD, id)
    }
}

/// Shared, lockable reference to an entity instance.
///
/// Two handles are the same instance when [`EntityHandle::ptr_eq`] holds; the
/// store hands out the same handle for the same identity.
#[derive(Clone)]
pub struct EntityHandle {
    inner: Arc<RwLock<dyn Entity>>,
}

impl EntityHandle {
    pub fn new<E: Entity + 'static>(entity: E) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    pub fn ptr_eq(&self, other: &EntityHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, dyn Entity>> {
        self.inner.read().map_err(|poisoned| {
            let class = poisoned.get_ref().class_name().to_string();
            ResolveError::get_value(class, "entity lock poisoned")
        })
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, dyn Entity + 'static>> {
        self.inner.write().map_err(|poisoned| {
            let class = poisoned.get_ref().class_name().to_string();
            ResolveError::set_value(class, "*", "entity lock poisoned")
        })
    }

    pub fn class_name(&self) -> Result<String> {
        Ok(self.read()?.class_name().to_string())
    }

    /// Scalar field value; `Null` when the field is missing.
    pub fn get(&self, field: &str) -> Result<Value> {
        Ok(self.read()?.get(field).unwrap_or(Value::Null))
    }

    /// Non-empty identity of the entity, if it has one.
    pub fn identity(&self) -> Result<Option<Value>> {
        let id = self.get(IDENTITY_FIELD)?;
        Ok((!id.is_empty_identity()).then_some(id))
    }

    /// Like [`identity`](Self::identity) but never blocks: `None` while the
    /// entity is locked for writing.
    pub fn try_identity(&self) -> Option<Value> {
        let id = self.inner.try_read().ok()?.get(IDENTITY_FIELD)?;
        (!id.is_empty_identity()).then_some(id)
    }

    pub fn reference(&self, field: &str) -> Result<Option<EntityHandle>> {
        Ok(self.read()?.reference(field))
    }

    /// Collection members; an uninitialised collection reads as empty.
    pub fn collection(&self, field: &str) -> Result<Vec<EntityHandle>> {
        Ok(self.read()?.collection(field).unwrap_or_default())
    }
}

impl fmt::Debug for EntityHandle {
    // Only class and identity: entity graphs may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Ok(entity) => {
                let id = entity.get(IDENTITY_FIELD).unwrap_or(Value::Null);
                write!(f, "{}#{}", entity.class_name(), id)
            }
            Err(_) => write!(f, "<locked entity>"),
        }
    }
}

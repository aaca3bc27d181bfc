//! Persistence collaborator contract and the in-memory implementation.

mod memory;

pub use memory::MemoryStore;

use crate::core::{Result, Value};
use crate::entity::EntityHandle;

/// Lookup, creation and staging of entities.
///
/// Flushing and transactions stay with the implementation; the resolver only
/// ever stages.
pub trait EntityStore: Send + Sync {
    /// Persisted instance of `class` with identity `id`.
    fn find_by_id(&self, class: &str, id: &Value) -> Result<Option<EntityHandle>>;

    /// Fresh, unmanaged instance of a concrete class.
    fn instantiate(&self, class: &str) -> Result<EntityHandle>;

    /// Marks `entity` for the next flush. Staging the same instance twice is a no-op.
    fn stage(&self, entity: &EntityHandle) -> Result<()>;
}

use super::EntityStore;
use crate::core::{ResolveError, Result, Value};
use crate::entity::{ClassSchema, EntityHandle, Record};
use crate::metadata::{AlternateNameSource, EntityMetadataProvider, FieldDescriptor, IDENTITY_FIELD};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{Level, event};

/// `(class, typed identity)`; the type prefix keeps `1` and `"1"` apart.
type IdentityKey = (String, String);

fn identity_key(class: &str, id: &Value) -> IdentityKey {
    (class.to_string(), format!("{}:{}", id.type_name(), id))
}

#[derive(Default)]
struct UnitOfWork {
    identity_map: HashMap<IdentityKey, EntityHandle>,
    // Staged entities that already carry an identity; first one staged wins.
    pending: HashMap<IdentityKey, EntityHandle>,
    staged: Vec<EntityHandle>,
    sequences: HashMap<String, i64>,
}

/// In-memory class registry and entity store.
///
/// Serves as both metadata provider and store for a resolver. A staged entity
/// that carries an identity is findable at once; the others get theirs at
/// [`flush`](MemoryStore::flush).
#[derive(Default)]
pub struct MemoryStore {
    classes: RwLock<HashMap<String, Arc<ClassSchema>>>,
    aliases: RwLock<HashMap<String, String>>,
    unit: Mutex<UnitOfWork>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(self, schema: ClassSchema) -> Self {
        self.register(schema);
        self
    }

    /// Registers a class and the interfaces it declares.
    pub fn register(&self, schema: ClassSchema) -> Arc<ClassSchema> {
        let schema = Arc::new(schema);

        {
            let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
            for interface in schema.interfaces() {
                aliases.insert(interface.clone(), schema.name().to_string());
            }
        }

        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        classes.insert(schema.name().to_string(), Arc::clone(&schema));
        schema
    }

    /// Makes `alias` (a proxy or interface name) resolve to `concrete`.
    pub fn register_alias(&self, alias: impl Into<String>, concrete: impl Into<String>) {
        let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
        aliases.insert(alias.into(), concrete.into());
    }

    pub fn schema(&self, class: &str) -> Result<Arc<ClassSchema>> {
        let concrete = self.concrete_name(class);
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        classes
            .get(&concrete)
            .cloned()
            .ok_or_else(|| ResolveError::ClassNotFound(class.to_string()))
    }

    /// Writes every staged entity into the identity map, generating integer
    /// identities where the class declares them. Returns the number flushed.
    pub fn flush(&self) -> Result<usize> {
        let mut unit = self.unit();
        let staged = std::mem::take(&mut unit.staged);
        unit.pending.clear();
        let count = staged.len();

        for entity in staged {
            let class = entity.class_name()?;
            let id = match entity.identity()? {
                Some(id) => id,
                None => {
                    if !self.schema(&class)?.has_generated_identity() {
                        continue;
                    }
                    let id = Self::next_identity(&mut unit, &class);
                    entity
                        .write()?
                        .assign_identity(id.clone())
                        .map_err(|reason| ResolveError::set_value(&class, IDENTITY_FIELD, reason))?;
                    id
                }
            };

            event!(Level::TRACE, class = %class, id = %id, "entity flushed");
            unit.identity_map.insert(identity_key(&class, &id), entity);
        }

        event!(Level::DEBUG, count, "unit of work flushed");
        Ok(count)
    }

    /// Stages and flushes in one step.
    pub fn persist(&self, entity: &EntityHandle) -> Result<()> {
        self.stage(entity)?;
        self.flush()?;
        Ok(())
    }

    /// Discards staged entities that were never flushed.
    pub fn clear(&self) {
        let mut unit = self.unit();
        unit.staged.clear();
        unit.pending.clear();
    }

    pub fn staged_count(&self) -> usize {
        self.unit().staged.len()
    }

    pub fn is_staged(&self, entity: &EntityHandle) -> bool {
        self.unit().staged.iter().any(|staged| staged.ptr_eq(entity))
    }

    /// Number of persisted entities.
    pub fn len(&self) -> usize {
        self.unit().identity_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unit(&self) -> MutexGuard<'_, UnitOfWork> {
        self.unit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn concrete_name(&self, class: &str) -> String {
        let aliases = self.aliases.read().unwrap_or_else(PoisonError::into_inner);
        aliases.get(class).cloned().unwrap_or_else(|| class.to_string())
    }

    fn next_identity(unit: &mut UnitOfWork, class: &str) -> Value {
        loop {
            let next = unit.sequences.entry(class.to_string()).or_insert(0);
            *next += 1;
            let candidate = Value::Integer(*next);
            if !unit.identity_map.contains_key(&identity_key(class, &candidate)) {
                return candidate;
            }
        }
    }
}

impl EntityStore for MemoryStore {
    fn find_by_id(&self, class: &str, id: &Value) -> Result<Option<EntityHandle>> {
        let key = identity_key(&self.concrete_name(class), id);
        let unit = self.unit();
        let found = unit.identity_map.get(&key).or_else(|| unit.pending.get(&key));
        Ok(found.cloned())
    }

    fn instantiate(&self, class: &str) -> Result<EntityHandle> {
        let schema = self.schema(class)?;
        Ok(EntityHandle::new(Record::new(schema)))
    }

    fn stage(&self, entity: &EntityHandle) -> Result<()> {
        // Read the entity before taking the unit lock.
        let key = match entity.identity()? {
            Some(id) => Some(identity_key(&entity.class_name()?, &id)),
            None => None,
        };

        let mut unit = self.unit();
        if !unit.staged.iter().any(|staged| staged.ptr_eq(entity)) {
            unit.staged.push(entity.clone());
        }
        if let Some(key) = key {
            unit.pending.entry(key).or_insert_with(|| entity.clone());
        }
        Ok(())
    }
}

impl EntityMetadataProvider for MemoryStore {
    fn is_known(&self, class: &str) -> bool {
        let known = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(class);
        known
            || self
                .aliases
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(class)
    }

    fn resolve_concrete_class(&self, class: &str) -> Result<String> {
        if !self.is_known(class) {
            return Err(ResolveError::ClassNotFound(class.to_string()));
        }
        Ok(self.concrete_name(class))
    }

    fn fields_of(&self, class: &str) -> Result<Vec<FieldDescriptor>> {
        Ok(self.schema(class)?.fields().to_vec())
    }
}

impl AlternateNameSource for MemoryStore {
    fn alternate_names(&self, class: &str, field: &str, tag: &str) -> Vec<String> {
        self.schema(class)
            .map(|schema| schema.alternate_names(field, tag))
            .unwrap_or_default()
    }
}

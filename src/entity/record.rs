use super::{Entity, EntityHandle};
use crate::core::{ScalarType, Value};
use crate::metadata::{FieldCategory, FieldDescriptor, FieldKind, IDENTITY_FIELD};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Declaration of a persistable class.
///
/// Built fluently and registered with a store:
///
/// ```ignore
/// let tag = ClassSchema::new("Tag")
///     .id(ScalarType::Integer)
///     .scalar("title", ScalarType::String)
///     .serialized_name("title", "SerializedName", &["name"]);
/// ```
#[derive(Debug, Clone)]
pub struct ClassSchema {
    name: String,
    interfaces: Vec<String>,
    fields: Vec<FieldDescriptor>,
    defaults: HashMap<String, Value>,
    read_only: HashSet<String>,
    rejecting: HashMap<String, String>,
    serialized_names: HashMap<(String, String), Vec<String>>,
    generated_identity: bool,
}

impl ClassSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
            fields: Vec::new(),
            defaults: HashMap::new(),
            read_only: HashSet::new(),
            rejecting: HashMap::new(),
            serialized_names: HashMap::new(),
            generated_identity: false,
        }
    }

    /// Registers an interface (or alias) that resolves to this class.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Store-generated identity with a public setter.
    pub fn id(mut self, scalar_type: ScalarType) -> Self {
        self.fields.push(FieldDescriptor::scalar(IDENTITY_FIELD, scalar_type));
        self.generated_identity = true;
        self
    }

    /// Store-generated identity without a setter.
    pub fn id_without_setter(self, scalar_type: ScalarType) -> Self {
        self.id(scalar_type).read_only(IDENTITY_FIELD)
    }

    pub fn scalar(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.fields.push(FieldDescriptor::scalar(name, scalar_type));
        self
    }

    pub fn scalar_with_default(
        mut self,
        name: impl Into<String>,
        scalar_type: ScalarType,
        default: impl Into<Value>,
    ) -> Self {
        let name = name.into();
        self.defaults.insert(name.clone(), default.into());
        self.scalar(name, scalar_type)
    }

    pub fn single(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.fields.push(FieldDescriptor::single(name, target));
        self
    }

    pub fn collection(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.fields.push(FieldDescriptor::collection(name, target));
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Field mapped for reading only.
    pub fn read_only(mut self, field: impl Into<String>) -> Self {
        self.read_only.insert(field.into());
        self
    }

    /// Field whose setter always fails with `reason`.
    pub fn rejecting(mut self, field: impl Into<String>, reason: impl Into<String>) -> Self {
        self.rejecting.insert(field.into(), reason.into());
        self
    }

    /// Alternate source names for `field`, declared under metadata `tag`.
    pub fn serialized_name(mut self, field: &str, tag: &str, names: &[&str]) -> Self {
        self.serialized_names.insert(
            (field.to_string(), tag.to_string()),
            names.iter().map(|name| name.to_string()).collect(),
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn is_read_only(&self, field: &str) -> bool {
        self.read_only.contains(field)
    }

    pub fn alternate_names(&self, field: &str, tag: &str) -> Vec<String> {
        self.serialized_names
            .get(&(field.to_string(), tag.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_generated_identity(&self) -> bool {
        self.generated_identity
    }

    fn check_writable(&self, field: &str) -> Result<(), String> {
        if self.is_read_only(field) {
            return Err(format!("'{}::{}' has no setter", self.name, field));
        }
        if let Some(reason) = self.rejecting.get(field) {
            return Err(reason.clone());
        }
        Ok(())
    }
}

/// Schema-driven entity instance.
pub struct Record {
    schema: Arc<ClassSchema>,
    scalars: BTreeMap<String, Value>,
    references: BTreeMap<String, Option<EntityHandle>>,
    collections: BTreeMap<String, Vec<EntityHandle>>,
}

impl Record {
    pub fn new(schema: Arc<ClassSchema>) -> Self {
        let mut scalars = BTreeMap::new();
        let mut references = BTreeMap::new();
        let mut collections = BTreeMap::new();

        for field in schema.fields() {
            match field.category() {
                FieldCategory::Scalar => {
                    let default = schema.defaults.get(&field.name).cloned().unwrap_or(Value::Null);
                    scalars.insert(field.name.clone(), default);
                }
                FieldCategory::SingleAssociation => {
                    references.insert(field.name.clone(), None);
                }
                FieldCategory::CollectionAssociation => {
                    collections.insert(field.name.clone(), Vec::new());
                }
            }
        }

        Self {
            schema,
            scalars,
            references,
            collections,
        }
    }

    pub fn schema(&self) -> &ClassSchema {
        &self.schema
    }

    fn remove_member(members: &mut Vec<EntityHandle>, item: &EntityHandle) {
        if let Some(pos) = members.iter().position(|member| member.ptr_eq(item)) {
            members.remove(pos);
            return;
        }

        // Members may include this very entity, so identities are read without blocking.
        let Some(id) = item.try_identity() else {
            return;
        };
        if let Some(pos) = members
            .iter()
            .position(|member| member.try_identity().is_some_and(|other| other.identical(&id)))
        {
            members.remove(pos);
        }
    }
}

impl Entity for Record {
    fn class_name(&self) -> &str {
        self.schema.name()
    }

    fn get(&self, field: &str) -> Option<Value> {
        self.scalars.get(field).cloned()
    }

    fn is_writable(&self, field: &str) -> bool {
        self.schema.field_descriptor(field).is_some() && !self.schema.is_read_only(field)
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), String> {
        let Some(FieldKind::Scalar(scalar_type)) =
            self.schema.field_descriptor(field).map(|f| &f.kind)
        else {
            return Err(format!("'{}' has no scalar field '{}'", self.schema.name(), field));
        };
        self.schema.check_writable(field)?;

        if !scalar_type.is_compatible(&value) {
            return Err(format!(
                "expected {}, got {}",
                scalar_type,
                value.type_name()
            ));
        }

        self.scalars.insert(field.to_string(), value);
        Ok(())
    }

    fn reference(&self, field: &str) -> Option<EntityHandle> {
        self.references.get(field).cloned().flatten()
    }

    fn set_reference(&mut self, field: &str, value: Option<EntityHandle>) -> Result<(), String> {
        if !self.references.contains_key(field) {
            return Err(format!("'{}' has no association '{}'", self.schema.name(), field));
        }
        self.schema.check_writable(field)?;

        self.references.insert(field.to_string(), value);
        Ok(())
    }

    fn collection(&self, field: &str) -> Option<Vec<EntityHandle>> {
        self.collections.get(field).cloned()
    }

    fn apply_mutator(&mut self, mutator: &str, item: EntityHandle) -> Result<(), String> {
        let target = self.schema.fields().iter().find_map(|field| {
            let (add, remove) = field.mutators()?;
            if add == mutator {
                Some((field.name.clone(), true))
            } else if remove == mutator {
                Some((field.name.clone(), false))
            } else {
                None
            }
        });

        let Some((field, adding)) = target else {
            return Err(format!("'{}' has no method '{}'", self.schema.name(), mutator));
        };
        self.schema.check_writable(&field)?;

        let members = self.collections.entry(field).or_default();
        if adding {
            members.push(item);
        } else {
            Self::remove_member(members, &item);
        }
        Ok(())
    }

    fn assign_identity(&mut self, id: Value) -> Result<(), String> {
        if !self.scalars.contains_key(IDENTITY_FIELD) {
            return Err(format!("'{}' has no identity field", self.schema.name()));
        }
        self.scalars.insert(IDENTITY_FIELD.to_string(), id);
        Ok(())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.schema.name())
            .field("scalars", &self.scalars)
            .field("references", &self.references)
            .field("collections", &self.collections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_schema() -> Arc<ClassSchema> {
        Arc::new(
            ClassSchema::new("Tag")
                .id(ScalarType::Integer)
                .scalar("title", ScalarType::String)
                .scalar_with_default("enabled", ScalarType::Boolean, true),
        )
    }

    fn user_schema() -> Arc<ClassSchema> {
        Arc::new(
            ClassSchema::new("User")
                .id(ScalarType::Integer)
                .scalar("username", ScalarType::String)
                .single("closestRelative", "User")
                .collection("tags", "Tag")
                .rejecting("username", "usernames are immutable"),
        )
    }

    fn tag(id: i64) -> EntityHandle {
        let mut record = Record::new(tag_schema());
        record.set("id", Value::Integer(id)).unwrap();
        EntityHandle::new(record)
    }

    #[test]
    fn test_new_record_uses_defaults() {
        let record = Record::new(tag_schema());
        assert_eq!(record.get("id"), Some(Value::Null));
        assert_eq!(record.get("enabled"), Some(Value::Boolean(true)));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_set_checks_declared_type() {
        let mut record = Record::new(tag_schema());
        assert!(record.set("title", Value::from("php")).is_ok());
        assert!(record.set("title", Value::Null).is_ok());

        let err = record.set("enabled", Value::from("yes")).unwrap_err();
        assert!(err.contains("boolean"));
        assert!(record.set("missing", Value::Integer(1)).is_err());
    }

    #[test]
    fn test_read_only_and_rejecting_fields() {
        let schema = Arc::new(
            ClassSchema::new("Reference")
                .id_without_setter(ScalarType::Integer)
                .scalar("description", ScalarType::String)
                .rejecting("description", "description is computed"),
        );
        let mut record = Record::new(schema);

        assert!(!record.is_writable("id"));
        assert!(record.set("id", Value::Integer(4)).is_err());
        assert_eq!(
            record.set("description", Value::from("x")).unwrap_err(),
            "description is computed"
        );

        record.assign_identity(Value::Integer(4)).unwrap();
        assert_eq!(record.get("id"), Some(Value::Integer(4)));
    }

    #[test]
    fn test_mutators_add_and_remove() {
        let mut user = Record::new(user_schema());
        let first = tag(1);
        let second = tag(2);

        user.apply_mutator("addTag", first.clone()).unwrap();
        user.apply_mutator("addTag", second.clone()).unwrap();
        assert_eq!(user.collection("tags").unwrap().len(), 2);

        user.apply_mutator("removeTag", first.clone()).unwrap();
        let tags = user.collection("tags").unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags[0].ptr_eq(&second));

        assert!(user.apply_mutator("addFriend", first).is_err());
    }

    #[test]
    fn test_remove_matches_by_identity() {
        let mut user = Record::new(user_schema());
        user.apply_mutator("addTag", tag(7)).unwrap();

        // A different instance carrying the same identity.
        user.apply_mutator("removeTag", tag(7)).unwrap();
        assert!(user.collection("tags").unwrap().is_empty());
    }

    #[test]
    fn test_references() {
        let mut user = Record::new(user_schema());
        let other = EntityHandle::new(Record::new(user_schema()));

        user.set_reference("closestRelative", Some(other.clone())).unwrap();
        assert!(user.reference("closestRelative").unwrap().ptr_eq(&other));

        user.set_reference("closestRelative", None).unwrap();
        assert!(user.reference("closestRelative").is_none());
        assert!(user.set_reference("mother", None).is_err());
    }

    #[test]
    fn test_alternate_names() {
        let schema = ClassSchema::new("Tag")
            .scalar("title", ScalarType::String)
            .serialized_name("title", "SerializedName", &["name", "label"]);

        assert_eq!(schema.alternate_names("title", "SerializedName"), vec!["name", "label"]);
        assert!(schema.alternate_names("title", "Other").is_empty());
    }
}

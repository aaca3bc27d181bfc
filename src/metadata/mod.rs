//! Entity metadata consumed by the resolver.
//!
//! - `mod.rs` - collaborator traits and field descriptors
//! - `cache.rs` - per-class descriptor cache shared across calls
//! - `inflector.rs` - case conversion and singularization

mod cache;
pub mod inflector;

pub use cache::DescriptorCache;

use crate::core::{Result, ScalarType};

/// Field that carries the logical identity of an entity.
pub const IDENTITY_FIELD: &str = "id";

/// Class metadata supplied by the persistence layer.
pub trait EntityMetadataProvider: Send + Sync {
    /// True when `class` names a class or an interface.
    fn is_known(&self, class: &str) -> bool;

    /// Maps an interface, proxy or alias onto its concrete persistable class.
    fn resolve_concrete_class(&self, class: &str) -> Result<String>;

    /// Mapped fields of a concrete class, in declaration order.
    fn fields_of(&self, class: &str) -> Result<Vec<FieldDescriptor>>;
}

/// Optional source of alternate (serialized) names for a field.
pub trait AlternateNameSource: Send + Sync {
    /// Names declared under metadata `tag` on `class::field`, possibly empty.
    fn alternate_names(&self, class: &str, field: &str, tag: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    Scalar,
    SingleAssociation,
    CollectionAssociation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarType),
    SingleAssociation {
        target: String,
    },
    CollectionAssociation {
        target: String,
        add_mutator: String,
        remove_mutator: String,
    },
}

/// One mapped field of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar(scalar_type),
        }
    }

    pub fn single(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::SingleAssociation {
                target: target.into(),
            },
        }
    }

    /// Collection field whose mutators are derived from the singular field name:
    /// `tags` gets `addTag` / `removeTag`.
    pub fn collection(name: impl Into<String>, target: impl Into<String>) -> Self {
        let name = name.into();
        let stem = inflector::singularize(&name);
        Self::collection_with_stem(name, target, &stem)
    }

    pub fn collection_with_stem(
        name: impl Into<String>,
        target: impl Into<String>,
        stem: &str,
    ) -> Self {
        let stem = inflector::ucfirst(stem);
        Self {
            name: name.into(),
            kind: FieldKind::CollectionAssociation {
                target: target.into(),
                add_mutator: format!("add{}", stem),
                remove_mutator: format!("remove{}", stem),
            },
        }
    }

    pub fn category(&self) -> FieldCategory {
        match self.kind {
            FieldKind::Scalar(_) => FieldCategory::Scalar,
            FieldKind::SingleAssociation { .. } => FieldCategory::SingleAssociation,
            FieldKind::CollectionAssociation { .. } => FieldCategory::CollectionAssociation,
        }
    }

    pub fn scalar_type(&self) -> Option<&ScalarType> {
        match &self.kind {
            FieldKind::Scalar(scalar_type) => Some(scalar_type),
            _ => None,
        }
    }

    /// Target class of an association field.
    pub fn target_class(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Scalar(_) => None,
            FieldKind::SingleAssociation { target }
            | FieldKind::CollectionAssociation { target, .. } => Some(target),
        }
    }

    /// `(add, remove)` mutator names of a collection field.
    pub fn mutators(&self) -> Option<(&str, &str)> {
        match &self.kind {
            FieldKind::CollectionAssociation {
                add_mutator,
                remove_mutator,
                ..
            } => Some((add_mutator, remove_mutator)),
            _ => None,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.name == IDENTITY_FIELD && self.category() == FieldCategory::Scalar
    }
}

/// Fields of one class grouped by category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    class: String,
    scalars: Vec<FieldDescriptor>,
    singles: Vec<FieldDescriptor>,
    collections: Vec<FieldDescriptor>,
}

impl ClassDescriptor {
    pub fn new(class: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        let mut descriptor = Self {
            class: class.into(),
            scalars: Vec::new(),
            singles: Vec::new(),
            collections: Vec::new(),
        };

        for field in fields {
            match field.category() {
                FieldCategory::Scalar => descriptor.scalars.push(field),
                FieldCategory::SingleAssociation => descriptor.singles.push(field),
                FieldCategory::CollectionAssociation => descriptor.collections.push(field),
            }
        }

        descriptor
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn fields(&self, category: FieldCategory) -> &[FieldDescriptor] {
        match category {
            FieldCategory::Scalar => &self.scalars,
            FieldCategory::SingleAssociation => &self.singles,
            FieldCategory::CollectionAssociation => &self.collections,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.scalars
            .iter()
            .chain(&self.singles)
            .chain(&self.collections)
            .find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

// ============================================================================
// ObjectResolver Library
// ============================================================================

pub mod config;
pub mod core;
pub mod entity;
pub mod metadata;
pub mod prelude;
pub mod resolver;
pub mod store;

// Re-export main types for convenience
pub use config::{ResolutionFlags, ResolverConfig};
pub use crate::core::{DateTimeValue, ResolveError, Result, ScalarType, TimeZoneSpec, Value};
pub use entity::{ClassSchema, Entity, EntityHandle, Record};
pub use metadata::{
    AlternateNameSource, ClassDescriptor, DescriptorCache, EntityMetadataProvider, FieldCategory,
    FieldDescriptor, FieldKind, IDENTITY_FIELD,
};
pub use resolver::{ObjectResolver, UNTYPED_CLASS, parse_datetime};
pub use store::{EntityStore, MemoryStore};

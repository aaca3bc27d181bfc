//! Recommended imports grouped by role.
//!
//! `app` covers resolving payloads against an existing persistence layer.
//! `integration` adds the traits needed to plug in a custom one.

pub mod app {
    //! Everyday surface: build a resolver, resolve, inspect entities.
    pub use crate::{
        EntityHandle, ObjectResolver, ResolutionFlags, ResolveError, ResolverConfig, Value,
    };
}

pub mod integration {
    //! Collaborator contracts and the in-memory reference implementation.
    pub use crate::{
        AlternateNameSource, ClassSchema, Entity, EntityMetadataProvider, EntityStore,
        FieldDescriptor, MemoryStore, Record, ScalarType,
    };
}

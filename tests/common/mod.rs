#![allow(dead_code)]

use object_resolver::{
    ClassSchema, EntityHandle, EntityStore, MemoryStore, ObjectResolver, ResolverConfig,
    ScalarType, Value,
};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

pub const SERIALIZED_NAME: &str = "SerializedName";

pub fn user_schema() -> ClassSchema {
    ClassSchema::new("User")
        .implements("UserInterface")
        .id(ScalarType::Integer)
        .scalar("username", ScalarType::String)
        .scalar("email", ScalarType::String)
        .scalar("roles", ScalarType::Array)
        .scalar("birthDate", ScalarType::Date)
        .collection("siblings", "User")
        .collection("tags", "Tag")
        .single("closestRelative", "User")
}

pub fn tag_schema() -> ClassSchema {
    ClassSchema::new("Tag")
        .id(ScalarType::Integer)
        .scalar("title", ScalarType::String)
        .scalar_with_default("isEnabled", ScalarType::Boolean, true)
        .serialized_name("title", SERIALIZED_NAME, &["name"])
}

pub fn poll_schema() -> ClassSchema {
    ClassSchema::new("Poll")
        .id_without_setter(ScalarType::Integer)
        .scalar("title", ScalarType::String)
        .scalar_with_default("isMultiple", ScalarType::Boolean, false)
        .collection("options", "PollOption")
        .single("event", "Event")
        .scalar_with_default("state", ScalarType::Integer, 0)
        .scalar_with_default("onMonitor", ScalarType::Boolean, false)
}

pub fn poll_option_schema() -> ClassSchema {
    ClassSchema::new("PollOption")
        .id_without_setter(ScalarType::Integer)
        .single("poll", "Poll")
        .scalar("title", ScalarType::String)
}

pub fn event_schema() -> ClassSchema {
    ClassSchema::new("Event")
        .id_without_setter(ScalarType::Integer)
        .scalar("title", ScalarType::String)
        .scalar_with_default("isActive", ScalarType::Boolean, true)
        .scalar("dateFrom", ScalarType::DateTime)
        .scalar("dateTo", ScalarType::DateTime)
        .collection("polls", "Poll")
}

pub fn reference_schema() -> ClassSchema {
    ClassSchema::new("Reference")
        .id_without_setter(ScalarType::Integer)
        .scalar("title", ScalarType::String)
        .scalar("description", ScalarType::String)
        .rejecting("description", "description is derived from the title")
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_class(user_schema())
            .with_class(tag_schema())
            .with_class(poll_schema())
            .with_class(poll_option_schema())
            .with_class(event_schema())
            .with_class(reference_schema()),
    )
}

/// Resolver over `store` with alternate names enabled.
pub fn resolver(store: &Arc<MemoryStore>) -> ObjectResolver {
    ObjectResolver::new(store.clone(), store.clone())
        .with_alternate_names(store.clone())
        .with_config(ResolverConfig::new().serialized_name_tag(SERIALIZED_NAME))
}

pub fn make_user(name: &str) -> JsonValue {
    json!({
        "username": name,
        "email": format!("{}@mail.com", name),
        "roles": ["role1", "role2"],
        "birthDate": "1990-06-06T18:00+03:00",
    })
}

pub fn make_tag(id: i64, enabled: bool) -> JsonValue {
    json!({
        "id": id,
        "title": format!("tag{}", id),
        "isEnabled": enabled,
    })
}

/// Builds an entity directly, bypassing the resolver.
pub fn entity(store: &MemoryStore, class: &str, fields: &[(&str, Value)]) -> EntityHandle {
    let handle = store.instantiate(class).unwrap();
    {
        let mut entity = handle.write().unwrap();
        for (field, value) in fields {
            entity.set(field, value.clone()).unwrap();
        }
    }
    handle
}

pub fn add(owner: &EntityHandle, mutator: &str, item: &EntityHandle) {
    owner.write().unwrap().apply_mutator(mutator, item.clone()).unwrap();
}

/// Persisted user `id` owning persisted tags `tag_ids`.
pub fn seed_user(store: &MemoryStore, id: i64, username: &str, tag_ids: &[i64]) -> EntityHandle {
    let user = entity(
        store,
        "User",
        &[("id", Value::Integer(id)), ("username", Value::from(username))],
    );
    for tag_id in tag_ids {
        let tag = entity(
            store,
            "Tag",
            &[
                ("id", Value::Integer(*tag_id)),
                ("title", Value::from(format!("tag{}", tag_id))),
            ],
        );
        add(&user, "addTag", &tag);
        store.stage(&tag).unwrap();
    }
    store.persist(&user).unwrap();
    user
}

pub fn ids(handles: &[EntityHandle]) -> Vec<Value> {
    handles.iter().map(|handle| handle.get("id").unwrap()).collect()
}

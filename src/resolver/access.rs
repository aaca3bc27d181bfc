use super::names::variants;
use crate::core::{ResolveError, Result, Value};
use crate::metadata::IDENTITY_FIELD;
use serde_json::Value as JsonValue;

/// Uniform reads from a source node.
///
/// Objects are read by key, arrays by decimal index. Anything else has no
/// properties. `null` counts as absent.
pub(crate) struct ValueAccessor;

impl ValueAccessor {
    /// Value stored under any lexical variant of `name`.
    pub(crate) fn get<'a>(node: &'a JsonValue, name: &str) -> Result<Option<&'a JsonValue>> {
        validate_name(name)?;

        for variant in variants(name) {
            let found = match node {
                JsonValue::Object(map) => map.get(&variant),
                JsonValue::Array(items) => variant.parse::<usize>().ok().and_then(|idx| items.get(idx)),
                _ => None,
            };
            if let Some(value) = found.filter(|value| !value.is_null()) {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// First present value among `names`, in order.
    pub(crate) fn read<'a>(node: &'a JsonValue, names: &[String]) -> Result<Option<&'a JsonValue>> {
        for name in names {
            if let Some(value) = Self::get(node, name)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Identity carried by a source node, if non-empty.
    pub(crate) fn identity(node: &JsonValue) -> Result<Option<Value>> {
        let id = Self::get(node, IDENTITY_FIELD)?
            .map(Value::from_json)
            .filter(|id| !id.is_empty_identity());
        Ok(id)
    }
}

/// True for the nodes that resolve to nothing: `null`, `false`, `0`, `""`,
/// `"0"` and `[]`. Objects are never empty.
pub(crate) fn is_empty_node(node: &JsonValue) -> bool {
    match node {
        JsonValue::Object(_) => false,
        other => Value::from_json(other).is_empty_identity(),
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ResolveError::get_value(name, "empty property name"));
    }
    if name.contains(['[', ']']) || name.chars().any(char::is_whitespace) {
        return Err(ResolveError::get_value(name, "malformed property name"));
    }
    Ok(())
}

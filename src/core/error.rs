use thiserror::Error;

/// Failures raised by a resolution pass.
///
/// Every variant is terminal for the current `resolve_object` call: nested
/// failures propagate unchanged to the caller and nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Class '{0}' not found")]
    ClassNotFound(String),

    #[error("Unable to get target class name for ObjectResolver")]
    UnableToGetClassName,

    #[error("Class '{class}' should have setter for ID to be processed by ObjectResolver")]
    UnableToSetId { class: String },

    #[error("Unable to get value '{property}': {reason}")]
    UnableToGetValue { property: String, reason: String },

    #[error("Unable to set value '{field}' on '{class}': {reason}")]
    UnableToSetValue {
        class: String,
        field: String,
        reason: String,
    },
}

impl ResolveError {
    pub(crate) fn get_value(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnableToGetValue {
            property: property.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn set_value(
        class: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnableToSetValue {
            class: class.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

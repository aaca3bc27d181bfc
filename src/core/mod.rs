pub mod error;
pub mod types;
pub mod value;

pub use error::{ResolveError, Result};
pub use types::{DateTimeValue, TimeZoneSpec};
pub use value::{ScalarType, Value};

pub mod host;
pub mod json;
pub mod value;

pub use host::{HostObject, HostValue};
pub use json::to_value;
pub use value::{FromValue, ToValue, Value, ValueRef};

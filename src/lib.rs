//! A Liquid-style template engine.
//!
//! Templates are parsed once into an immutable [`Template`] and rendered any
//! number of times against a [`Context`] holding variables, filters and
//! stringifiers.

pub mod engine;
pub mod error;
pub mod runtime;
pub mod tpl;

pub use engine::{Engine, EngineOptions};
pub use error::LiquidError;
pub use runtime::{FromValue, HostObject, ToValue, Value, to_value};
pub use tpl::{Context, Filter, Stringifier, Template, parse};

pub type Result<T> = std::result::Result<T, LiquidError>;

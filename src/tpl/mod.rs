pub mod ast;
pub mod builtins;
pub mod engine;
mod expr;
pub mod filter;
mod parser;
mod render;
pub mod render_context;
pub mod token;

pub use engine::{Template, parse};
pub use filter::{Filter, Stringifier};
pub use render::{eval, stringify};
pub use render_context::{Context, Flag};

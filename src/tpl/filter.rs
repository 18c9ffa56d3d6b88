use crate::Result;
use crate::runtime::Value;
use crate::tpl::render_context::Context;

/// A named transformation applied with `{{ input | name: arg, ... }}`.
///
/// `input` is the piped value, `args` the literal arguments written after the
/// colon. Any closure with the same shape is a filter.
pub trait Filter: Send + Sync {
    fn apply(&self, input: &Value, args: &[Value], ctx: &Context) -> Result<Value>;
}

impl<F> Filter for F
where
    F: Fn(&Value, &[Value], &Context) -> Result<Value> + Send + Sync,
{
    fn apply(&self, input: &Value, args: &[Value], ctx: &Context) -> Result<Value> {
        self(input, args, ctx)
    }
}

/// Converts a value of one runtime type to output text.
pub trait Stringifier: Send + Sync {
    fn stringify(&self, value: &Value, ctx: &Context) -> String;
}

impl<F> Stringifier for F
where
    F: Fn(&Value, &Context) -> String + Send + Sync,
{
    fn stringify(&self, value: &Value, ctx: &Context) -> String {
        self(value, ctx)
    }
}

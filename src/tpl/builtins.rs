use crate::Result;
use crate::error::LiquidError;
use crate::runtime::Value;
use crate::tpl::render::stringify;
use crate::tpl::render_context::Context;

/// Registers the standard string and arithmetic filters.
/// Filters already registered under the same names are replaced.
pub fn register_standard_filters(ctx: &mut Context) {
    ctx.add_filter("upcase", |v: &Value, _: &[Value], c: &Context| {
        Ok(Value::Str(stringify(v, c).to_uppercase()))
    });
    ctx.add_filter("downcase", |v: &Value, _: &[Value], c: &Context| {
        Ok(Value::Str(stringify(v, c).to_lowercase()))
    });
    ctx.add_filter("capitalize", |v: &Value, _: &[Value], c: &Context| {
        Ok(Value::Str(capitalize(&stringify(v, c))))
    });
    ctx.add_filter("strip", |v: &Value, _: &[Value], c: &Context| {
        Ok(Value::Str(stringify(v, c).trim().to_string()))
    });
    ctx.add_filter("append", |v: &Value, args: &[Value], c: &Context| {
        let suffix = arg(args, 0, "append")?;
        Ok(Value::Str(stringify(v, c) + &stringify(suffix, c)))
    });
    ctx.add_filter("prepend", |v: &Value, args: &[Value], c: &Context| {
        let prefix = arg(args, 0, "prepend")?;
        Ok(Value::Str(stringify(prefix, c) + &stringify(v, c)))
    });
    ctx.add_filter("size", |v: &Value, _: &[Value], _: &Context| Ok(size(v)));
    ctx.add_filter("join", |v: &Value, args: &[Value], c: &Context| {
        let sep = match args.first() {
            Some(s) => stringify(s, c),
            None => " ".to_string(),
        };
        Ok(match v {
            Value::List(items) => Value::Str(
                items
                    .iter()
                    .map(|item| stringify(item, c))
                    .collect::<Vec<_>>()
                    .join(&sep),
            ),
            other => other.clone(),
        })
    });
    ctx.add_filter("default", |v: &Value, args: &[Value], _: &Context| {
        let fallback = arg(args, 0, "default")?;
        let empty = match v {
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            other => !other.is_truthy(),
        };
        Ok(if empty { fallback.clone() } else { v.clone() })
    });
    ctx.add_filter("plus", |v: &Value, args: &[Value], _: &Context| {
        arithmetic("plus", v, args, i64::checked_add)
    });
    ctx.add_filter("minus", |v: &Value, args: &[Value], _: &Context| {
        arithmetic("minus", v, args, i64::checked_sub)
    });
}

/// Registers output conversions for bools, doubles and lists.
pub fn register_standard_stringifiers(ctx: &mut Context) {
    ctx.add_stringifier("bool", |v: &Value, _: &Context| match v {
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    });
    ctx.add_stringifier("double", |v: &Value, _: &Context| match v {
        Value::Double(d) => d.to_string(),
        _ => String::new(),
    });
    ctx.add_stringifier("list", |v: &Value, c: &Context| match v {
        Value::List(items) => items.iter().map(|item| stringify(item, c)).collect(),
        _ => String::new(),
    });
}

fn arg<'v>(args: &'v [Value], index: usize, filter: &str) -> Result<&'v Value> {
    args.get(index).ok_or_else(|| LiquidError::Filter {
        name: filter.to_string(),
        message: format!("missing argument {}", index + 1),
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn size(value: &Value) -> Value {
    let len = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Object(fields) => fields.len(),
        Value::Host(h) => h.len().unwrap_or(0),
        _ => 0,
    };
    Value::Int(len as i64)
}

fn arithmetic(
    name: &str,
    input: &Value,
    args: &[Value],
    op: fn(i64, i64) -> Option<i64>,
) -> Result<Value> {
    let operand = arg(args, 0, name)?;
    match (input, operand) {
        (Value::Int(a), Value::Int(b)) => op(*a, *b).map(Value::Int).ok_or_else(|| LiquidError::Filter {
            name: name.to_string(),
            message: "integer overflow".to_string(),
        }),
        (a, b) => Err(LiquidError::Filter {
            name: name.to_string(),
            message: format!("expected int operands, got {} and {}", a.type_name(), b.type_name()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(ctx: &Context, name: &str, input: Value, args: &[Value]) -> Result<Value> {
        ctx.filter(name).unwrap().apply(&input, args, ctx)
    }

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    #[test]
    fn test_string_filters() {
        let mut ctx = Context::new();
        register_standard_filters(&mut ctx);

        assert_eq!(apply(&ctx, "upcase", s("abc"), &[]).unwrap(), s("ABC"));
        assert_eq!(apply(&ctx, "downcase", s("AbC"), &[]).unwrap(), s("abc"));
        assert_eq!(apply(&ctx, "capitalize", s("hello world"), &[]).unwrap(), s("Hello world"));
        assert_eq!(apply(&ctx, "capitalize", s(""), &[]).unwrap(), s(""));
        assert_eq!(apply(&ctx, "strip", s("  x \t"), &[]).unwrap(), s("x"));
        assert_eq!(apply(&ctx, "append", s("a"), &[s("b")]).unwrap(), s("ab"));
        assert_eq!(apply(&ctx, "prepend", s("a"), &[Value::Int(1)]).unwrap(), s("1a"));
        assert_eq!(apply(&ctx, "upcase", Value::Int(7), &[]).unwrap(), s("7"));
    }

    #[test]
    fn test_missing_argument() {
        let mut ctx = Context::new();
        register_standard_filters(&mut ctx);

        match apply(&ctx, "append", s("a"), &[]) {
            Err(LiquidError::Filter { name, .. }) => assert_eq!(name, "append"),
            other => panic!("Expected filter error, got {:?}", other),
        }
    }

    #[test]
    fn test_size_join_default() {
        let mut ctx = Context::new();
        register_standard_filters(&mut ctx);

        let list = Value::List(vec![Value::Int(1), s("b"), Value::Null]);
        assert_eq!(apply(&ctx, "size", list.clone(), &[]).unwrap(), Value::Int(3));
        assert_eq!(apply(&ctx, "size", s("héllo"), &[]).unwrap(), Value::Int(5));
        assert_eq!(apply(&ctx, "size", Value::Bool(true), &[]).unwrap(), Value::Int(0));

        assert_eq!(apply(&ctx, "join", list.clone(), &[s(", ")]).unwrap(), s("1, b, "));
        assert_eq!(apply(&ctx, "join", list, &[]).unwrap(), s("1 b "));

        assert_eq!(apply(&ctx, "default", Value::Null, &[s("x")]).unwrap(), s("x"));
        assert_eq!(apply(&ctx, "default", s(""), &[s("x")]).unwrap(), s("x"));
        assert_eq!(apply(&ctx, "default", Value::Bool(false), &[s("x")]).unwrap(), s("x"));
        assert_eq!(apply(&ctx, "default", Value::Int(0), &[s("x")]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_arithmetic() {
        let mut ctx = Context::new();
        register_standard_filters(&mut ctx);

        assert_eq!(apply(&ctx, "plus", Value::Int(2), &[Value::Int(3)]).unwrap(), Value::Int(5));
        assert_eq!(apply(&ctx, "minus", Value::Int(2), &[Value::Int(3)]).unwrap(), Value::Int(-1));
        assert!(apply(&ctx, "plus", s("2"), &[Value::Int(3)]).is_err());
        assert!(apply(&ctx, "plus", Value::Int(i64::MAX), &[Value::Int(1)]).is_err());
    }

    #[test]
    fn test_standard_stringifiers() {
        let mut ctx = Context::new();
        register_standard_stringifiers(&mut ctx);

        assert_eq!(ctx.stringify(&Value::Bool(true)), "true");
        assert_eq!(ctx.stringify(&Value::Bool(false)), "false");
        assert_eq!(ctx.stringify(&Value::Double(1.5)), "1.5");
        assert_eq!(
            ctx.stringify(&Value::List(vec![Value::Int(1), s("a"), Value::Bool(true)])),
            "1atrue"
        );
    }
}

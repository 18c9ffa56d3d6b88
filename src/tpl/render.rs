use crate::Result;
use crate::error::LiquidError;
use crate::runtime::Value;
use crate::tpl::ast::{BinaryOp, IfBlock, Node, Object, Tag};
use crate::tpl::render_context::{Context, Flag};
use log::trace;
use std::borrow::Cow;

/// Tree-walking interpreter for one render.
pub(crate) struct Renderer<'c> {
    context: &'c mut Context,
    output: String,
}

impl<'c> Renderer<'c> {
    pub(crate) fn new(context: &'c mut Context) -> Self {
        Self {
            context,
            output: String::new(),
        }
    }

    /// Renders the top-level nodes and returns the produced text.
    pub(crate) fn render(&mut self, nodes: &[Node]) -> Result<String> {
        self.output.clear();
        for node in nodes {
            self.process(node)?;
        }
        Ok(std::mem::take(&mut self.output))
    }

    fn process(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Text(text) => self.output.push_str(text),
            Node::Object(object) => {
                let value = eval_ref(object, self.context)?;
                let text = stringify(&value, self.context);
                self.output.push_str(&text);
            }
            Node::Tag(tag) => self.exec(tag)?,
        }
        Ok(())
    }

    /// Runs a statement list, stopping as soon as a runtime flag is raised.
    /// The flag is left for the enclosing `for` to consume.
    fn exec_list(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.process(node)?;
            if self.context.runtime_flags() != 0 {
                break;
            }
        }
        Ok(())
    }

    fn exec(&mut self, tag: &Tag) -> Result<()> {
        match tag {
            Tag::Assign { variable, value } => {
                let value = eval_ref(value, self.context)?.into_owned();
                self.context
                    .variables_mut()
                    .insert(variable.clone(), value);
            }
            Tag::For {
                variable,
                object,
                body,
            } => self.exec_for(variable, object, body)?,
            Tag::If { blocks } => self.exec_if(blocks)?,
            Tag::Break => self.context.set_flag(Flag::Break),
            Tag::Continue => self.context.set_flag(Flag::Continue),
        }
        Ok(())
    }

    fn exec_for(&mut self, variable: &str, object: &Object, body: &[Node]) -> Result<()> {
        // The body may rebind the iterated variable, so the loop works on its own copy.
        let container = eval_ref(object, self.context)?.into_owned();
        let items = match container {
            Value::List(items) => items,
            other => {
                trace!(
                    "for: '{}' iterates a {}, not a list; skipping",
                    variable,
                    other.type_name()
                );
                return Ok(());
            }
        };

        for item in items {
            self.context.variables_mut().insert(variable.to_string(), item);
            self.exec_list(body)?;

            let stop = self.context.has_flag(Flag::Break);
            self.context.clear_flags();
            if stop {
                break;
            }
        }
        Ok(())
    }

    fn exec_if(&mut self, blocks: &[IfBlock]) -> Result<()> {
        for block in blocks {
            if eval_ref(&block.condition, self.context)?.is_truthy() {
                return self.exec_list(&block.body);
            }
        }
        Ok(())
    }
}

/// Evaluates an expression node. Missing variables and members are null.
pub fn eval(object: &Object, ctx: &Context) -> Result<Value> {
    eval_ref(object, ctx).map(Cow::into_owned)
}

/// Like [`eval`], but borrows from the context and the tree where it can, so
/// reading a variable, a field or a list element never copies its container.
pub(crate) fn eval_ref<'a>(object: &'a Object, ctx: &'a Context) -> Result<Cow<'a, Value>> {
    match object {
        Object::Value(value) => Ok(Cow::Borrowed(value)),
        Object::Variable(name) => Ok(ctx
            .variable(name)
            .map_or(Cow::Owned(Value::Null), Cow::Borrowed)),
        Object::MemberAccess { object, name } => Ok(match eval_ref(object, ctx)? {
            Cow::Borrowed(value) => member_access(value, name),
            Cow::Owned(value) => Cow::Owned(member_access(&value, name).into_owned()),
        }),
        Object::ArrayAccess { object, index } => {
            let value = eval_ref(object, ctx)?;
            let index = eval_ref(index, ctx)?;
            match value {
                Cow::Borrowed(value) => array_access(value, &index),
                Cow::Owned(value) => {
                    array_access(&value, &index).map(|v| Cow::Owned(v.into_owned()))
                }
            }
        }
        Object::BinOp { op, lhs, rhs } => {
            let lhs = eval_ref(lhs, ctx)?;
            let rhs = eval_ref(rhs, ctx)?;
            Ok(Cow::Owned(Value::Bool(eval_binop(*op, &lhs, &rhs))))
        }
        Object::Pipe {
            object,
            filter,
            arguments,
        } => {
            let input = eval_ref(object, ctx)?;
            let Some(f) = ctx.filter(filter) else {
                return Err(LiquidError::UnknownFilter(filter.clone()));
            };
            f.apply(&input, arguments, ctx).map(Cow::Owned)
        }
    }
}

fn member_access<'v>(value: &'v Value, name: &str) -> Cow<'v, Value> {
    match value {
        Value::List(items) => Cow::Owned(if name == "size" {
            Value::Int(items.len() as i64)
        } else {
            Value::Null
        }),
        Value::Object(fields) => fields
            .get(name)
            .map_or(Cow::Owned(Value::Null), Cow::Borrowed),
        Value::Host(h) => Cow::Owned(
            h.member(name)
                .or_else(|| match (name, h.len()) {
                    ("size", Some(len)) => Some(Value::Int(len as i64)),
                    _ => None,
                })
                .unwrap_or(Value::Null),
        ),
        _ => Cow::Owned(value.member(name).unwrap_or(Value::Null)),
    }
}

fn array_access<'v>(value: &'v Value, index: &Value) -> Result<Cow<'v, Value>> {
    match index {
        Value::Int(i) => {
            let item = match value {
                Value::List(items) => usize::try_from(*i).ok().and_then(|i| items.get(i)),
                _ => None,
            };
            Ok(item.map_or(Cow::Owned(Value::Null), Cow::Borrowed))
        }
        Value::Str(name) => Ok(match value {
            Value::List(_) => Cow::Owned(Value::Null),
            _ => member_access(value, name),
        }),
        other => Err(LiquidError::Render(format!(
            "Bad array access: index is a {}",
            other.type_name()
        ))),
    }
}

pub fn eval_binop(op: BinaryOp, lhs: &Value, rhs: &Value) -> bool {
    match op {
        BinaryOp::Or => lhs.is_truthy() || rhs.is_truthy(),
        BinaryOp::And => lhs.is_truthy() && rhs.is_truthy(),
        BinaryOp::Equal => eval_eq(lhs, rhs),
        BinaryOp::Inequal => eval_neq(lhs, rhs),
        BinaryOp::Less => compare_ints(lhs, rhs, |l, r| l < r),
        BinaryOp::Leq => compare_ints(lhs, rhs, |l, r| l <= r),
        BinaryOp::Greater => compare_ints(lhs, rhs, |l, r| l > r),
        BinaryOp::Geq => compare_ints(lhs, rhs, |l, r| l >= r),
    }
}

fn eval_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => lhs.same_type(rhs) && lhs == rhs,
    }
}

fn eval_neq(lhs: &Value, rhs: &Value) -> bool {
    if !lhs.same_type(rhs) {
        return true;
    }
    if lhs.is_null() {
        return false;
    }
    lhs != rhs
}

/// Ordering is defined for int pairs only; everything else compares false.
fn compare_ints(lhs: &Value, rhs: &Value, cmp: fn(i64, i64) -> bool) -> bool {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => cmp(*l, *r),
        _ => false,
    }
}

/// Output text for a value: null and null references are empty, strings and
/// ints print directly, the rest goes through the context's stringifiers.
pub fn stringify(value: &Value, ctx: &Context) -> String {
    match value {
        Value::Null => String::new(),
        Value::Ref(r) if r.is_null() => String::new(),
        Value::Str(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        _ => ctx.stringify(value),
    }
}

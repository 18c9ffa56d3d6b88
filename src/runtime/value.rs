use crate::error::LiquidError;
use crate::runtime::host::{HostObject, HostValue};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// The dynamically-typed value that templates evaluate to.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),

    /// Ordered list of values; the only iterable for `for` tags.
    List(Vec<Value>),

    /// Named fields, looked up by member and string-index access.
    Object(HashMap<String, Value>),

    /// Weak handle to a shared value. A dropped target reads as a null reference.
    Ref(ValueRef),

    /// Opaque value owned by the embedding application.
    Host(HostValue),
}

pub const NULL_TYPE: &str = "null";
pub const BOOL_TYPE: &str = "bool";
pub const INT_TYPE: &str = "int";
pub const DOUBLE_TYPE: &str = "double";
pub const STRING_TYPE: &str = "string";
pub const LIST_TYPE: &str = "list";
pub const OBJECT_TYPE: &str = "object";
pub const REF_TYPE: &str = "ref";

impl Value {
    /// Runtime type name. Two values have matching types iff their names are equal.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => NULL_TYPE,
            Value::Bool(_) => BOOL_TYPE,
            Value::Int(_) => INT_TYPE,
            Value::Double(_) => DOUBLE_TYPE,
            Value::Str(_) => STRING_TYPE,
            Value::List(_) => LIST_TYPE,
            Value::Object(_) => OBJECT_TYPE,
            Value::Ref(_) => REF_TYPE,
            Value::Host(h) => h.type_name(),
        }
    }

    pub fn same_type(&self, other: &Value) -> bool {
        self.type_name() == other.type_name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` for a reference whose target is gone (or never existed).
    pub fn is_null_ref(&self) -> bool {
        matches!(self, Value::Ref(r) if r.is_null())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// A value is truthy unless it is null, a null reference, or `false`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Ref(r) => !r.is_null(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Creates a reference to a shared value.
    pub fn reference(target: &Arc<Value>) -> Value {
        Value::Ref(ValueRef::new(target))
    }

    pub fn host(object: impl HostObject + 'static) -> Value {
        Value::Host(HostValue::new(object))
    }

    /// Named attribute lookup on structured values. References are followed once.
    /// Anything without attributes, and unknown names, yield `None`.
    pub fn member(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(fields) => fields.get(name).cloned(),
            Value::Host(h) => h.member(name),
            Value::Ref(r) => r.get().and_then(|target| match target.as_ref() {
                Value::Ref(_) => None,
                other => other.member(name),
            }),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a == b,
            _ => false,
        }
    }
}

/// Weak handle to an `Arc<Value>` owned elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ValueRef {
    target: Weak<Value>,
}

impl ValueRef {
    pub fn new(target: &Arc<Value>) -> Self {
        Self {
            target: Arc::downgrade(target),
        }
    }

    /// A reference that points nowhere.
    pub fn null() -> Self {
        Self { target: Weak::new() }
    }

    pub fn get(&self) -> Option<Arc<Value>> {
        self.target.upgrade()
    }

    pub fn is_null(&self) -> bool {
        self.target.strong_count() == 0
    }
}

impl PartialEq for ValueRef {
    fn eq(&self, other: &Self) -> bool {
        self.target.ptr_eq(&other.target)
    }
}

/// Any type that can be turned into a template value.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Any type that can be read back out of a template value.
pub trait FromValue: Sized {
    fn from_value(v: &Value) -> Result<Self, LiquidError>;
}

macro_rules! impl_to_value_int {
    ($($rust_type:ty),*) => {
        $(
            impl ToValue for $rust_type {
                fn to_value(&self) -> Value {
                    Value::Int(*self as i64)
                }
            }
        )*
    };
}

macro_rules! impl_from_value_int {
    ($($rust_type:ty),*) => {
        $(
            impl FromValue for $rust_type {
                fn from_value(v: &Value) -> Result<Self, LiquidError> {
                    match v {
                        Value::Int(n) => <$rust_type>::try_from(*n).map_err(|_| {
                            LiquidError::Render(format!(
                                "Value {} out of range for {}",
                                n,
                                stringify!($rust_type)
                            ))
                        }),
                        _ => Err(LiquidError::Render(format!(
                            "Expected int, got {}",
                            v.type_name()
                        ))),
                    }
                }
            }
        )*
    };
}

impl_to_value_int!(i8, i16, i32, i64, u8, u16, u32);
impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(v: &Value) -> Result<Self, LiquidError> {
        match v {
            Value::Bool(b) => Ok(*b),
            _ => Err(LiquidError::Render(format!(
                "Expected bool, got {}",
                v.type_name()
            ))),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Double(*self)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Double(*self as f64)
    }
}

impl FromValue for f64 {
    fn from_value(v: &Value) -> Result<Self, LiquidError> {
        match v {
            Value::Double(d) => Ok(*d),
            Value::Int(n) => Ok(*n as f64),
            _ => Err(LiquidError::Render(format!(
                "Expected double, got {}",
                v.type_name()
            ))),
        }
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(v: &Value) -> Result<Self, LiquidError> {
        match v {
            Value::Str(s) => Ok(s.clone()),
            _ => Err(LiquidError::Render(format!(
                "Expected string, got {}",
                v.type_name()
            ))),
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(v: &Value) -> Result<Self, LiquidError> {
        Ok(v.clone())
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl<T> ToValue for &T
where
    T: ToValue + ?Sized,
{
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: &Value) -> Result<Self, LiquidError> {
        match v {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(v)?)),
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(|v| v.to_value()).collect())
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(|v| v.to_value()).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(v: &Value) -> Result<Self, LiquidError> {
        match v {
            Value::List(l) => l.iter().map(T::from_value).collect(),
            _ => Err(LiquidError::Render(format!(
                "Expected list, got {}",
                v.type_name()
            ))),
        }
    }
}

impl<T: ToValue> ToValue for HashMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

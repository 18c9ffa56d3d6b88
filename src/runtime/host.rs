use crate::runtime::value::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Capabilities a host-defined opaque value exposes to templates.
///
/// The renderer never inspects a host object directly; member access, the
/// `size` of list-like objects and `==` all go through this trait.
pub trait HostObject: Send + Sync {
    /// Name used for type matching (comparisons, stringifier selection).
    fn type_name(&self) -> &str;

    /// Named attribute lookup. `None` renders as null.
    fn member(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Element count, for host objects that behave like collections.
    fn len(&self) -> Option<usize> {
        None
    }

    /// Host equality. Only called when both sides share `type_name`.
    fn equals(&self, other: &dyn HostObject) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a [`HostObject`].
#[derive(Clone)]
pub struct HostValue(Arc<dyn HostObject>);

impl HostValue {
    pub fn new(object: impl HostObject + 'static) -> Self {
        Self(Arc::new(object))
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn member(&self, name: &str) -> Option<Value> {
        self.0.member(name)
    }

    pub fn len(&self) -> Option<usize> {
        self.0.len()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn inner(&self) -> &dyn HostObject {
        self.0.as_ref()
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.0.equals(other.inner())
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostValue").field(&self.type_name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i64,
        y: i64,
    }

    impl HostObject for Point {
        fn type_name(&self) -> &str {
            "Point"
        }

        fn member(&self, name: &str) -> Option<Value> {
            match name {
                "x" => Some(Value::Int(self.x)),
                "y" => Some(Value::Int(self.y)),
                _ => None,
            }
        }

        fn equals(&self, other: &dyn HostObject) -> bool {
            other
                .as_any()
                .downcast_ref::<Point>()
                .is_some_and(|p| p.x == self.x && p.y == self.y)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_host_member_and_equality() {
        let a = Value::host(Point { x: 1, y: 2 });
        let b = Value::host(Point { x: 1, y: 2 });
        let c = Value::host(Point { x: 3, y: 2 });

        assert_eq!(a.type_name(), "Point");
        assert_eq!(a.member("y"), Some(Value::Int(2)));
        assert_eq!(a.member("z"), None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_downcast() {
        let v = HostValue::new(Point { x: 5, y: 0 });
        assert_eq!(v.downcast_ref::<Point>().map(|p| p.x), Some(5));
        assert!(v.downcast_ref::<String>().is_none());
    }
}

//! Values admissible in parameter stores and route values
//!
//! A value is either a literal scalar, a nested map of values, or an
//! external object that knows its own fingerprint. Nothing else can be
//! cached safely, so nothing else can be stored.

use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::map::OrderedMap;

/// Capability of a value to describe itself with a stable cache identifier
///
/// Implementations must return the same string for equal content across
/// processes; it becomes part of cache keys.
pub trait Fingerprintable: Send + Sync + fmt::Debug {
    fn fingerprint(&self) -> String;
}

#[derive(Debug, Clone)]
pub enum CacheableValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Nested mapping; sequences use their indexes `"0"`, `"1"`, ... as keys
    Nested(OrderedMap<CacheableValue>),
    External(Arc<dyn Fingerprintable>),
}

impl CacheableValue {
    /// Wrap an external fingerprintable object
    pub fn external(value: impl Fingerprintable + 'static) -> Self {
        CacheableValue::External(Arc::new(value))
    }

    /// Build a nested value from a sequence, keyed by position
    pub fn sequence(items: impl IntoIterator<Item = CacheableValue>) -> Self {
        CacheableValue::Nested(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        )
    }

    /// String rendering of a literal scalar, `None` for nested and external values
    pub fn literal(&self) -> Option<String> {
        match self {
            CacheableValue::Str(s) => Some(s.clone()),
            CacheableValue::Int(i) => Some(i.to_string()),
            CacheableValue::Float(f) => Some(f.to_string()),
            CacheableValue::Bool(b) => Some(b.to_string()),
            CacheableValue::Nested(_) | CacheableValue::External(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CacheableValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&OrderedMap<CacheableValue>> {
        match self {
            CacheableValue::Nested(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, CacheableValue::Nested(_))
    }

    /// Per-value fingerprint of this value stored under `name`
    ///
    /// - nested: `"|" + fp(name.key, child)` for every child, concatenated
    /// - external: the value's own fingerprint
    /// - scalar: `"name:value"`
    pub fn fingerprint_as(&self, name: &str) -> String {
        match self {
            CacheableValue::Nested(children) => children
                .iter()
                .map(|(key, child)| format!("|{}", child.fingerprint_as(&format!("{}.{}", name, key))))
                .collect(),
            CacheableValue::External(value) => value.fingerprint(),
            scalar => format!("{}:{}", name, scalar.literal().unwrap_or_default()),
        }
    }
}

impl PartialEq for CacheableValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CacheableValue::Str(a), CacheableValue::Str(b)) => a == b,
            (CacheableValue::Int(a), CacheableValue::Int(b)) => a == b,
            (CacheableValue::Float(a), CacheableValue::Float(b)) => a == b,
            (CacheableValue::Bool(a), CacheableValue::Bool(b)) => a == b,
            (CacheableValue::Nested(a), CacheableValue::Nested(b)) => a == b,
            (CacheableValue::External(a), CacheableValue::External(b)) => {
                Arc::ptr_eq(a, b) || a.fingerprint() == b.fingerprint()
            }
            _ => false,
        }
    }
}

impl Serialize for CacheableValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CacheableValue::Str(s) => serializer.serialize_str(s),
            CacheableValue::Int(i) => serializer.serialize_i64(*i),
            CacheableValue::Float(f) => serializer.serialize_f64(*f),
            CacheableValue::Bool(b) => serializer.serialize_bool(*b),
            CacheableValue::Nested(map) => map.serialize(serializer),
            CacheableValue::External(value) => serializer.serialize_str(&value.fingerprint()),
        }
    }
}

impl From<&str> for CacheableValue {
    fn from(value: &str) -> Self {
        CacheableValue::Str(value.to_string())
    }
}

impl From<String> for CacheableValue {
    fn from(value: String) -> Self {
        CacheableValue::Str(value)
    }
}

impl From<i64> for CacheableValue {
    fn from(value: i64) -> Self {
        CacheableValue::Int(value)
    }
}

impl From<i32> for CacheableValue {
    fn from(value: i32) -> Self {
        CacheableValue::Int(i64::from(value))
    }
}

impl From<u32> for CacheableValue {
    fn from(value: u32) -> Self {
        CacheableValue::Int(i64::from(value))
    }
}

impl From<f64> for CacheableValue {
    fn from(value: f64) -> Self {
        CacheableValue::Float(value)
    }
}

impl From<bool> for CacheableValue {
    fn from(value: bool) -> Self {
        CacheableValue::Bool(value)
    }
}

impl From<OrderedMap<CacheableValue>> for CacheableValue {
    fn from(value: OrderedMap<CacheableValue>) -> Self {
        CacheableValue::Nested(value)
    }
}

impl TryFrom<serde_json::Value> for CacheableValue {
    type Error = ValidationError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Null => Err(ValidationError::UnsupportedValueType("null".to_string())),
            Value::Bool(b) => Ok(CacheableValue::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(CacheableValue::Int(i)),
                None => n.as_f64().map(CacheableValue::Float).ok_or_else(|| {
                    ValidationError::UnsupportedValueType(format!("number {}", n))
                }),
            },
            Value::String(s) => Ok(CacheableValue::Str(s)),
            Value::Array(items) => Ok(CacheableValue::sequence(
                items
                    .into_iter()
                    .map(CacheableValue::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Value::Object(object) => object
                .into_iter()
                .map(|(key, v)| CacheableValue::try_from(v).map(|v| (key, v)))
                .collect::<Result<OrderedMap<_>, _>>()
                .map(CacheableValue::Nested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Node(&'static str);

    impl Fingerprintable for Node {
        fn fingerprint(&self) -> String {
            format!("node-{}", self.0)
        }
    }

    #[test]
    fn test_scalar_fingerprint() {
        assert_eq!(CacheableValue::from("bar").fingerprint_as("foo"), "foo:bar");
        assert_eq!(CacheableValue::from(42).fingerprint_as("n"), "n:42");
        assert_eq!(CacheableValue::from(true).fingerprint_as("b"), "b:true");
        assert_eq!(CacheableValue::from(1.5).fingerprint_as("f"), "f:1.5");
    }

    #[test]
    fn test_external_fingerprint_ignores_name() {
        let value = CacheableValue::external(Node("abc"));
        assert_eq!(value.fingerprint_as("whatever"), "node-abc");
    }

    #[test]
    fn test_nested_fingerprint_concatenates_children() {
        let inner: OrderedMap<CacheableValue> = [("c", CacheableValue::from(3))].into_iter().collect();
        let outer: OrderedMap<CacheableValue> = [
            ("a", CacheableValue::from("x")),
            ("b", CacheableValue::Nested(inner)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            CacheableValue::Nested(outer).fingerprint_as("p"),
            "|p.a:x||p.b.c:3"
        );
    }

    #[test]
    fn test_sequence_uses_indexes() {
        let value = CacheableValue::sequence(["x".into(), "y".into()]);
        assert_eq!(value.fingerprint_as("list"), "|list.0:x|list.1:y");
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"a": 1, "b": [true, "s"], "c": 2.5});
        let value = CacheableValue::try_from(json).unwrap();
        let map = value.as_nested().unwrap();
        assert_eq!(map.get("a"), Some(&CacheableValue::Int(1)));
        assert_eq!(map.get("c"), Some(&CacheableValue::Float(2.5)));
        assert!(map.get("b").unwrap().is_nested());
    }

    #[test]
    fn test_from_json_keeps_object_key_order() {
        let value = CacheableValue::try_from(serde_json::json!({"z": 1, "a": 2, "m": 3})).unwrap();
        let keys: Vec<_> = value.as_nested().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(value.fingerprint_as("p"), "|p.z:1|p.a:2|p.m:3");
    }

    #[test]
    fn test_from_json_rejects_null() {
        let result = CacheableValue::try_from(serde_json::json!({"a": null}));
        assert!(matches!(result, Err(ValidationError::UnsupportedValueType(_))));
    }

    #[test]
    fn test_external_equality_by_fingerprint() {
        let a = CacheableValue::external(Node("1"));
        let b = CacheableValue::external(Node("1"));
        let c = CacheableValue::external(Node("2"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}

//! Dynamic Values
//!
//! Reactive state, props and setup results are all expressed as [`Value`]s.
//! A value is either a primitive, a shared raw object, a wrapper view over a
//! raw object ([`Proxy`]), a boxed reactive value ([`Ref`], [`Computed`]) or a
//! callback.
//!
//! # Identity
//!
//! [`Value::same`] is the strict identity check used everywhere a write has to
//! decide whether anything changed. Primitives and strings compare by value,
//! NaN is identical to itself and `0.0` is not identical to `-0.0`. Objects,
//! proxies, refs and callbacks compare by pointer.
//!
//! # Raw objects
//!
//! A [`RawObject`] is an ordered string-keyed map behind an `Rc`. Cloning the
//! handle shares the object. Each raw object also owns the dependency sets of
//! its keys, so the dependency graph lives next to the data it describes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::reactive::dep::DepsMap;
use crate::reactive::{Computed, Proxy, Ref};

/// The ordered field map stored inside a [`RawObject`].
pub type Fields = IndexMap<String, Value>;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// A plain, non-reactive object.
    Object(RawObject),
    /// A reactive or readonly view over a raw object.
    Proxy(Proxy),
    Ref(Ref),
    Computed(Computed),
    Func(Callback),
}

impl Value {
    /// Strict identity comparison.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Proxy(a), Value::Proxy(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Computed(a), Value::Computed(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Whether this value is an object or a view over one.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Proxy(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Func(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Value::Proxy(p) => Some(p),
            _ => None,
        }
    }

    /// Reads a member of an object value.
    ///
    /// Plain objects are read untracked; proxies go through their read
    /// handler. Anything else has no members and yields `Null`.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(raw) => raw.get(key).unwrap_or_default(),
            Value::Proxy(proxy) => proxy.get(key),
            _ => Value::Null,
        }
    }

    /// Writes a member of an object value. Returns `false` for non-objects.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        match self {
            Value::Object(raw) => {
                raw.insert(key, value.into());
                true
            }
            Value::Proxy(proxy) => proxy.set(key, value),
            _ => false,
        }
    }

    /// Whether an object value has the given own key.
    pub fn has(&self, key: &str) -> bool {
        match self {
            Value::Object(raw) => raw.contains_key(key),
            Value::Proxy(proxy) => proxy.has(key),
            _ => false,
        }
    }

    /// Builds a callback value.
    pub fn func(f: impl Fn(&[Value]) -> Value + 'static) -> Value {
        Value::Func(Callback::new(f))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(raw) => f.debug_tuple("Object").field(raw).finish(),
            Value::Proxy(proxy) => fmt::Debug::fmt(proxy, f),
            Value::Ref(r) => fmt::Debug::fmt(r, f),
            Value::Computed(c) => fmt::Debug::fmt(c, f),
            Value::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Object(_) | Value::Proxy(_) => f.write_str("[object]"),
            Value::Ref(r) => write!(f, "{}", r.get_untracked()),
            Value::Computed(_) => f.write_str("[computed]"),
            Value::Func(_) => f.write_str("[function]"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Func(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Object(raw) => raw.serialize(serializer),
            Value::Proxy(proxy) => proxy.raw().serialize(serializer),
            Value::Ref(r) => r.get_untracked().serialize(serializer),
            Value::Computed(c) => c.get_untracked().serialize(serializer),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or(Value::Float(i as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<RawObject> for Value {
    fn from(raw: RawObject) -> Self {
        Value::Object(raw)
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Value::Object(RawObject::from_fields(fields))
    }
}

impl From<Proxy> for Value {
    fn from(proxy: Proxy) -> Self {
        Value::Proxy(proxy)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<Computed> for Value {
    fn from(c: Computed) -> Self {
        Value::Computed(c)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Func(cb)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    /// Arrays become objects keyed by their decimal indices.
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::Object(RawObject::from_fields(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), Value::from(item)))
                    .collect(),
            )),
            serde_json::Value::Object(map) => Value::Object(RawObject::from_fields(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

// ----------------------------------------------------------------------------
// Raw objects
// ----------------------------------------------------------------------------

/// A shared, ordered, string-keyed object.
///
/// All accessors here are raw: they neither track nor trigger. Go through a
/// [`Proxy`] for reactive access.
#[derive(Clone, Default)]
pub struct RawObject(Rc<ObjectInner>);

#[derive(Default)]
struct ObjectInner {
    fields: RefCell<Fields>,
    deps: DepsMap,
}

impl RawObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Fields) -> Self {
        Self(Rc::new(ObjectInner {
            fields: RefCell::new(fields),
            deps: DepsMap::default(),
        }))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.fields.borrow().get(key).cloned()
    }

    /// Inserts a field, returning the previous value.
    pub fn insert(&self, key: &str, value: Value) -> Option<Value> {
        self.0.fields.borrow_mut().insert(key.to_owned(), value)
    }

    /// Removes a field, preserving the order of the rest.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.fields.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.fields.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.fields.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.fields.borrow().is_empty()
    }

    /// Copies the current fields out of the object.
    pub fn snapshot(&self) -> Fields {
        self.0.fields.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &RawObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn deps(&self) -> &DepsMap {
        &self.0.deps
    }
}

impl From<Fields> for RawObject {
    fn from(fields: Fields) -> Self {
        Self::from_fields(fields)
    }
}

impl fmt::Debug for RawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.fields.try_borrow() {
            Ok(fields) => f.debug_map().entries(fields.iter()).finish(),
            Err(_) => f.write_str("{..}"),
        }
    }
}

impl Serialize for RawObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.snapshot();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ----------------------------------------------------------------------------
// Callbacks
// ----------------------------------------------------------------------------

/// A shared callback, used for event handlers and emitted events.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value]) -> Value>);

impl Callback {
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_of_primitives_is_by_value() {
        assert!(Value::from(1).same(&Value::Int(1)));
        assert!(Value::from("a").same(&Value::from(String::from("a"))));
        assert!(!Value::Int(1).same(&Value::Float(1.0)));
        assert!(Value::Float(f64::NAN).same(&Value::Float(f64::NAN)));
        assert!(!Value::Float(0.0).same(&Value::Float(-0.0)));
    }

    #[test]
    fn identity_of_objects_is_by_pointer() {
        let a = RawObject::new();
        let b = RawObject::new();
        assert!(Value::from(a.clone()).same(&Value::from(a)));
        assert!(!Value::from(b).same(&Value::from(RawObject::new())));
    }

    #[test]
    fn json_arrays_become_index_keyed_objects() {
        let value = Value::from(serde_json::json!({ "list": ["x", "y"], "n": 1.5 }));
        let list = value.get("list");
        assert_eq!(list.get("1").as_str(), Some("y"));
        assert_eq!(value.get("n").as_float(), Some(1.5));
    }

    #[test]
    fn raw_objects_serialize_in_insertion_order() {
        let value = Value::from(serde_json::json!({ "b": 1, "a": [true] }));
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"b":1,"a":{"0":true}}"#);
    }

    #[test]
    fn member_access_on_primitives_is_inert() {
        assert!(Value::Int(3).get("x").is_null());
        assert!(!Value::Int(3).set("x", 1));
        assert!(!Value::Null.has("x"));
    }
}

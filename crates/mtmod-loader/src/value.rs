// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Values visible to module code
//!
//! Exports are [`Object`]s: shared, interior-mutable maps. Cloning an
//! `Object` hands out another reference to the same map, which is what lets
//! a cyclic `require` observe mutations made after it returned.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A module-level value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Shared object reference
    Object(Object),
}

impl Value {
    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Borrow the object reference, if this is an object
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the string contents, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value's type as `typeof` would report it
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Object(_) => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// Convert to JSON. Objects already on the current path become `"[Circular]"`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut seen = Vec::new();
        self.to_json_inner(&mut seen)
    }

    fn to_json_inner(&self, seen: &mut Vec<*const ()>) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Object(obj) => {
                let id = obj.id();
                if seen.contains(&id) {
                    return serde_json::Value::String("[Circular]".to_string());
                }
                seen.push(id);
                let map = obj
                    .entries()
                    .into_iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k, v.to_json_inner(seen)))
                    .collect();
                seen.pop();
                serde_json::Value::Object(map)
            }
        }
    }

    fn fmt_inner(&self, f: &mut fmt::Formatter<'_>, seen: &mut Vec<*const ()>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Object(obj) => {
                let id = obj.id();
                if seen.contains(&id) {
                    return write!(f, "[Circular]");
                }
                let entries = obj.entries();
                if entries.is_empty() {
                    return write!(f, "{{}}");
                }
                seen.push(id);
                write!(f, "{{ ")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    if let Value::String(s) = value {
                        write!(f, "{:?}", s)?;
                    } else {
                        value.fmt_inner(f, seen)?;
                    }
                }
                seen.pop();
                write!(f, " }}")
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seen = Vec::new();
        self.fmt_inner(f, &mut seen)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

/// Shared, mutable key/value map
///
/// Locks are held only for the duration of a single accessor call, so module
/// code may freely re-enter the loader between reads and writes.
#[derive(Clone, Default)]
pub struct Object {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Object {
    /// Create a new empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a property
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// Write a property
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.write().insert(key.into(), value.into());
    }

    /// Remove a property
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.write().remove(key)
    }

    /// Check if a property exists
    pub fn has(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Property names in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Snapshot of all properties
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the object has no properties
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Replace every property with those of `other`, keeping this object's identity
    pub fn replace_contents(&self, other: &Object) {
        if self.ptr_eq(other) {
            return;
        }
        let entries = other.entries();
        let mut map = self.inner.write();
        map.clear();
        map.extend(entries);
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn id(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:p}) {}", self.id(), Value::Object(self.clone()))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let obj = Object::new();
        obj.inner.write().extend(iter);
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_aliases() {
        let a = Object::new();
        let b = a.clone();
        b.set("info", "hello");
        assert_eq!(a.get("info"), Some(Value::from("hello")));
        assert!(a.ptr_eq(&b));
        assert_ne!(a, Object::new());
    }

    #[test]
    fn test_replace_contents_keeps_identity() {
        let exports = Object::new();
        exports.set("old", 1.0);
        let held = exports.clone();

        let replacement = Object::new();
        replacement.set("fresh", true);
        exports.replace_contents(&replacement);

        assert!(held.ptr_eq(&exports));
        assert!(!held.has("old"));
        assert_eq!(held.get("fresh"), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_display() {
        let obj = Object::new();
        obj.set("name", "b");
        obj.set("count", 2.0);
        assert_eq!(Value::Object(obj).to_string(), r#"{ count: 2, name: "b" }"#);
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Object(Object::new()).to_string(), "{}");
    }

    #[test]
    fn test_cycles_terminate() {
        let a = Object::new();
        let b = Object::new();
        a.set("b", b.clone());
        b.set("a", a.clone());

        assert_eq!(Value::Object(a.clone()).to_string(), "{ b: { a: [Circular] } }");
        assert_eq!(
            Value::Object(a).to_json(),
            serde_json::json!({ "b": { "a": "[Circular]" } })
        );
    }

    #[test]
    fn test_shared_non_cyclic_is_not_circular() {
        let shared = Object::new();
        shared.set("x", 1.0);
        let root = Object::new();
        root.set("left", shared.clone());
        root.set("right", shared);
        assert_eq!(
            Value::Object(root).to_json(),
            serde_json::json!({ "left": { "x": 1.0 }, "right": { "x": 1.0 } })
        );
    }
}

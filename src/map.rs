//! Container types for TBin values.
//!
//! - [`Struct`]: named fields, kept in insertion order. Field order matters on
//!   the wire but not for equality.
//! - [`ValueMap`]: arbitrary keys to values. Keys may be any [`Value`], so this
//!   is an association list rather than a hash map; equality ignores entry
//!   order.
//!
//! ## Examples
//!
//! ```rust
//! use tbin::{Struct, Value};
//!
//! let mut point = Struct::new();
//! point.insert("x", 1);
//! point.insert("y", 2);
//!
//! let keys: Vec<_> = point.keys().cloned().collect();
//! assert_eq!(keys, vec!["x", "y"]);
//! assert_eq!(point.get("y").and_then(Value::as_i64), Some(2));
//! ```

use crate::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered record of named fields.
///
/// Backed by [`IndexMap`], whose equality already ignores insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Struct(IndexMap<String, Value>);

impl Struct {
    #[must_use]
    pub fn new() -> Self {
        Struct(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Struct(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field, returning the previous value. An existing field keeps
    /// its position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tbin::Struct;
    ///
    /// let mut s = Struct::new();
    /// assert!(s.insert("id", 42).is_none());
    /// assert!(s.insert("id", 43).is_some());
    /// ```
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Removes a field, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for Struct {
    fn from(map: HashMap<String, Value>) -> Self {
        Struct(map.into_iter().collect())
    }
}

impl From<Struct> for HashMap<String, Value> {
    fn from(s: Struct) -> Self {
        s.0.into_iter().collect()
    }
}

impl IntoIterator for Struct {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Struct {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Struct {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Struct(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A map with arbitrary [`Value`] keys.
///
/// # Examples
///
/// ```rust
/// use tbin::{Value, ValueMap};
///
/// let mut a = ValueMap::new();
/// a.insert(Value::Int32(1), Value::from("one"));
/// a.insert(Value::Int32(2), Value::from("two"));
///
/// let b: ValueMap = a.iter().rev().cloned().collect();
/// assert_eq!(a, b);
/// assert_eq!(a.get(&Value::Int32(2)), Some(&Value::from("two")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueMap(Vec<(Value, Value)>);

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        ValueMap(Vec::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ValueMap(Vec::with_capacity(capacity))
    }

    /// Inserts an entry, replacing and returning the value of an equal key.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    /// Appends an entry without looking for an existing key.
    pub(crate) fn push(&mut self, key: Value, value: Value) {
        self.0.push((key, value));
    }

    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.0.iter()
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        let mut matched = vec![false; other.0.len()];
        self.0.iter().all(|entry| {
            let found = other
                .0
                .iter()
                .enumerate()
                .position(|(i, candidate)| !matched[i] && candidate == entry);
            match found {
                Some(i) => {
                    matched[i] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = &'a (Value, Value);
    type IntoIter = std::slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

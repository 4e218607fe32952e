//! Names: the process-wide [`Symbol`] scalar and the stream-local symbol table.
//!
//! These are two unrelated mechanisms that happen to share a word.
//!
//! - [`Symbol`] is a value-model scalar. Every distinct name is interned once per
//!   process in a concurrent map and shared by all threads from then on, so two
//!   symbols with the same name are the same allocation.
//! - [`SymbolTable`] lives inside one encoder or decoder. It numbers struct field
//!   names (and symbol scalars) in order of first use so that each name travels
//!   over the wire once per stream; later uses send only the id.

use crate::{Error, Result};
use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

fn interner() -> &'static DashMap<Arc<str>, ()> {
    static INTERNER: OnceLock<DashMap<Arc<str>, ()>> = OnceLock::new();
    INTERNER.get_or_init(DashMap::new)
}

fn intern(name: &str) -> Arc<str> {
    let table = interner();
    if let Some(entry) = table.get(name) {
        return entry.key().clone();
    }
    table.entry(Arc::from(name)).or_insert(()).key().clone()
}

/// An interned name.
///
/// Creating a symbol is a hash lookup; cloning and comparing one is a pointer
/// operation. Interned names are never released.
///
/// # Examples
///
/// ```rust
/// use tbin::Symbol;
///
/// let a = Symbol::new("status");
/// let b = Symbol::from(String::from("status"));
/// assert_eq!(a, b);
/// assert!(a.ptr_eq(&b));
/// assert_eq!(a.as_str(), "status");
/// ```
#[derive(Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Symbol(intern(name))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if both symbols point at the same interned name.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", &*self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol::new(&name)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Symbol::new(&name))
    }
}

/// Stream-local name table.
///
/// Ids are assigned sequentially from 0 in order of first use. On the wire a
/// name is `varint(id)`, followed by `varint(len)` and the UTF-8 bytes only when
/// `id` is the next unassigned id.
#[derive(Debug, Default)]
pub struct SymbolTable {
    ids: HashMap<Symbol, u32>,
    names: Vec<Symbol>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of names assigned so far; also the next id to be assigned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Encoder side: returns the id of `name` and whether it was just assigned.
    pub fn intern_name(&mut self, name: &str) -> (u32, bool) {
        if let Some(&id) = self.ids.get(name) {
            return (id, false);
        }
        let id = self.names.len() as u32;
        let symbol = Symbol::new(name);
        self.ids.insert(symbol.clone(), id);
        self.names.push(symbol);
        log::trace!("symbol {id} = {name:?}");
        (id, true)
    }

    /// Decoder side: records `name` under `id`, which must be the next id.
    pub fn define_name(&mut self, id: u32, name: &str) -> Result<Symbol> {
        if id as usize != self.names.len() {
            return Err(Error::UndefinedSymbol(id));
        }
        let symbol = Symbol::new(name);
        self.ids.insert(symbol.clone(), id);
        self.names.push(symbol.clone());
        log::trace!("symbol {id} = {name:?}");
        Ok(symbol)
    }

    /// Decoder side: resolves a previously defined id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Symbol> {
        self.names.get(id as usize)
    }
}

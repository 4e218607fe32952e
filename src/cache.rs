//! Stream-local tag/type cache.
//!
//! User tags start at [`FIRST_USER_TAG`] and are handed out in strictly
//! increasing, gapless order of first use. The encoder interns shapes (children
//! before parents) and the decoder registers the definitions it reads, so both
//! sides arrive at the same numbering without ever exchanging a table.

use crate::format::FIRST_USER_TAG;
use crate::typedef::{Shape, TypeDef};
use crate::{Error, Result};
use std::collections::HashMap;

/// Arena of user shapes indexed by `tag - FIRST_USER_TAG`, plus a signature index.
#[derive(Debug, Default)]
pub struct TypeCache {
    defs: Vec<TypeDef>,
    tags: HashMap<String, u32>,
}

impl TypeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tag the next new shape will receive.
    #[must_use]
    pub fn next_tag(&self) -> u32 {
        FIRST_USER_TAG + self.defs.len() as u32
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Returns the tag already assigned to `shape`, if any.
    #[must_use]
    pub fn tag_of(&self, shape: &TypeDef) -> Option<u32> {
        match shape {
            TypeDef::Primitive(kind) => Some(kind.tag()),
            TypeDef::Composite(_) => self.tags.get(shape.signature()).copied(),
        }
    }

    /// Encoder side: returns the tag of `shape` and every shape that had to be
    /// newly assigned to get it, in assignment order (children first).
    ///
    /// Shapes of optional fields are interned too, even though the field itself
    /// is declared as Any.
    pub fn intern(&mut self, shape: &TypeDef, assigned: &mut Vec<(u32, TypeDef)>) -> u32 {
        if let Some(tag) = self.tag_of(shape) {
            return tag;
        }
        if let Some(composite) = shape.shape() {
            match composite {
                Shape::Struct(fields) => {
                    for field in fields {
                        self.intern(&field.shape, assigned);
                    }
                }
                Shape::Array(items) => {
                    self.intern(items, assigned);
                }
                Shape::Map(keys, items) => {
                    self.intern(keys, assigned);
                    self.intern(items, assigned);
                }
                Shape::Union(variants) => {
                    for variant in variants {
                        self.intern(variant, assigned);
                    }
                }
                Shape::Enum(_) => {}
            }
        }
        let tag = self.push(shape.clone());
        log::trace!("assigned tag 0x{tag:02x} to {shape}");
        assigned.push((tag, shape.clone()));
        tag
    }

    /// Decoder side: registers `shape` under `tag`, which must be the next tag.
    pub fn define(&mut self, tag: u32, shape: TypeDef) -> Result<()> {
        if tag != self.next_tag() {
            return Err(Error::UndefinedTypeTag(tag));
        }
        log::trace!("registered tag 0x{tag:02x} as {shape}");
        self.push(shape);
        Ok(())
    }

    /// Decoder side: resolves a user tag.
    pub fn lookup(&self, tag: u32) -> Result<&TypeDef> {
        tag.checked_sub(FIRST_USER_TAG)
            .and_then(|index| self.defs.get(index as usize))
            .ok_or(Error::UndefinedTypeTag(tag))
    }

    #[must_use]
    pub fn is_defined(&self, tag: u32) -> bool {
        tag >= FIRST_USER_TAG && ((tag - FIRST_USER_TAG) as usize) < self.defs.len()
    }

    fn push(&mut self, shape: TypeDef) -> u32 {
        let tag = self.next_tag();
        self.tags.insert(shape.signature().to_string(), tag);
        self.defs.push(shape);
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedef::Field;

    fn point() -> TypeDef {
        TypeDef::struct_of(vec![
            Field::required("x", TypeDef::INT32),
            Field::required("y", TypeDef::INT32),
        ])
    }

    #[test]
    fn test_primitives_never_assigned() {
        let mut cache = TypeCache::new();
        let mut assigned = Vec::new();
        assert_eq!(cache.intern(&TypeDef::STRING, &mut assigned), 0x09);
        assert_eq!(cache.intern(&TypeDef::array_of(TypeDef::ANY), &mut assigned), 0x0d);
        assert!(assigned.is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_children_interned_before_parents() {
        let mut cache = TypeCache::new();
        let mut assigned = Vec::new();
        let line = TypeDef::array_of(point());
        let tag = cache.intern(&line, &mut assigned);
        assert_eq!(tag, 0x41);
        let tags: Vec<u32> = assigned.iter().map(|(t, _)| *t).collect();
        assert_eq!(tags, vec![0x40, 0x41]);
        assert_eq!(assigned[0].1, point());

        assigned.clear();
        assert_eq!(cache.intern(&point(), &mut assigned), 0x40);
        assert!(assigned.is_empty());
    }

    #[test]
    fn test_optional_field_shapes_interned_first() {
        let mut cache = TypeCache::new();
        let mut assigned = Vec::new();
        let shape = TypeDef::struct_of(vec![Field::optional("at", point())]);
        assert_eq!(cache.intern(&shape, &mut assigned), 0x41);
        let tags: Vec<u32> = assigned.iter().map(|(t, _)| *t).collect();
        assert_eq!(tags, vec![0x40, 0x41]);
        assert_eq!(assigned[0].1, point());
        assert_eq!(assigned[1].1, shape);
    }

    #[test]
    fn test_define_and_lookup() {
        let mut cache = TypeCache::new();
        assert!(matches!(cache.lookup(0x40), Err(Error::UndefinedTypeTag(0x40))));
        cache.define(0x40, point()).unwrap();
        assert_eq!(cache.lookup(0x40).unwrap(), &point());
        assert!(cache.is_defined(0x40));
        assert!(!cache.is_defined(0x41));
        assert!(matches!(
            cache.define(0x42, point()),
            Err(Error::UndefinedTypeTag(0x42))
        ));
        assert!(matches!(cache.lookup(0x05), Err(Error::UndefinedTypeTag(0x05))));
    }
}

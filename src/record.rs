//! Statically declared wire shapes for Rust types.
//!
//! A type opts into typed encoding by implementing [`Record`]: serde supplies
//! field access, and a `const` table of [`FieldDescriptor`]s supplies the wire
//! shape. The shape is defined once per stream and later values of the type
//! carry only their field payloads.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use tbin::{FieldDescriptor, FieldKind, Primitive, Record};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! impl Record for Point {
//!     const FIELDS: &'static [FieldDescriptor] = &[
//!         FieldDescriptor::required("x", FieldKind::Primitive(Primitive::Int32)),
//!         FieldDescriptor::required("y", FieldKind::Primitive(Primitive::Int32)),
//!     ];
//! }
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Polyline { name: Option<String>, points: Vec<Point> }
//!
//! impl Record for Polyline {
//!     const FIELDS: &'static [FieldDescriptor] = &[
//!         FieldDescriptor::optional("name", FieldKind::Primitive(Primitive::String)),
//!         FieldDescriptor::required("points", FieldKind::Array(&FieldKind::Nested(Point::type_def))),
//!     ];
//! }
//!
//! assert_eq!(
//!     Polyline::type_def().signature(),
//!     "Struct{name?:String,points:Array<Struct{x:Int32,y:Int32}>}"
//! );
//! ```

use crate::typedef::{Field, Primitive, TypeDef};
use crate::{Error, Result, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The declared type of one field.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    Primitive(Primitive),
    Array(&'static FieldKind),
    Map(&'static FieldKind, &'static FieldKind),
    /// Another record, or any shape built at runtime.
    Nested(fn() -> TypeDef),
}

impl FieldKind {
    /// Resolves this kind into a shape.
    #[must_use]
    pub fn to_type_def(&self) -> TypeDef {
        match self {
            FieldKind::Primitive(kind) => TypeDef::primitive(*kind),
            FieldKind::Array(items) => TypeDef::array_of(items.to_type_def()),
            FieldKind::Map(keys, items) => TypeDef::map_of(keys.to_type_def(), items.to_type_def()),
            FieldKind::Nested(build) => build(),
        }
    }
}

/// Name, declared type and presence rule of one field.
#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        FieldDescriptor {
            name,
            kind,
            optional: false,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        FieldDescriptor {
            name,
            kind,
            optional: true,
        }
    }
}

/// A Rust type with a fixed struct shape on the wire.
///
/// `FIELDS` must list the fields in the order serde serializes them, using the
/// serialized names.
pub trait Record: Serialize + DeserializeOwned {
    const FIELDS: &'static [FieldDescriptor];

    fn type_def() -> TypeDef {
        TypeDef::record(Self::FIELDS)
    }
}

impl TypeDef {
    /// Builds the struct shape described by a descriptor table.
    #[must_use]
    pub fn record(fields: &[FieldDescriptor]) -> TypeDef {
        TypeDef::struct_of(
            fields
                .iter()
                .map(|f| Field {
                    name: f.name.to_string(),
                    shape: f.kind.to_type_def(),
                    optional: f.optional,
                })
                .collect(),
        )
    }
}

/// Checks that a decoded value carries every required field of `fields`.
///
/// A required field declared as Any reads back like an optional one, so when
/// it is absent it is restored as `Null`.
pub(crate) fn check_required(fields: &[FieldDescriptor], value: &mut Value) -> Result<()> {
    let present = match value {
        Value::Struct(s) => s,
        other => return Err(Error::type_mismatch("Struct", other.kind().signature())),
    };
    for field in fields.iter().filter(|f| !f.optional) {
        if present.contains_key(field.name) {
            continue;
        }
        match field.kind {
            FieldKind::Primitive(Primitive::Any) => {
                present.insert(field.name, Value::Null);
            }
            _ => return Err(Error::missing_field(field.name)),
        }
    }
    Ok(())
}

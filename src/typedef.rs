//! Structural type shapes used for wire-level caching.
//!
//! A [`TypeDef`] describes the structure of a value well enough that, once it
//! has been defined in a stream, values of that shape can be written without
//! repeating field names or per-element tags. Shapes are identified by their
//! canonical **signature**, a string computed once when the shape is built:
//!
//! ```text
//! Int32
//! Struct{x:Int32,y:Int32}
//! Struct{name:String,nick?:String}
//! Array<Struct{x:Int32,y:Int32}>
//! Map<String,Array<Any>>
//! Enum<red,green,blue>
//! Union<Int64,String>
//! ```
//!
//! Delimiter characters inside field names and enum symbols are escaped with a
//! backslash, so two shapes with equal signatures are the same shape. Shapes
//! are immutable trees built bottom-up, so self-referential shapes cannot be
//! expressed.
//!
//! Shapes describe structure only; they carry no validation rules.

use crate::format::*;
use crate::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The fixed kinds that have a pre-assigned wire tag.
///
/// `Array`, `Map` and `Struct` are the generic containers whose children are
/// individually tagged. `Any` is never a value kind: as a declared type it
/// means "a tagged value follows".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Null,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bytes,
    String,
    Timestamp,
    Symbol,
    Uuid,
    Array,
    Map,
    Struct,
    Any,
}

impl Primitive {
    /// The fixed wire tag of this kind.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Primitive::Null => NULL_TAG,
            Primitive::Bool => BOOL_TAG,
            Primitive::Int8 => INT8_TAG,
            Primitive::Int16 => INT16_TAG,
            Primitive::Int32 => INT32_TAG,
            Primitive::Int64 => INT64_TAG,
            Primitive::Float32 => FLOAT32_TAG,
            Primitive::Float64 => FLOAT64_TAG,
            Primitive::Bytes => BYTES_TAG,
            Primitive::String => STRING_TAG,
            Primitive::Timestamp => TIMESTAMP_TAG,
            Primitive::Symbol => SYMBOL_TAG,
            Primitive::Uuid => UUID_TAG,
            Primitive::Array => ARRAY_TAG,
            Primitive::Map => MAP_TAG,
            Primitive::Struct => STRUCT_TAG,
            Primitive::Any => ANY_TAG,
        }
    }

    /// Maps a fixed tag back to its kind. Tiny-string tags are not included.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Primitive> {
        Some(match tag {
            NULL_TAG => Primitive::Null,
            BOOL_TAG => Primitive::Bool,
            INT8_TAG => Primitive::Int8,
            INT16_TAG => Primitive::Int16,
            INT32_TAG => Primitive::Int32,
            INT64_TAG => Primitive::Int64,
            FLOAT32_TAG => Primitive::Float32,
            FLOAT64_TAG => Primitive::Float64,
            BYTES_TAG => Primitive::Bytes,
            STRING_TAG => Primitive::String,
            TIMESTAMP_TAG => Primitive::Timestamp,
            SYMBOL_TAG => Primitive::Symbol,
            UUID_TAG => Primitive::Uuid,
            ARRAY_TAG => Primitive::Array,
            MAP_TAG => Primitive::Map,
            STRUCT_TAG => Primitive::Struct,
            ANY_TAG => Primitive::Any,
            _ => return None,
        })
    }

    /// The signature of this kind.
    #[must_use]
    pub const fn signature(self) -> &'static str {
        match self {
            Primitive::Null => "Null",
            Primitive::Bool => "Bool",
            Primitive::Int8 => "Int8",
            Primitive::Int16 => "Int16",
            Primitive::Int32 => "Int32",
            Primitive::Int64 => "Int64",
            Primitive::Float32 => "Float32",
            Primitive::Float64 => "Float64",
            Primitive::Bytes => "Bytes",
            Primitive::String => "String",
            Primitive::Timestamp => "Timestamp",
            Primitive::Symbol => "Symbol",
            Primitive::Uuid => "UUID",
            Primitive::Array => "Array<Any>",
            Primitive::Map => "Map<Any,Any>",
            Primitive::Struct => "Struct",
            Primitive::Any => "Any",
        }
    }

    /// Inclusive value range for the integer kinds.
    #[must_use]
    pub const fn int_range(self) -> Option<(i64, i64)> {
        match self {
            Primitive::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            Primitive::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Primitive::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Primitive::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

/// One field of a struct shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub shape: TypeDef,
    pub optional: bool,
}

impl Field {
    pub fn required(name: impl Into<String>, shape: TypeDef) -> Self {
        Field {
            name: name.into(),
            shape,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, shape: TypeDef) -> Self {
        Field {
            name: name.into(),
            shape,
            optional: true,
        }
    }
}

/// The structure of a composite shape.
#[derive(Clone, Debug)]
pub enum Shape {
    Struct(Vec<Field>),
    Array(TypeDef),
    Map(TypeDef, TypeDef),
    /// Symbols in declaration order; on the wire they are numbered from 1.
    Enum(Vec<String>),
    Union(Vec<TypeDef>),
}

/// A composite shape together with its memoized signature.
#[derive(Debug)]
pub struct Composite {
    shape: Shape,
    signature: String,
}

impl Composite {
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// A value's structural type.
///
/// Primitive shapes are plain `Copy`-like values with fixed tags; composite
/// shapes are shared, immutable trees whose signature is computed eagerly.
///
/// # Examples
///
/// ```rust
/// use tbin::{Field, TypeDef};
///
/// let point = TypeDef::struct_of(vec![
///     Field::required("x", TypeDef::INT32),
///     Field::required("y", TypeDef::INT32),
/// ]);
/// assert_eq!(point.signature(), "Struct{x:Int32,y:Int32}");
///
/// let line = TypeDef::array_of(point.clone());
/// assert_eq!(line.to_string(), "Array<Struct{x:Int32,y:Int32}>");
/// ```
#[derive(Clone)]
pub enum TypeDef {
    Primitive(Primitive),
    Composite(Arc<Composite>),
}

impl TypeDef {
    pub const NULL: TypeDef = TypeDef::Primitive(Primitive::Null);
    pub const BOOL: TypeDef = TypeDef::Primitive(Primitive::Bool);
    pub const INT8: TypeDef = TypeDef::Primitive(Primitive::Int8);
    pub const INT16: TypeDef = TypeDef::Primitive(Primitive::Int16);
    pub const INT32: TypeDef = TypeDef::Primitive(Primitive::Int32);
    pub const INT64: TypeDef = TypeDef::Primitive(Primitive::Int64);
    pub const FLOAT32: TypeDef = TypeDef::Primitive(Primitive::Float32);
    pub const FLOAT64: TypeDef = TypeDef::Primitive(Primitive::Float64);
    pub const BYTES: TypeDef = TypeDef::Primitive(Primitive::Bytes);
    pub const STRING: TypeDef = TypeDef::Primitive(Primitive::String);
    pub const TIMESTAMP: TypeDef = TypeDef::Primitive(Primitive::Timestamp);
    pub const SYMBOL: TypeDef = TypeDef::Primitive(Primitive::Symbol);
    pub const UUID: TypeDef = TypeDef::Primitive(Primitive::Uuid);
    pub const ARRAY: TypeDef = TypeDef::Primitive(Primitive::Array);
    pub const MAP: TypeDef = TypeDef::Primitive(Primitive::Map);
    pub const STRUCT: TypeDef = TypeDef::Primitive(Primitive::Struct);
    pub const ANY: TypeDef = TypeDef::Primitive(Primitive::Any);

    #[must_use]
    pub const fn primitive(kind: Primitive) -> TypeDef {
        TypeDef::Primitive(kind)
    }

    fn composite(shape: Shape, signature: String) -> TypeDef {
        TypeDef::Composite(Arc::new(Composite { shape, signature }))
    }

    /// Builds a struct shape. Field order is significant.
    #[must_use]
    pub fn struct_of(fields: Vec<Field>) -> TypeDef {
        let mut sig = String::from("Struct{");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                sig.push(',');
            }
            push_escaped(&mut sig, &field.name);
            if field.optional {
                sig.push('?');
            }
            sig.push(':');
            sig.push_str(field.shape.signature());
        }
        sig.push('}');
        TypeDef::composite(Shape::Struct(fields), sig)
    }

    /// Builds an array shape. `Array<Any>` is the generic array.
    #[must_use]
    pub fn array_of(items: TypeDef) -> TypeDef {
        if items.is_any() {
            return TypeDef::ARRAY;
        }
        let sig = format!("Array<{}>", items.signature());
        TypeDef::composite(Shape::Array(items), sig)
    }

    /// Builds a map shape. `Map<Any,Any>` is the generic map.
    #[must_use]
    pub fn map_of(keys: TypeDef, items: TypeDef) -> TypeDef {
        if keys.is_any() && items.is_any() {
            return TypeDef::MAP;
        }
        let sig = format!("Map<{},{}>", keys.signature(), items.signature());
        TypeDef::composite(Shape::Map(keys, items), sig)
    }

    /// Builds an enum shape from its symbols, in declaration order.
    #[must_use]
    pub fn enum_of<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> TypeDef {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        let mut sig = String::from("Enum<");
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 {
                sig.push(',');
            }
            push_escaped(&mut sig, symbol);
        }
        sig.push('>');
        TypeDef::composite(Shape::Enum(symbols), sig)
    }

    /// Builds a union shape from its variants, in declaration order.
    #[must_use]
    pub fn union_of(variants: Vec<TypeDef>) -> TypeDef {
        let parts: Vec<&str> = variants.iter().map(TypeDef::signature).collect();
        let sig = format!("Union<{}>", parts.join(","));
        TypeDef::composite(Shape::Union(variants), sig)
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        match self {
            TypeDef::Primitive(kind) => kind.signature(),
            TypeDef::Composite(c) => &c.signature,
        }
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, TypeDef::Primitive(Primitive::Any))
    }

    #[must_use]
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            TypeDef::Primitive(kind) => Some(*kind),
            TypeDef::Composite(_) => None,
        }
    }

    #[must_use]
    pub fn shape(&self) -> Option<&Shape> {
        match self {
            TypeDef::Primitive(_) => None,
            TypeDef::Composite(c) => Some(&c.shape),
        }
    }

    /// Struct fields, if this is a struct shape with a declared field list.
    #[must_use]
    pub fn fields(&self) -> Option<&[Field]> {
        match self.shape() {
            Some(Shape::Struct(fields)) => Some(fields),
            _ => None,
        }
    }

    /// Returns `true` if `value` can be written under this shape.
    ///
    /// This is the rule unions use to pick a variant, and the same coercions the
    /// encoder applies when writing a payload: integers must fit the declared
    /// width, `Float64` also takes `Float32`, and `Timestamp`/`UUID` also take
    /// their textual forms.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tbin::{TypeDef, Value};
    ///
    /// assert!(TypeDef::INT8.accepts(&Value::Int64(100)));
    /// assert!(!TypeDef::INT8.accepts(&Value::Int64(1000)));
    /// assert!(TypeDef::ANY.accepts(&Value::from("anything")));
    /// ```
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeDef::Primitive(kind) => primitive_accepts(*kind, value),
            TypeDef::Composite(c) => match (&c.shape, value) {
                (Shape::Array(items), Value::Array(values)) => {
                    values.iter().all(|v| items.accepts(v))
                }
                (Shape::Map(keys, items), Value::Map(map)) => map
                    .iter()
                    .all(|(k, v)| keys.accepts(k) && items.accepts(v)),
                (Shape::Struct(fields), Value::Struct(s)) => {
                    s.keys().all(|name| fields.iter().any(|f| f.name == *name))
                        && fields.iter().all(|f| match s.get(&f.name) {
                            None | Some(Value::Null) if f.optional => true,
                            Some(v) => f.shape.accepts(v),
                            None => false,
                        })
                }
                (Shape::Enum(symbols), v) => match v.as_name() {
                    Some(name) => symbols.iter().any(|s| s == name),
                    None => false,
                },
                (Shape::Union(variants), v) => variants.iter().any(|t| t.accepts(v)),
                _ => false,
            },
        }
    }
}

fn push_escaped(sig: &mut String, name: &str) {
    for c in name.chars() {
        if matches!(c, '\\' | ',' | ':' | '?' | '{' | '}' | '<' | '>') {
            sig.push('\\');
        }
        sig.push(c);
    }
}

fn primitive_accepts(kind: Primitive, value: &Value) -> bool {
    match kind {
        Primitive::Any => true,
        Primitive::Null => value.is_null(),
        Primitive::Bool => matches!(value, Value::Bool(_)),
        Primitive::Int8 | Primitive::Int16 | Primitive::Int32 | Primitive::Int64 => {
            match (value.as_i64(), kind.int_range()) {
                (Some(n), Some((min, max))) => n >= min && n <= max,
                _ => false,
            }
        }
        Primitive::Float32 => matches!(value, Value::Float32(_)),
        Primitive::Float64 => matches!(value, Value::Float32(_) | Value::Float64(_)),
        Primitive::Bytes => matches!(value, Value::Bytes(_)),
        Primitive::String | Primitive::Symbol => value.as_name().is_some(),
        Primitive::Timestamp => value.to_timestamp().is_some(),
        Primitive::Uuid => value.to_uuid().is_some(),
        Primitive::Array => value.is_array(),
        Primitive::Map => value.is_map(),
        Primitive::Struct => value.is_struct(),
    }
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for TypeDef {}

impl Hash for TypeDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature().hash(state);
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDef({})", self.signature())
    }
}

impl From<Primitive> for TypeDef {
    fn from(kind: Primitive) -> Self {
        TypeDef::Primitive(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> TypeDef {
        TypeDef::struct_of(vec![
            Field::required("x", TypeDef::INT32),
            Field::required("y", TypeDef::INT32),
        ])
    }

    #[test]
    fn test_primitive_tags_roundtrip() {
        for tag in NULL_TAG..=ANY_TAG {
            let kind = Primitive::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(Primitive::from_tag(DEF_ARRAY_TAG), None);
        assert_eq!(Primitive::from_tag(FIRST_USER_TAG), None);
    }

    #[test]
    fn test_signatures() {
        assert_eq!(point().signature(), "Struct{x:Int32,y:Int32}");
        assert_eq!(
            TypeDef::map_of(TypeDef::STRING, TypeDef::array_of(point())).signature(),
            "Map<String,Array<Struct{x:Int32,y:Int32}>>"
        );
        assert_eq!(
            TypeDef::enum_of(["red", "green"]).signature(),
            "Enum<red,green>"
        );
        assert_eq!(
            TypeDef::union_of(vec![TypeDef::INT64, TypeDef::STRING]).signature(),
            "Union<Int64,String>"
        );
        let with_optional = TypeDef::struct_of(vec![
            Field::required("name", TypeDef::STRING),
            Field::optional("nick", TypeDef::STRING),
        ]);
        assert_eq!(with_optional.signature(), "Struct{name:String,nick?:String}");
    }

    #[test]
    fn test_delimiters_in_names_are_escaped() {
        let joined = TypeDef::enum_of(["a,b"]);
        let split = TypeDef::enum_of(["a", "b"]);
        assert_eq!(joined.signature(), "Enum<a\\,b>");
        assert_eq!(split.signature(), "Enum<a,b>");
        assert_ne!(joined, split);

        let odd = TypeDef::struct_of(vec![Field::required("x:Int32,y", TypeDef::INT32)]);
        let plain = TypeDef::struct_of(vec![
            Field::required("x", TypeDef::INT32),
            Field::required("y", TypeDef::INT32),
        ]);
        assert_ne!(odd, plain);

        let marked = TypeDef::struct_of(vec![Field::required("nick?", TypeDef::STRING)]);
        let optional = TypeDef::struct_of(vec![Field::optional("nick", TypeDef::STRING)]);
        assert_eq!(marked.signature(), "Struct{nick\\?:String}");
        assert_ne!(marked, optional);
    }

    #[test]
    fn test_structurally_equal_shapes_are_equal() {
        let a = point();
        let b = point();
        assert!(!matches!((&a, &b), (TypeDef::Composite(x), TypeDef::Composite(y)) if Arc::ptr_eq(x, y)));
        assert_eq!(a, b);
        assert_ne!(a, TypeDef::struct_of(vec![Field::required("x", TypeDef::INT32)]));
    }

    #[test]
    fn test_generic_containers_collapse() {
        assert_eq!(TypeDef::array_of(TypeDef::ANY), TypeDef::ARRAY);
        assert!(TypeDef::array_of(TypeDef::ANY).as_primitive().is_some());
        assert_eq!(TypeDef::map_of(TypeDef::ANY, TypeDef::ANY), TypeDef::MAP);
        assert!(TypeDef::map_of(TypeDef::STRING, TypeDef::ANY).shape().is_some());
    }

    #[test]
    fn test_accepts_struct() {
        let shape = TypeDef::struct_of(vec![
            Field::required("x", TypeDef::INT32),
            Field::optional("label", TypeDef::STRING),
        ]);
        let value = crate::tbin!({"x": 3});
        assert!(shape.accepts(&value));
        let value = crate::tbin!({"x": 3, "label": "p"});
        assert!(shape.accepts(&value));
        let value = crate::tbin!({"x": 3, "z": 1});
        assert!(!shape.accepts(&value));
        let value = crate::tbin!({"label": "p"});
        assert!(!shape.accepts(&value));
    }

    #[test]
    fn test_accepts_enum_and_union() {
        let color = TypeDef::enum_of(["red", "green"]);
        assert!(color.accepts(&Value::from("green")));
        assert!(!color.accepts(&Value::from("blue")));

        let union = TypeDef::union_of(vec![TypeDef::INT64, TypeDef::STRING]);
        assert!(union.accepts(&Value::Int32(5)));
        assert!(union.accepts(&Value::from("five")));
        assert!(!union.accepts(&Value::Bool(true)));
    }
}

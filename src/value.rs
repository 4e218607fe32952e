//! Dynamic value representation for TBin data.
//!
//! [`Value`] can hold anything the wire format can carry. It is what
//! [`Decoder::decode`](crate::Decoder::decode) produces when no target type is
//! known, and what the encoder walks when writing.
//!
//! ## Creating Values
//!
//! ```rust
//! use tbin::{tbin, Symbol, Value};
//!
//! let null = Value::Null;
//! let number = Value::from(42);
//! let text = Value::from("hello");
//! let name = Value::from(Symbol::new("status"));
//!
//! let point = tbin!({ "x": 1, "y": 2 });
//! assert!(point.is_struct());
//! ```
//!
//! ## Extracting Values
//!
//! ```rust
//! use tbin::Value;
//!
//! let value = Value::Int16(42);
//! assert_eq!(value.as_i64(), Some(42));
//! assert_eq!(i64::try_from(value).unwrap(), 42);
//! ```

use crate::typedef::{Primitive, TypeDef};
use crate::{Struct, Symbol, ValueMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// A dynamically-typed TBin value.
///
/// Integers keep their declared width; there is no implicit widening between
/// variants, so `Value::Int8(1) != Value::Int32(1)`. Use [`Value::as_i64`] to
/// compare numerically.
///
/// Timestamps travel with millisecond precision.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bytes(Vec<u8>),
    String(String),
    Timestamp(DateTime<Utc>),
    Symbol(Symbol),
    Uuid(Uuid),
    Array(Vec<Value>),
    Map(ValueMap),
    Struct(Struct),
}

impl Value {
    /// The primitive kind of this value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tbin::{Primitive, Value};
    ///
    /// assert_eq!(Value::Int32(1).kind(), Primitive::Int32);
    /// assert_eq!(Value::Array(vec![]).kind(), Primitive::Array);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> Primitive {
        match self {
            Value::Null => Primitive::Null,
            Value::Bool(_) => Primitive::Bool,
            Value::Int8(_) => Primitive::Int8,
            Value::Int16(_) => Primitive::Int16,
            Value::Int32(_) => Primitive::Int32,
            Value::Int64(_) => Primitive::Int64,
            Value::Float32(_) => Primitive::Float32,
            Value::Float64(_) => Primitive::Float64,
            Value::Bytes(_) => Primitive::Bytes,
            Value::String(_) => Primitive::String,
            Value::Timestamp(_) => Primitive::Timestamp,
            Value::Symbol(_) => Primitive::Symbol,
            Value::Uuid(_) => Primitive::Uuid,
            Value::Array(_) => Primitive::Array,
            Value::Map(_) => Primitive::Map,
            Value::Struct(_) => Primitive::Struct,
        }
    }

    /// The generic shape of this value: its primitive kind.
    #[must_use]
    pub const fn type_def(&self) -> TypeDef {
        TypeDef::Primitive(self.kind())
    }

    /// Builds a timestamp from milliseconds since the epoch.
    #[must_use]
    pub fn timestamp_millis(millis: i64) -> Value {
        match DateTime::from_timestamp_millis(millis) {
            Some(ts) => Value::Timestamp(ts),
            None => Value::Null,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` for any of the integer widths.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Int8(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Value::Float32(_) | Value::Float64(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_struct(&self) -> bool {
        matches!(self, Value::Struct(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns any integer width as an `i64`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tbin::Value;
    ///
    /// assert_eq!(Value::Int8(-3).as_i64(), Some(-3));
    /// assert_eq!(Value::Float64(3.0).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(n) => Some(i64::from(*n)),
            Value::Int16(n) => Some(i64::from(*n)),
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns floats, and integers converted to `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(f) => Some(f64::from(*f)),
            Value::Float64(f) => Some(*f),
            other => other.as_i64().map(|n| n as f64),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of a `String` or `Symbol`.
    #[inline]
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a timestamp, parsing RFC 3339 text if necessary.
    #[must_use]
    pub fn to_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Returns a UUID, parsing its text form if necessary.
    #[must_use]
    pub fn to_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(id) => Some(*id),
            Value::String(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int8(n) => write!(f, "{n}"),
            Value::Int16(n) => write!(f, "{n}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Float32(n) => write!(f, "{n}"),
            Value::Float64(n) => write!(f, "{n}"),
            Value::Bytes(b) => write!(f, "<{}>", crate::format::hex(b)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Symbol(s) => write!(f, ":{s}"),
            Value::Uuid(id) => write!(f, "{id}"),
            Value::Array(arr) => {
                f.write_str("[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}=>{v}")?;
                }
                f.write_str("}")
            }
            Value::Struct(s) => {
                f.write_str("{")?;
                for (i, (k, v)) in s.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int8(n) => serializer.serialize_i8(*n),
            Value::Int16(n) => serializer.serialize_i16(*n),
            Value::Int32(n) => serializer.serialize_i32(*n),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::Float32(n) => serializer.serialize_f32(*n),
            Value::Float64(n) => serializer.serialize_f64(*n),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            Value::Symbol(s) => serializer.serialize_str(s.as_str()),
            Value::Uuid(id) => serializer.serialize_str(&id.to_string()),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Struct(s) => {
                let mut out = serializer.serialize_map(Some(s.len()))?;
                for (k, v) in s {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid TBin value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i8<E>(self, value: i8) -> Result<Value, E> {
                Ok(Value::Int8(value))
            }

            fn visit_i16<E>(self, value: i16) -> Result<Value, E> {
                Ok(Value::Int16(value))
            }

            fn visit_i32<E>(self, value: i32) -> Result<Value, E> {
                Ok(Value::Int32(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::Int64(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                match i64::try_from(value) {
                    Ok(n) => Ok(Value::Int64(n)),
                    Err(_) => Ok(Value::Float64(value as f64)),
                }
            }

            fn visit_f32<E>(self, value: f32) -> Result<Value, E> {
                Ok(Value::Float32(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::Float64(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E> {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            // Objects whose keys are all strings become structs.
            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut entries: Vec<(Value, Value)> = Vec::new();
                while let Some((key, value)) = map.next_entry()? {
                    entries.push((key, value));
                }
                if entries.iter().all(|(k, _)| k.is_string()) {
                    let mut fields = Struct::with_capacity(entries.len());
                    for (k, v) in entries {
                        if let Value::String(name) = k {
                            fields.insert(name, v);
                        }
                    }
                    Ok(Value::Struct(fields))
                } else {
                    Ok(Value::Map(entries.into_iter().collect()))
                }
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::type_mismatch("integer", value.kind().signature()))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::type_mismatch("number", value.kind().signature()))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(crate::Error::type_mismatch("Bool", other.kind().signature())),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Symbol(s) => Ok(s.as_str().to_string()),
            other => Err(crate::Error::type_mismatch("String", other.kind().signature())),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(crate::Error::type_mismatch("Bytes", other.kind().signature())),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Int8(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

// Unsigned integers take the next wider signed width.
impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Int16(i16::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int32(i32::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int64(i64::from(value))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

impl From<Struct> for Value {
    fn from(value: Struct) -> Self {
        Value::Struct(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tryfrom_i64() {
        assert_eq!(i64::try_from(Value::Int8(-4)).unwrap(), -4);
        assert_eq!(i64::try_from(Value::Int64(i64::MAX)).unwrap(), i64::MAX);
        assert!(matches!(
            i64::try_from(Value::from("x")),
            Err(crate::Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_tryfrom_string_accepts_symbols() {
        assert_eq!(String::try_from(Value::from("a")).unwrap(), "a");
        assert_eq!(String::try_from(Value::Symbol(Symbol::new("b"))).unwrap(), "b");
        assert!(String::try_from(Value::Int32(1)).is_err());
    }

    #[test]
    fn test_from_primitives_keep_width() {
        assert_eq!(Value::from(1i8), Value::Int8(1));
        assert_eq!(Value::from(1i16), Value::Int16(1));
        assert_eq!(Value::from(1i32), Value::Int32(1));
        assert_eq!(Value::from(255u8), Value::Int16(255));
        assert_eq!(Value::from(u32::MAX), Value::Int64(i64::from(u32::MAX)));
        assert_eq!(Value::from(1.5f32), Value::Float32(1.5));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_ne!(Value::Int8(1), Value::Int32(1));
    }

    #[test]
    fn test_kind() {
        assert_eq!(Value::Null.kind(), Primitive::Null);
        assert_eq!(Value::from(Uuid::nil()).kind(), Primitive::Uuid);
        assert_eq!(Value::Struct(Struct::new()).type_def(), TypeDef::STRUCT);
    }

    #[test]
    fn test_textual_coercions() {
        let ts = Value::from("2024-01-02T03:04:05.678Z").to_timestamp().unwrap();
        assert_eq!(ts.timestamp_millis(), 1_704_164_645_678);
        assert!(Value::from("not a date").to_timestamp().is_none());

        let id = Value::from("67e55044-10b1-426f-9247-bb680e5fe0c8").to_uuid().unwrap();
        assert_eq!(Value::Uuid(id).to_uuid(), Some(id));
        assert!(Value::Int32(1).to_uuid().is_none());
    }

    #[test]
    fn test_timestamp_millis() {
        let value = Value::timestamp_millis(1_500);
        assert_eq!(value.to_timestamp().map(|t| t.timestamp_millis()), Some(1_500));
    }

    #[test]
    fn test_display() {
        let value = Value::Array(vec![Value::Int32(1), Value::from("a"), Value::Null]);
        assert_eq!(value.to_string(), "[1,\"a\",null]");
        assert_eq!(Value::Symbol(Symbol::new("ok")).to_string(), ":ok");
        assert_eq!(Value::Bytes(vec![1, 255]).to_string(), "<01 ff>");
    }
}

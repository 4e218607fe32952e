//! Conversion of [`Value`] into Rust data structures.
//!
//! [`ValueDeserializer`] lets any `Deserialize` type be read out of a decoded
//! [`Value`]. Typed decoding goes stream → `Value` → target, so this is where
//! wire values meet host field types: an incompatible pairing surfaces as
//! [`Error::TypeMismatch`], and an absent required field as
//! [`Error::MissingField`].
//!
//! Timestamps, UUIDs and symbols are offered to visitors as strings, which is
//! the form `chrono`, `uuid` and plain `String` fields deserialize from.
//!
//! ```rust
//! use serde::Deserialize;
//! use tbin::{from_value, tbin};
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let point: Point = from_value(tbin!({ "x": 1, "y": 2 })).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```

use crate::{Error, Result, Value};
use serde::de::{self, IntoDeserializer};
use serde::forward_to_deserialize_any;

/// Converts a [`Value`] into any `Deserialize` type.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: de::DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// Deserializer reading from an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> ValueDeserializer {
        ValueDeserializer::new(self)
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(entries: Vec<(Value, Value)>) -> Self {
        MapDeserializer {
            iter: entries.into_iter(),
            value: None,
        }
    }

    fn from_struct(fields: crate::Struct) -> Self {
        Self::new(
            fields
                .into_iter()
                .map(|(name, value)| (Value::String(name), value))
                .collect(),
        )
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            Some(other) => Err(Error::type_mismatch("unit variant", other.kind().signature())),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::type_mismatch("newtype variant", "unit variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(arr)) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Some(other) => Err(Error::type_mismatch("tuple variant", other.kind().signature())),
            None => Err(Error::type_mismatch("tuple variant", "unit variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Struct(fields)) => visitor.visit_map(MapDeserializer::from_struct(fields)),
            Some(other) => Err(Error::type_mismatch("struct variant", other.kind().signature())),
            None => Err(Error::type_mismatch("struct variant", "unit variant")),
        }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int8(n) => visitor.visit_i8(n),
            Value::Int16(n) => visitor.visit_i16(n),
            Value::Int32(n) => visitor.visit_i32(n),
            Value::Int64(n) => visitor.visit_i64(n),
            Value::Float32(n) => visitor.visit_f32(n),
            Value::Float64(n) => visitor.visit_f64(n),
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::String(s) => visitor.visit_string(s),
            Value::Timestamp(ts) => visitor.visit_string(ts.to_rfc3339()),
            Value::Symbol(s) => visitor.visit_str(s.as_str()),
            Value::Uuid(id) => visitor.visit_string(id.hyphenated().to_string()),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map.into_iter().collect())),
            Value::Struct(fields) => visitor.visit_map(MapDeserializer::from_struct(fields)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(ValueDeserializer::new(value)),
        }
    }

    // `Vec<u8>` fields ask for a sequence; hand them the bytes one by one.
    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Bytes(bytes) => visitor.visit_seq(SeqDeserializer::new(
                bytes.into_iter().map(Value::from).collect(),
            )),
            value => ValueDeserializer::new(value).deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Symbol(variant) => visitor.visit_enum(EnumDeserializer {
                variant: variant.as_str().to_string(),
                value: None,
            }),
            Value::Struct(fields) if fields.len() == 1 => {
                let mut iter = fields.into_iter();
                match iter.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(Error::type_mismatch("enum", "empty Struct")),
                }
            }
            other => Err(Error::type_mismatch("enum", other.kind().signature())),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple
        tuple_struct map struct identifier ignored_any
    }
}

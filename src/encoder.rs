//! TBin encoder.
//!
//! An [`Encoder`] owns one output stream. It writes the version tag when it is
//! created, then any number of top-level values. The stream's tag/type cache
//! and symbol table live as long as the encoder and only ever grow, so a field
//! name or struct shape is described once no matter how many values use it.
//!
//! ## Generic and typed encoding
//!
//! [`Encoder::encode`] writes a [`Value`] with its own tags: every struct
//! carries its field names (as stream symbols) and every element its tag.
//!
//! [`Encoder::encode_as`] writes a value under a declared [`TypeDef`]. The
//! shape is defined the first time it is used; afterwards only the payload is
//! written, with no field names and no per-element tags.
//!
//! ```rust
//! use tbin::{Decoder, Encoder, Field, TypeDef, Value, tbin};
//!
//! let point = TypeDef::struct_of(vec![
//!     Field::required("x", TypeDef::INT32),
//!     Field::required("y", TypeDef::INT32),
//! ]);
//!
//! let mut encoder = Encoder::new(Vec::new()).unwrap();
//! encoder.encode_as(&tbin!({"x": 1, "y": 2}), &point).unwrap();
//! encoder.encode_as(&tbin!({"x": 3, "y": 4}), &point).unwrap();
//! let bytes = encoder.into_inner();
//!
//! let values: Vec<Value> = Decoder::new(bytes.as_slice())
//!     .into_iter()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(values[1], tbin!({"x": 3, "y": 4}));
//! ```

use crate::cache::TypeCache;
use crate::format::*;
use crate::record::Record;
use crate::symbol::SymbolTable;
use crate::typedef::{Primitive, Shape, TypeDef};
use crate::varint;
use crate::{to_value, Error, Options, Result, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

/// Writes TBin values to a byte sink.
///
/// An encoder is not reentrant and should be dropped after it returns an
/// error: the stream may end in the middle of a value.
pub struct Encoder<W: Write> {
    writer: W,
    types: TypeCache,
    symbols: SymbolTable,
    options: Options,
    depth: usize,
}

impl<W: Write> Encoder<W> {
    /// Creates an encoder with default options and writes the version tag.
    pub fn new(writer: W) -> Result<Self> {
        Self::with_options(writer, Options::default())
    }

    pub fn with_options(mut writer: W, options: Options) -> Result<Self> {
        varint::write_u32(&mut writer, CURRENT_VERSION_TAG)?;
        log::debug!("opened TBin stream, version {CURRENT_VERSION}");
        Ok(Encoder {
            writer,
            types: TypeCache::new(),
            symbols: SymbolTable::new(),
            options,
            depth: 0,
        })
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(Error::Io)
    }

    /// Writes one top-level value with generic tags.
    pub fn encode(&mut self, value: &Value) -> Result<()> {
        self.depth = 0;
        self.write_value(value)
    }

    /// Writes one top-level value under `shape`, defining the shape first if
    /// this stream has not seen it.
    ///
    /// Fails with [`Error::UnencodableShape`] if the value does not fit.
    pub fn encode_as(&mut self, value: &Value, shape: &TypeDef) -> Result<()> {
        self.depth = 0;
        self.write_typed(value, shape)
    }

    /// Converts `value` through serde and writes it with generic tags.
    pub fn encode_serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let value = to_value(value)?;
        self.encode(&value)
    }

    /// Writes a [`Record`] under its declared shape.
    pub fn encode_record<T: Record>(&mut self, record: &T) -> Result<()> {
        let value = to_value(record)?;
        self.encode_as(&value, &T::type_def())
    }

    pub fn encode_null(&mut self) -> Result<()> {
        self.write_tag(NULL_TAG)
    }

    pub fn encode_bool(&mut self, v: bool) -> Result<()> {
        self.write_tag(BOOL_TAG)?;
        varint::write_u32(&mut self.writer, u32::from(v))
    }

    pub fn encode_i8(&mut self, v: i8) -> Result<()> {
        self.write_tag(INT8_TAG)?;
        varint::write_i32(&mut self.writer, i32::from(v))
    }

    pub fn encode_i16(&mut self, v: i16) -> Result<()> {
        self.write_tag(INT16_TAG)?;
        varint::write_i32(&mut self.writer, i32::from(v))
    }

    pub fn encode_i32(&mut self, v: i32) -> Result<()> {
        self.write_tag(INT32_TAG)?;
        varint::write_i32(&mut self.writer, v)
    }

    pub fn encode_i64(&mut self, v: i64) -> Result<()> {
        self.write_tag(INT64_TAG)?;
        varint::write_i64(&mut self.writer, v)
    }

    pub fn encode_f32(&mut self, v: f32) -> Result<()> {
        self.write_tag(FLOAT32_TAG)?;
        self.write_raw(&v.to_be_bytes())
    }

    pub fn encode_f64(&mut self, v: f64) -> Result<()> {
        self.write_tag(FLOAT64_TAG)?;
        self.write_raw(&v.to_be_bytes())
    }

    pub fn encode_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.write_tag(BYTES_TAG)?;
        self.write_blob(v)
    }

    /// Writes a string, using a tiny-string tag when it is at most 31 bytes.
    pub fn encode_str(&mut self, v: &str) -> Result<()> {
        let bytes = v.as_bytes();
        if bytes.len() <= TINY_STR_MAXLEN {
            self.write_tag(TINY_STR_TAG | bytes.len() as u32)?;
            self.write_raw(bytes)
        } else {
            self.write_tag(STRING_TAG)?;
            self.write_blob(bytes)
        }
    }

    pub fn encode_timestamp(&mut self, v: &DateTime<Utc>) -> Result<()> {
        self.write_tag(TIMESTAMP_TAG)?;
        self.write_timestamp(v)
    }

    pub fn encode_symbol(&mut self, name: &str) -> Result<()> {
        self.write_tag(SYMBOL_TAG)?;
        self.write_symbol(name)
    }

    pub fn encode_uuid(&mut self, v: &Uuid) -> Result<()> {
        self.write_tag(UUID_TAG)?;
        self.write_raw(v.as_bytes())
    }

    /// Starts a generic array; exactly `count` values must follow.
    pub fn begin_array(&mut self, count: usize) -> Result<()> {
        self.write_tag(ARRAY_TAG)?;
        self.write_len(count)
    }

    /// Starts a generic map; exactly `count` key/value pairs must follow.
    pub fn begin_map(&mut self, count: usize) -> Result<()> {
        self.write_tag(MAP_TAG)?;
        self.write_len(count)
    }

    /// Starts a generic struct; exactly `count` fields must follow, each an
    /// [`encode_field`](Self::encode_field) call and then a value.
    pub fn begin_struct(&mut self, count: usize) -> Result<()> {
        self.write_tag(STRUCT_TAG)?;
        self.write_len(count)
    }

    /// Writes a struct field name.
    pub fn encode_field(&mut self, name: &str) -> Result<()> {
        self.write_symbol(name)
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.encode_null(),
            Value::Bool(b) => self.encode_bool(*b),
            Value::Int8(n) => self.encode_i8(*n),
            Value::Int16(n) => self.encode_i16(*n),
            Value::Int32(n) => self.encode_i32(*n),
            Value::Int64(n) => self.encode_i64(*n),
            Value::Float32(n) => self.encode_f32(*n),
            Value::Float64(n) => self.encode_f64(*n),
            Value::Bytes(b) => self.encode_bytes(b),
            Value::String(s) => self.encode_str(s),
            Value::Timestamp(ts) => self.encode_timestamp(ts),
            Value::Symbol(s) => self.encode_symbol(s.as_str()),
            Value::Uuid(id) => self.encode_uuid(id),
            Value::Array(_) | Value::Map(_) | Value::Struct(_) => {
                self.write_tag(value.kind().tag())?;
                self.write_generic_body(value)
            }
        }
    }

    /// Count and tagged children of a generic container.
    fn write_generic_body(&mut self, value: &Value) -> Result<()> {
        self.enter()?;
        match value {
            Value::Array(items) => {
                self.write_len(items.len())?;
                for item in items {
                    self.write_value(item)?;
                }
            }
            Value::Map(map) => {
                self.write_len(map.len())?;
                for (k, v) in map {
                    self.write_value(k)?;
                    self.write_value(v)?;
                }
            }
            Value::Struct(fields) => {
                self.write_len(fields.len())?;
                for (name, v) in fields {
                    self.write_symbol(name)?;
                    self.write_value(v)?;
                }
            }
            other => return Err(mismatch(other, &other.type_def())),
        }
        self.leave();
        Ok(())
    }

    /// A tag followed by the payload of `value` under `shape`.
    fn write_typed(&mut self, value: &Value, shape: &TypeDef) -> Result<()> {
        match shape {
            TypeDef::Primitive(Primitive::Any) => self.write_value(value),
            TypeDef::Primitive(Primitive::String) => match value.as_name() {
                Some(text) => self.encode_str(text),
                None => Err(mismatch(value, shape)),
            },
            TypeDef::Primitive(kind) => {
                self.write_tag(kind.tag())?;
                self.write_payload(value, shape)
            }
            TypeDef::Composite(_) => {
                let tag = self.define(shape)?;
                self.write_tag(tag)?;
                self.write_payload(value, shape)
            }
        }
    }

    /// Interns `shape` and writes a definition block for every newly assigned tag.
    fn define(&mut self, shape: &TypeDef) -> Result<u32> {
        let mut assigned = Vec::new();
        let tag = self.types.intern(shape, &mut assigned);
        for (new_tag, def) in &assigned {
            self.write_definition(*new_tag, def)?;
        }
        Ok(tag)
    }

    fn write_definition(&mut self, tag: u32, def: &TypeDef) -> Result<()> {
        let shape = def
            .shape()
            .ok_or_else(|| Error::unencodable(format!("{def} has a fixed tag")))?;
        self.write_tag(tag)?;
        match shape {
            Shape::Array(items) => {
                self.write_tag(DEF_ARRAY_TAG)?;
                self.write_child_tag(items)
            }
            Shape::Map(keys, items) => {
                self.write_tag(DEF_MAP_TAG)?;
                self.write_child_tag(keys)?;
                self.write_child_tag(items)
            }
            Shape::Struct(fields) => {
                self.write_tag(DEF_STRUCT_TAG)?;
                self.write_len(fields.len())?;
                for field in fields {
                    self.write_blob(field.name.as_bytes())?;
                    if field.optional {
                        self.write_tag(ANY_TAG)?;
                    } else {
                        self.write_child_tag(&field.shape)?;
                    }
                }
                Ok(())
            }
            Shape::Union(variants) => {
                self.write_tag(DEF_UNION_TAG)?;
                self.write_len(variants.len())?;
                for variant in variants {
                    self.write_child_tag(variant)?;
                }
                Ok(())
            }
            Shape::Enum(symbols) => {
                self.write_tag(DEF_ENUM_TAG)?;
                self.write_len(symbols.len())?;
                for symbol in symbols {
                    self.write_blob(symbol.as_bytes())?;
                }
                Ok(())
            }
        }
    }

    fn write_child_tag(&mut self, child: &TypeDef) -> Result<()> {
        let tag = self
            .types
            .tag_of(child)
            .ok_or_else(|| Error::unencodable(format!("{child} used before it was defined")))?;
        self.write_tag(tag)
    }

    /// The untagged payload of `value` under `shape`.
    fn write_payload(&mut self, value: &Value, shape: &TypeDef) -> Result<()> {
        let composite = match shape {
            TypeDef::Primitive(kind) => return self.write_primitive_payload(value, *kind),
            TypeDef::Composite(c) => c.shape(),
        };
        match (composite, value) {
            (Shape::Array(items), Value::Array(values)) => {
                self.enter()?;
                self.write_len(values.len())?;
                for v in values {
                    self.write_payload(v, items)?;
                }
                self.leave();
            }
            (Shape::Map(keys, items), Value::Map(map)) => {
                self.enter()?;
                self.write_len(map.len())?;
                for (k, v) in map {
                    self.write_payload(k, keys)?;
                    self.write_payload(v, items)?;
                }
                self.leave();
            }
            (Shape::Struct(fields), Value::Struct(present)) => {
                if let Some(extra) = present
                    .keys()
                    .find(|name| !fields.iter().any(|f| f.name == **name))
                {
                    return Err(Error::unencodable(format!(
                        "field `{extra}` is not part of {shape}"
                    )));
                }
                self.enter()?;
                for field in fields {
                    match present.get(&field.name) {
                        Some(v) if !field.optional => self.write_payload(v, &field.shape)?,
                        None if !field.optional => {
                            return Err(Error::unencodable(format!(
                                "missing required field `{}` for {shape}",
                                field.name
                            )))
                        }
                        Some(Value::Null) | None => self.write_tag(NULL_TAG)?,
                        Some(v) => self.write_typed(v, &field.shape)?,
                    }
                }
                self.leave();
            }
            (Shape::Enum(symbols), v) => {
                let index = v
                    .as_name()
                    .and_then(|name| symbols.iter().position(|s| s == name))
                    .ok_or_else(|| mismatch(v, shape))?;
                self.write_len(index + 1)?;
            }
            (Shape::Union(variants), v) => {
                let (index, variant) = variants
                    .iter()
                    .enumerate()
                    .find(|(_, variant)| variant.accepts(v))
                    .ok_or_else(|| mismatch(v, shape))?;
                self.enter()?;
                self.write_len(index + 1)?;
                self.write_payload(v, variant)?;
                self.leave();
            }
            (_, v) => return Err(mismatch(v, shape)),
        }
        Ok(())
    }

    fn write_primitive_payload(&mut self, value: &Value, kind: Primitive) -> Result<()> {
        if !TypeDef::Primitive(kind).accepts(value) {
            return Err(mismatch(value, &TypeDef::Primitive(kind)));
        }
        match kind {
            Primitive::Null => Ok(()),
            Primitive::Bool => {
                let b = value.as_bool().unwrap_or_default();
                varint::write_u32(&mut self.writer, u32::from(b))
            }
            Primitive::Int8 | Primitive::Int16 | Primitive::Int32 | Primitive::Int64 => {
                // Zigzag of an in-range value is the same at every width.
                let n = value.as_i64().unwrap_or_default();
                varint::write_i64(&mut self.writer, n)
            }
            Primitive::Float32 => match value {
                Value::Float32(f) => self.write_raw(&f.to_be_bytes()),
                other => Err(mismatch(other, &TypeDef::FLOAT32)),
            },
            Primitive::Float64 => {
                let f = value.as_f64().unwrap_or_default();
                self.write_raw(&f.to_be_bytes())
            }
            Primitive::Bytes => self.write_blob(value.as_bytes().unwrap_or_default()),
            Primitive::String => self.write_blob(value.as_name().unwrap_or_default().as_bytes()),
            Primitive::Symbol => self.write_symbol(value.as_name().unwrap_or_default()),
            Primitive::Timestamp => match value.to_timestamp() {
                Some(ts) => self.write_timestamp(&ts),
                None => Err(mismatch(value, &TypeDef::TIMESTAMP)),
            },
            Primitive::Uuid => match value.to_uuid() {
                Some(id) => self.write_raw(id.as_bytes()),
                None => Err(mismatch(value, &TypeDef::UUID)),
            },
            Primitive::Array | Primitive::Map | Primitive::Struct => {
                self.write_generic_body(value)
            }
            Primitive::Any => self.write_value(value),
        }
    }

    fn write_symbol(&mut self, name: &str) -> Result<()> {
        let (id, is_new) = self.symbols.intern_name(name);
        varint::write_u32(&mut self.writer, id)?;
        if is_new {
            self.write_blob(name.as_bytes())?;
        }
        Ok(())
    }

    fn write_timestamp(&mut self, ts: &DateTime<Utc>) -> Result<()> {
        let seconds = ts.timestamp_millis() as f64 / 1000.0;
        self.write_raw(&seconds.to_be_bytes())
    }

    #[inline]
    fn write_tag(&mut self, tag: u32) -> Result<()> {
        varint::write_u32(&mut self.writer, tag)
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| Error::unencodable(format!("length {len} does not fit in a varint")))?;
        varint::write_u32(&mut self.writer, len)
    }

    fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_len(bytes.len())?;
        self.write_raw(bytes)
    }

    #[inline]
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).map_err(Error::Io)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(Error::LimitExceeded {
                what: "nesting depth",
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

fn mismatch(value: &Value, shape: &TypeDef) -> Error {
    Error::unencodable(format!("{} value does not fit {shape}", value.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedef::Field;
    use crate::{tbin, Symbol};

    fn encode_one(value: &Value) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        encoder.encode(value).unwrap();
        encoder.into_inner()
    }

    #[test]
    fn test_version_tag_written_on_creation() {
        let encoder = Encoder::new(Vec::new()).unwrap();
        assert_eq!(encoder.get_ref(), &vec![0x18]);
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode_one(&Value::Null), vec![0x18, 0x00]);
        assert_eq!(encode_one(&Value::Bool(true)), vec![0x18, 0x01, 0x01]);
        assert_eq!(encode_one(&Value::Int32(-1)), vec![0x18, 0x04, 0x01]);
        assert_eq!(encode_one(&Value::Int64(300)), vec![0x18, 0x05, 0xd8, 0x04]);
        assert_eq!(
            encode_one(&Value::Float32(1.0)),
            vec![0x18, 0x06, 0x3f, 0x80, 0x00, 0x00]
        );
        assert_eq!(encode_one(&Value::from("hi")), vec![0x18, 0x22, b'h', b'i']);
        assert_eq!(
            encode_one(&Value::Bytes(vec![9, 8])),
            vec![0x18, 0x08, 0x02, 9, 8]
        );
    }

    #[test]
    fn test_generic_struct_dedups_field_names() {
        let bytes = encode_one(&tbin!([{"a": 1}, {"a": 2}]));
        assert_eq!(
            bytes,
            vec![0x18, 0x0d, 0x02, 0x0f, 0x01, 0x00, 0x01, b'a', 0x04, 0x02, 0x0f, 0x01, 0x00, 0x04, 0x04]
        );
    }

    #[test]
    fn test_symbols_share_the_stream_table() {
        let value = Value::Array(vec![
            Value::Symbol(Symbol::new("on")),
            Value::Symbol(Symbol::new("on")),
        ]);
        assert_eq!(
            encode_one(&value),
            vec![0x18, 0x0d, 0x02, 0x0b, 0x00, 0x02, b'o', b'n', 0x0b, 0x00]
        );
    }

    #[test]
    fn test_typed_struct_definition() {
        let point = TypeDef::struct_of(vec![
            Field::required("x", TypeDef::INT32),
            Field::required("y", TypeDef::INT32),
        ]);
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        encoder.encode_as(&tbin!({"x": 1, "y": 11}), &point).unwrap();
        encoder.encode_as(&tbin!({"x": 2, "y": 3}), &point).unwrap();
        assert_eq!(
            encoder.into_inner(),
            vec![
                0x18, // version
                0x40, 0x13, 0x02, 0x01, b'x', 0x04, 0x01, b'y', 0x04, // definition
                0x40, 0x02, 0x16, // {x: 1, y: 11}
                0x40, 0x04, 0x06, // {x: 2, y: 3}
            ]
        );
    }

    #[test]
    fn test_optional_fields() {
        let shape = TypeDef::struct_of(vec![
            Field::required("id", TypeDef::INT8),
            Field::optional("note", TypeDef::STRING),
        ]);
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        encoder.encode_as(&tbin!({"id": 1}), &shape).unwrap();
        encoder.encode_as(&tbin!({"id": 2, "note": "n"}), &shape).unwrap();
        assert_eq!(
            encoder.into_inner(),
            vec![
                0x18, 0x40, 0x13, 0x02, 0x02, b'i', b'd', 0x02, 0x04, b'n', b'o', b't', b'e',
                0x10, // definition
                0x40, 0x02, 0x00, // {id: 1}
                0x40, 0x04, 0x21, b'n', // {id: 2, note: "n"}
            ]
        );
    }

    #[test]
    fn test_enum_and_union_payloads() {
        let color = TypeDef::enum_of(["red", "green"]);
        let id = TypeDef::union_of(vec![TypeDef::INT64, TypeDef::STRING]);
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        encoder.encode_as(&Value::from("green"), &color).unwrap();
        encoder.encode_as(&Value::from("abc"), &id).unwrap();
        assert_eq!(
            encoder.into_inner(),
            vec![
                0x18, 0x40, 0x15, 0x02, 0x03, b'r', b'e', b'd', 0x05, b'g', b'r', b'e', b'e',
                b'n', 0x40, 0x02, // green
                0x41, 0x14, 0x02, 0x05, 0x09, 0x41, 0x02, 0x03, b'a', b'b', b'c', // "abc"
            ]
        );
    }

    #[test]
    fn test_value_outside_shape_is_unencodable() {
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        assert!(matches!(
            encoder.encode_as(&Value::Int32(1000), &TypeDef::INT8),
            Err(Error::UnencodableShape(_))
        ));

        let point = TypeDef::struct_of(vec![Field::required("x", TypeDef::INT32)]);
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        assert!(matches!(
            encoder.encode_as(&tbin!({"x": 1, "z": 2}), &point),
            Err(Error::UnencodableShape(_))
        ));
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        assert!(matches!(
            encoder.encode_as(&tbin!({}), &point),
            Err(Error::UnencodableShape(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::Null;
        for _ in 0..5 {
            value = Value::Array(vec![value]);
        }
        let options = Options::new().with_max_depth(4);
        let mut encoder = Encoder::with_options(Vec::new(), options).unwrap();
        assert!(matches!(
            encoder.encode(&value),
            Err(Error::LimitExceeded { limit: 4, .. })
        ));
    }

    #[test]
    fn test_streaming_calls() {
        let mut encoder = Encoder::new(Vec::new()).unwrap();
        encoder.begin_struct(1).unwrap();
        encoder.encode_field("k").unwrap();
        encoder.encode_i8(-1).unwrap();
        assert_eq!(
            encoder.into_inner(),
            encode_one(&tbin!({"k": (-1i8)}))
        );
    }
}

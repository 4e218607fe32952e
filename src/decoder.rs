//! TBin decoder.
//!
//! A [`Decoder`] reads one stream. The first tag must be a version tag; after
//! that the stream holds any number of top-level values, each introduced by a
//! tag. Type definitions and symbol names are embedded inline the first time
//! the encoder used them, and the decoder rebuilds its own tag/type cache and
//! symbol table from them as it goes.
//!
//! ## States
//!
//! ```text
//! AwaitingVersion --version tag--> Reading --value--> Reading ...
//! ```
//!
//! A non-version first tag is [`Error::MissingVersion`]; a version above the
//! supported one is [`Error::UnsupportedVersion`].
//!
//! ## Examples
//!
//! ```rust
//! use tbin::{encode, Decoder, Value};
//!
//! let bytes = encode(&Value::from("hello")).unwrap();
//! let mut decoder = Decoder::new(bytes.as_slice());
//! assert_eq!(decoder.decode().unwrap(), Value::from("hello"));
//! assert_eq!(decoder.version(), Some(1));
//! ```

use crate::cache::TypeCache;
use crate::format::*;
use crate::record::{check_required, Record};
use crate::symbol::{Symbol, SymbolTable};
use crate::typedef::{Field, Primitive, Shape, TypeDef};
use crate::varint;
use crate::{from_value, Error, Options, Result, Struct, Value, ValueMap};
use chrono::DateTime;
use serde::de::DeserializeOwned;
use std::io::{self, Read};
use uuid::Uuid;

/// Upper bound on up-front allocation for a container, whatever its count says.
const PREALLOC_LIMIT: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    AwaitingVersion,
    Reading,
}

/// Reads TBin values from a byte source.
///
/// Like the encoder, a decoder is not reentrant and should be dropped after
/// it returns an error.
pub struct Decoder<R: Read> {
    reader: R,
    types: TypeCache,
    symbols: SymbolTable,
    options: Options,
    state: State,
    version: Option<u32>,
    depth: usize,
}

impl<R: Read> Decoder<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, Options::default())
    }

    #[must_use]
    pub fn with_options(reader: R, options: Options) -> Self {
        Decoder {
            reader,
            types: TypeCache::new(),
            symbols: SymbolTable::new(),
            options,
            state: State::AwaitingVersion,
            version: None,
            depth: 0,
        }
    }

    /// The stream version, once the version tag has been read.
    #[must_use]
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads the next top-level value.
    ///
    /// Running out of input, including before the first value, is
    /// [`Error::UnexpectedEndOfStream`].
    pub fn decode(&mut self) -> Result<Value> {
        self.decode_next()?.ok_or(Error::UnexpectedEndOfStream)
    }

    /// Reads the next top-level value, or `None` if the stream ends cleanly
    /// before it.
    pub fn decode_next(&mut self) -> Result<Option<Value>> {
        let mut tag = match self.read_leading_tag()? {
            Some(tag) => tag,
            None => return Ok(None),
        };
        if self.state == State::AwaitingVersion {
            self.accept_version(tag)?;
            tag = match self.read_leading_tag()? {
                Some(tag) => tag,
                None => return Ok(None),
            };
        }
        self.depth = 0;
        let tag = self.resolve_tag(tag)?;
        self.read_tagged(tag).map(Some)
    }

    /// Reads the next value and deserializes it into `T`.
    pub fn decode_into<T: DeserializeOwned>(&mut self) -> Result<T> {
        from_value(self.decode()?)
    }

    /// Reads the next value as a [`Record`].
    ///
    /// Every required field of `T` must be present in the decoded value
    /// ([`Error::MissingField`]); field values must fit their Rust types
    /// ([`Error::TypeMismatch`]).
    pub fn decode_record<T: Record>(&mut self) -> Result<T> {
        let mut value = self.decode()?;
        check_required(T::FIELDS, &mut value)?;
        from_value(value)
    }

    fn accept_version(&mut self, tag: u32) -> Result<()> {
        let version = version_of(tag).ok_or(Error::MissingVersion(tag))?;
        if version > CURRENT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        log::debug!("reading TBin stream, version {version}");
        self.version = Some(version);
        self.state = State::Reading;
        Ok(())
    }

    /// Reads a tag at a value boundary, where end of input is not an error.
    fn read_leading_tag(&mut self) -> Result<Option<u32>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return varint::read_u32_after(&mut self.reader, byte[0]).map(Some),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Reads a value tag, consuming any definitions that precede it.
    fn next_tag(&mut self) -> Result<u32> {
        let tag = varint::read_u32(&mut self.reader)?;
        self.resolve_tag(tag)
    }

    /// An undefined user tag is a definition marker; the value tag follows it.
    fn resolve_tag(&mut self, mut tag: u32) -> Result<u32> {
        while is_user_tag(tag) && !self.types.is_defined(tag) {
            self.read_definition(tag)?;
            tag = varint::read_u32(&mut self.reader)?;
        }
        Ok(tag)
    }

    fn read_definition(&mut self, tag: u32) -> Result<()> {
        if tag != self.types.next_tag() {
            return Err(Error::UndefinedTypeTag(tag));
        }
        let kind = varint::read_u32(&mut self.reader)?;
        let shape = match kind {
            DEF_ARRAY_TAG => {
                let items = self.read_child_shape()?;
                TypeDef::array_of(items)
            }
            DEF_MAP_TAG => {
                let keys = self.read_child_shape()?;
                let items = self.read_child_shape()?;
                TypeDef::map_of(keys, items)
            }
            DEF_STRUCT_TAG => {
                let count = self.read_count()?;
                let mut fields = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let name = self.read_string()?;
                    let shape = self.read_child_shape()?;
                    // Optional fields are declared as Any.
                    fields.push(if shape.is_any() {
                        Field::optional(name, shape)
                    } else {
                        Field::required(name, shape)
                    });
                }
                TypeDef::struct_of(fields)
            }
            DEF_UNION_TAG => {
                let count = self.read_count()?;
                let mut variants = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    variants.push(self.read_child_shape()?);
                }
                TypeDef::union_of(variants)
            }
            DEF_ENUM_TAG => {
                let count = self.read_count()?;
                let mut symbols = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    symbols.push(self.read_string()?);
                }
                TypeDef::enum_of(symbols)
            }
            other => return Err(Error::UnknownTag(other)),
        };
        self.types.define(tag, shape)
    }

    fn read_child_shape(&mut self) -> Result<TypeDef> {
        let tag = varint::read_u32(&mut self.reader)?;
        if let Some(kind) = Primitive::from_tag(tag) {
            return Ok(TypeDef::Primitive(kind));
        }
        if is_user_tag(tag) {
            return self.types.lookup(tag).cloned();
        }
        Err(Error::UnknownTag(tag))
    }

    /// A complete tagged value: definitions, tag and payload.
    fn read_any(&mut self) -> Result<Value> {
        let tag = self.next_tag()?;
        self.read_tagged(tag)
    }

    /// The payload following a resolved value tag.
    fn read_tagged(&mut self, tag: u32) -> Result<Value> {
        if let Some(len) = tiny_len_of(tag) {
            return self.read_str_body(len).map(Value::String);
        }
        if is_user_tag(tag) {
            let shape = self.types.lookup(tag)?.clone();
            return self.read_payload(&shape);
        }
        match Primitive::from_tag(tag) {
            Some(Primitive::Any) | None => Err(Error::UnknownTag(tag)),
            Some(kind) => self.read_primitive_payload(kind),
        }
    }

    /// Reads a value written under `shape`.
    ///
    /// Union variants are resolved to their shape before their payload is
    /// read, so a struct variant with a field list is read positionally just
    /// like a top-level struct of that shape.
    fn read_payload(&mut self, shape: &TypeDef) -> Result<Value> {
        let composite = match shape {
            TypeDef::Primitive(kind) => return self.read_primitive_payload(*kind),
            TypeDef::Composite(c) => c.shape(),
        };
        let value = match composite {
            Shape::Enum(symbols) => {
                let index = self.read_index(symbols.len(), shape)?;
                return Ok(Value::String(symbols[index].clone()));
            }
            Shape::Array(items) => {
                self.enter()?;
                let count = self.read_count()?;
                let mut values = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    values.push(self.read_payload(items)?);
                }
                Value::Array(values)
            }
            Shape::Map(keys, items) => {
                self.enter()?;
                let count = self.read_count()?;
                let mut map = ValueMap::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let k = self.read_payload(keys)?;
                    let v = self.read_payload(items)?;
                    map.push(k, v);
                }
                Value::Map(map)
            }
            Shape::Struct(fields) => {
                self.enter()?;
                let mut out = Struct::with_capacity(fields.len());
                for field in fields {
                    if field.optional {
                        let v = self.read_any()?;
                        if !v.is_null() {
                            out.insert(field.name.as_str(), v);
                        }
                    } else {
                        let v = self.read_payload(&field.shape)?;
                        out.insert(field.name.as_str(), v);
                    }
                }
                Value::Struct(out)
            }
            Shape::Union(variants) => {
                self.enter()?;
                let index = self.read_index(variants.len(), shape)?;
                self.read_payload(&variants[index])?
            }
        };
        self.leave();
        Ok(value)
    }

    /// Reads a 1-based index into a list of `len` entries.
    fn read_index(&mut self, len: usize, shape: &TypeDef) -> Result<usize> {
        let index = varint::read_u32(&mut self.reader)? as usize;
        if index == 0 || index > len {
            return Err(Error::type_mismatch(
                shape.signature(),
                &format!("index {index}"),
            ));
        }
        Ok(index - 1)
    }

    fn read_primitive_payload(&mut self, kind: Primitive) -> Result<Value> {
        Ok(match kind {
            Primitive::Null => Value::Null,
            Primitive::Bool => match varint::read_u32(&mut self.reader)? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                n => return Err(Error::type_mismatch("Bool", &format!("varint {n}"))),
            },
            Primitive::Int8 => {
                let n = varint::read_i32(&mut self.reader)?;
                Value::Int8(narrow(n, kind)?)
            }
            Primitive::Int16 => {
                let n = varint::read_i32(&mut self.reader)?;
                Value::Int16(narrow(n, kind)?)
            }
            Primitive::Int32 => Value::Int32(varint::read_i32(&mut self.reader)?),
            Primitive::Int64 => Value::Int64(varint::read_i64(&mut self.reader)?),
            Primitive::Float32 => {
                let mut buf = [0u8; 4];
                self.reader.read_exact(&mut buf)?;
                Value::Float32(f32::from_be_bytes(buf))
            }
            Primitive::Float64 => Value::Float64(self.read_f64()?),
            Primitive::Bytes => {
                let len = self.read_length()?;
                Value::Bytes(self.read_bytes(len)?)
            }
            Primitive::String => Value::String(self.read_string()?),
            Primitive::Timestamp => {
                let seconds = self.read_f64()?;
                let millis = (seconds * 1000.0).round();
                DateTime::from_timestamp_millis(millis as i64)
                    .filter(|_| millis.is_finite())
                    .map(Value::Timestamp)
                    .ok_or_else(|| {
                        Error::type_mismatch("Timestamp", &format!("{seconds} seconds"))
                    })?
            }
            Primitive::Symbol => Value::Symbol(self.read_symbol()?),
            Primitive::Uuid => {
                let mut buf = [0u8; 16];
                self.reader.read_exact(&mut buf)?;
                Value::Uuid(Uuid::from_bytes(buf))
            }
            Primitive::Array => {
                self.enter()?;
                let count = self.read_count()?;
                let mut values = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    values.push(self.read_any()?);
                }
                self.leave();
                Value::Array(values)
            }
            Primitive::Map => {
                self.enter()?;
                let count = self.read_count()?;
                let mut map = ValueMap::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let k = self.read_any()?;
                    let v = self.read_any()?;
                    map.push(k, v);
                }
                self.leave();
                Value::Map(map)
            }
            Primitive::Struct => {
                self.enter()?;
                let count = self.read_count()?;
                let mut fields = Struct::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let name = self.read_symbol()?;
                    let v = self.read_any()?;
                    fields.insert(name.as_str(), v);
                }
                self.leave();
                Value::Struct(fields)
            }
            Primitive::Any => self.read_any()?,
        })
    }

    fn read_symbol(&mut self) -> Result<Symbol> {
        let id = varint::read_u32(&mut self.reader)?;
        if let Some(symbol) = self.symbols.get(id) {
            return Ok(symbol.clone());
        }
        if id as usize != self.symbols.len() {
            return Err(Error::UndefinedSymbol(id));
        }
        let name = self.read_string()?;
        self.symbols.define_name(id, &name)
    }

    fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.reader.read_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_length()?;
        self.read_str_body(len)
    }

    fn read_str_body(&mut self, len: usize) -> Result<String> {
        String::from_utf8(self.read_bytes(len)?).map_err(|_| Error::InvalidUtf8)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_length(&mut self) -> Result<usize> {
        self.read_limited("byte length")
    }

    fn read_count(&mut self) -> Result<usize> {
        self.read_limited("element count")
    }

    fn read_limited(&mut self, what: &'static str) -> Result<usize> {
        let n = varint::read_u32(&mut self.reader)? as usize;
        if n > self.options.max_len {
            return Err(Error::LimitExceeded {
                what,
                limit: self.options.max_len,
            });
        }
        Ok(n)
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

fn narrow<T: TryFrom<i32>>(n: i32, kind: Primitive) -> Result<T> {
    T::try_from(n).map_err(|_| Error::type_mismatch(kind.signature(), &format!("integer {n}")))
}

/// Iterator over the remaining top-level values of a stream.
///
/// Stops after the first error.
pub struct DecodeIter<R: Read> {
    decoder: Decoder<R>,
    failed: bool,
}

impl<R: Read> DecodeIter<R> {
    pub fn into_decoder(self) -> Decoder<R> {
        self.decoder
    }
}

impl<R: Read> Iterator for DecodeIter<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.decoder.decode_next() {
            Ok(value) => value.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> IntoIterator for Decoder<R> {
    type Item = Result<Value>;
    type IntoIter = DecodeIter<R>;

    fn into_iter(self) -> DecodeIter<R> {
        DecodeIter {
            decoder: self,
            failed: false,
        }
    }
}

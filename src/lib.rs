//! # serde_tbin
//!
//! A compact, self-describing binary format with stream-local type and symbol
//! caching, plus Serde integration.
//!
//! ## What is TBin?
//!
//! TBin writes every value behind a varint tag. Small tags name primitive kinds;
//! tags from `0x40` upward are assigned by the stream itself the first time a
//! composite shape (a struct layout, a typed array, an enum, ...) is used. The
//! shape is described once, inline, and every later value of that shape carries
//! only its payload. Struct field names get the same treatment through a
//! per-stream symbol table, so a long run of similar records costs little more
//! than their raw field data.
//!
//! ## Key Features
//!
//! - **Self-describing**: a reader needs no schema; definitions travel in-band
//! - **Shape caching**: a repeated shape is described once per stream
//! - **Typed payloads**: declared shapes drop per-field tags entirely
//! - **Serde Compatible**: works with `#[derive(Serialize, Deserialize)]` types
//! - **Streaming**: an [`Encoder`] and a [`Decoder`] handle any number of
//!   top-level values over one `Write` / `Read`
//! - **No Unsafe Code**
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serde_tbin = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Basic Serialization and Deserialization
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use tbin::{from_slice, to_bytes};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//!
//! let bytes = to_bytes(&user).unwrap();
//! assert_eq!(bytes[0], 0x18); // version tag
//!
//! let user_back: User = from_slice(&bytes).unwrap();
//! assert_eq!(user, user_back);
//! ```
//!
//! ### Declared Shapes
//!
//! ```rust
//! use tbin::{tbin, Encoder, Decoder, Field, TypeDef};
//!
//! let point = TypeDef::struct_of(vec![
//!     Field::required("x", TypeDef::INT32),
//!     Field::required("y", TypeDef::INT32),
//! ]);
//!
//! let mut encoder = Encoder::new(Vec::new()).unwrap();
//! encoder.encode_as(&tbin!({"x": 1, "y": 11}), &point).unwrap();
//! encoder.encode_as(&tbin!({"x": 2, "y": 3}), &point).unwrap();
//! let bytes = encoder.into_inner();
//!
//! // The second point costs a tag and two varints.
//! assert_eq!(&bytes[bytes.len() - 3..], &[0x40, 0x04, 0x06]);
//!
//! let mut decoder = Decoder::new(bytes.as_slice());
//! assert_eq!(decoder.decode().unwrap(), tbin!({"x": 1, "y": 11}));
//! assert_eq!(decoder.decode().unwrap(), tbin!({"x": 2, "y": 3}));
//! ```
//!
//! ## Streams
//!
//! Every stream starts with a version tag and the caches it builds are scoped
//! to that stream. A byte string produced by [`to_bytes`] or [`encode`] is a
//! complete stream holding one value; an [`Encoder`] appends further values to
//! the same stream and a [`Decoder`] reads them back in order.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade: the stream
//! version at `debug`, and type-tag and symbol assignment at `trace`.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - serde round trip
//! - **`dynamic_values.rs`** - building and inspecting [`Value`]s
//! - **`typed_records.rs`** - declaring shapes with [`Record`]
//! - **`shape_caching.rs`** - what repeated shapes cost on the wire
//!
//! Run any example with: `cargo run --example <name>`

pub mod cache;
pub mod de;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod options;
pub mod record;
pub mod ser;
pub mod symbol;
pub mod typedef;
pub mod value;
pub mod varint;

pub use de::{from_value, ValueDeserializer};
pub use decoder::{DecodeIter, Decoder};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use map::{Struct, ValueMap};
pub use options::Options;
pub use record::{FieldDescriptor, FieldKind, Record};
pub use ser::{to_value, ValueSerializer};
pub use symbol::{Symbol, SymbolTable};
pub use typedef::{Field, Primitive, Shape, TypeDef};
pub use value::Value;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Encode a [`Value`] as a complete single-value stream.
///
/// Unlike [`to_bytes`], this writes the value exactly as it is, keeping
/// timestamps, symbols and UUIDs under their own tags.
///
/// # Examples
///
/// ```rust
/// use tbin::{encode, Value};
///
/// assert_eq!(encode(&Value::Int32(1)).unwrap(), vec![0x18, 0x04, 0x02]);
/// ```
///
/// # Errors
///
/// Returns an error if a length does not fit the wire format or a limit is exceeded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new())?;
    encoder.encode(value)?;
    Ok(encoder.into_inner())
}

/// Encode a [`Value`] under a declared shape as a complete single-value stream.
///
/// # Errors
///
/// Returns [`Error::UnencodableShape`] if the value does not fit `shape`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_as(value: &Value, shape: &TypeDef) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new())?;
    encoder.encode_as(value, shape)?;
    Ok(encoder.into_inner())
}

/// Decode the first value of a stream into a [`Value`], without going through serde.
///
/// # Examples
///
/// ```rust
/// use tbin::{decode, encode, Symbol, Value};
///
/// let value = Value::Symbol(Symbol::new("ready"));
/// assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not a valid TBin stream.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Decoder::new(bytes).decode()
}

/// Serialize any `T: Serialize` to a TBin stream.
///
/// # Examples
///
/// ```rust
/// use tbin::to_bytes;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let bytes = to_bytes(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(bytes[1], 0x0f); // generic struct tag
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be represented (for example a `u64`
/// above `i64::MAX`).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    to_bytes_with_options(value, Options::default())
}

/// Serialize any `T: Serialize` to a TBin stream with custom limits.
///
/// # Errors
///
/// Returns an error if the value cannot be represented or exceeds a limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bytes_with_options<T>(value: &T, options: Options) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut encoder = Encoder::with_options(Vec::new(), options)?;
    encoder.encode_serialize(value)?;
    Ok(encoder.into_inner())
}

/// Serialize a [`Record`] to a TBin stream under its declared shape.
///
/// # Errors
///
/// Returns [`Error::UnencodableShape`] if the serialized record does not match
/// its field table.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bytes_record<T: Record>(record: &T) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new())?;
    encoder.encode_record(record)?;
    Ok(encoder.into_inner())
}

/// Serialize any `T: Serialize` to a writer as a TBin stream.
///
/// # Examples
///
/// ```rust
/// use tbin::to_writer;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &vec!["a", "b"]).unwrap();
/// assert_eq!(buffer, vec![0x18, 0x0d, 0x02, 0x21, b'a', 0x21, b'b']);
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let mut encoder = Encoder::new(writer)?;
    encoder.encode_serialize(value)?;
    encoder.flush()
}

/// Deserialize an instance of type `T` from the first value of a TBin stream.
///
/// # Examples
///
/// ```rust
/// use tbin::{from_slice, to_bytes};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let bytes = to_bytes(&Point { x: 1, y: 2 }).unwrap();
/// let point: Point = from_slice(&bytes).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not a valid TBin stream or the value
/// cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice_with_options(bytes, Options::default())
}

/// Deserialize an instance of type `T` from a TBin stream with custom limits.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid TBin stream, a limit is
/// exceeded, or the value cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_with_options<T>(bytes: &[u8], options: Options) -> Result<T>
where
    T: DeserializeOwned,
{
    Decoder::with_options(bytes, options).decode_into()
}

/// Deserialize a [`Record`] from the first value of a TBin stream.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if a required field is absent and
/// [`Error::TypeMismatch`] if a field value does not fit its Rust type.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_record<T: Record>(bytes: &[u8]) -> Result<T> {
    Decoder::new(bytes).decode_record()
}

/// Deserialize an instance of type `T` from the first value of an I/O stream.
///
/// # Examples
///
/// ```rust
/// use tbin::from_reader;
/// use std::io::Cursor;
///
/// let numbers: Vec<i32> = from_reader(Cursor::new([0x18, 0x0d, 0x02, 0x04, 0x02, 0x04, 0x04])).unwrap();
/// assert_eq!(numbers, vec![1, 2]);
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, the input is not valid TBin, or the
/// value cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    Decoder::new(reader).decode_into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
    }

    #[test]
    fn test_serialize_deserialize_point() {
        let point = Point { x: 1, y: 2 };
        let bytes = to_bytes(&point).unwrap();
        let point_back: Point = from_slice(&bytes).unwrap();
        assert_eq!(point, point_back);
    }

    #[test]
    fn test_serialize_deserialize_user() {
        let user = User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
        };

        let bytes = to_bytes(&user).unwrap();
        let user_back: User = from_slice(&bytes).unwrap();
        assert_eq!(user, user_back);
    }

    #[test]
    fn test_to_value() {
        let value = to_value(&Point { x: 1, y: 2 }).unwrap();
        let fields = value.as_struct().unwrap();
        assert_eq!(fields.get("x"), Some(&Value::Int32(1)));
        assert_eq!(fields.get("y"), Some(&Value::Int32(2)));
    }

    #[test]
    fn test_arrays() {
        let numbers = vec![1, 2, 3, 4, 5];
        let bytes = to_bytes(&numbers).unwrap();
        let numbers_back: Vec<i32> = from_slice(&bytes).unwrap();
        assert_eq!(numbers, numbers_back);
    }

    #[test]
    fn test_writer_and_reader() {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &Point { x: -5, y: 7 }).unwrap();
        let point: Point = from_reader(buffer.as_slice()).unwrap();
        assert_eq!(point, Point { x: -5, y: 7 });
    }

    #[test]
    fn test_encode_decode_keeps_kinds() {
        let mut fields = Struct::new();
        fields.insert("at", Value::timestamp_millis(1_700_000_000_123));
        fields.insert("id", Value::Uuid(uuid::Uuid::from_u128(7)));
        fields.insert("tag", Value::Symbol(Symbol::new("hot")));
        let value = Value::Struct(fields);
        assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn test_limits_apply_to_from_slice() {
        let bytes = to_bytes(&vec![1, 2, 3]).unwrap();
        let result: Result<Vec<i32>> = from_slice_with_options(&bytes, Options::new().with_max_len(2));
        assert!(matches!(result, Err(Error::LimitExceeded { .. })));
    }
}

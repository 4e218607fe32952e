//! Error types for TBin encoding and decoding.
//!
//! Every failure aborts the current top-level `encode`/`decode` call. The
//! stream-local caches of the [`Encoder`](crate::Encoder) or
//! [`Decoder`](crate::Decoder) are left in whatever state they reached, so an
//! instance that returned an error should be dropped rather than reused.
//!
//! ## Error Categories
//!
//! - **Encode-time**: [`Error::UnencodableShape`] when a value cannot be written
//!   under the shape it was asked to take
//! - **Protocol**: malformed varints, truncated input, undefined type tags or
//!   symbol ids, unknown tags and version negotiation failures
//! - **Typed targets**: [`Error::MissingField`] and [`Error::TypeMismatch`]
//! - **I/O**: failures of the underlying byte channel, passed through unchanged
//!
//! ## Examples
//!
//! ```rust
//! use tbin::{from_slice, Error, Value};
//!
//! // A stream must start with a version tag.
//! let result: Result<Value, Error> = from_slice(&[0x01, 0x01]);
//! assert!(matches!(result, Err(Error::MissingVersion(0x01))));
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors that can occur during TBin encoding/decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The value's structure cannot be represented under the requested shape.
    #[error("cannot encode value: {0}")]
    UnencodableShape(String),

    /// A varint ran past its maximum width without terminating.
    #[error("invalid varint encoding")]
    InvalidVarint,

    /// The byte source was exhausted in the middle of a value.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// A tag referenced a user type that has not been defined in this stream.
    #[error("undefined type tag 0x{0:02x}")]
    UndefinedTypeTag(u32),

    /// A symbol id was referenced before its name was sent.
    #[error("undefined symbol id {0}")]
    UndefinedSymbol(u32),

    /// The stream declares a format version this implementation cannot read.
    #[error("unsupported TBin version {0}")]
    UnsupportedVersion(u32),

    /// The first tag of the stream is not a version tag.
    #[error("stream does not start with a version tag (found tag 0x{0:02x})")]
    MissingVersion(u32),

    /// A tag that is not valid in value position.
    #[error("unknown tag 0x{0:02x}")]
    UnknownTag(u32),

    /// A required field of the target type is absent from the decoded data.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// A decoded value cannot be coerced into the target type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// String payload is not valid UTF-8.
    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,

    /// A configured decoding or encoding limit was exceeded.
    #[error("{what} exceeds limit of {limit}")]
    LimitExceeded { what: &'static str, limit: usize },

    /// I/O error from the underlying reader or writer.
    #[error("IO error: {0}")]
    Io(#[source] io::Error),

    /// Custom error, usually raised by a serde implementation.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates an [`Error::UnencodableShape`] with a description of the problem.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tbin::Error;
    ///
    /// let err = Error::unencodable("map keys must be strings");
    /// assert!(err.to_string().contains("map keys"));
    /// ```
    pub fn unencodable<T: fmt::Display>(msg: T) -> Self {
        Error::UnencodableShape(msg.to_string())
    }

    /// Creates a type mismatch error when a value cannot be coerced into the target type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tbin::Error;
    ///
    /// let err = Error::type_mismatch("Int32", "String");
    /// assert!(err.to_string().contains("expected Int32"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a missing-field error.
    pub fn missing_field(name: &str) -> Self {
        Error::MissingField(name.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` if the error is a protocol or data error raised while decoding.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidVarint
                | Error::UnexpectedEndOfStream
                | Error::UndefinedTypeTag(_)
                | Error::UndefinedSymbol(_)
                | Error::UnsupportedVersion(_)
                | Error::MissingVersion(_)
                | Error::UnknownTag(_)
                | Error::MissingField(_)
                | Error::TypeMismatch { .. }
                | Error::InvalidUtf8
        )
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            Error::Io(err)
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    fn invalid_type(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Error::TypeMismatch {
            expected: exp.to_string(),
            found: unexp.to_string(),
        }
    }

    fn invalid_value(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Error::TypeMismatch {
            expected: exp.to_string(),
            found: unexp.to_string(),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        Error::MissingField(field.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_maps_to_end_of_stream() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        assert!(matches!(Error::from(io_err), Error::UnexpectedEndOfStream));

        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(matches!(Error::from(io_err), Error::Io(_)));
    }

    #[test]
    fn test_serde_invalid_type_is_type_mismatch() {
        use serde::de::{Error as _, Unexpected};
        let err = Error::invalid_type(Unexpected::Str("abc"), &"i32");
        match err {
            Error::TypeMismatch { expected, found } => {
                assert_eq!(expected, "i32");
                assert!(found.contains("abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::UndefinedTypeTag(0x41).to_string(),
            "undefined type tag 0x41"
        );
        assert!(Error::MissingField("id".into()).to_string().contains("`id`"));
        assert!(Error::UnexpectedEndOfStream.is_decode_error());
        assert!(!Error::unencodable("x").is_decode_error());
    }
}

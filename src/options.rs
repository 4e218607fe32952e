//! Configuration options for TBin encoding and decoding.
//!
//! The wire format itself has no knobs: tags, varints and definition blocks are
//! fixed. What can be configured are the resource limits a codec instance
//! enforces while walking a value or a byte stream:
//!
//! - [`Options::max_depth`]: how deeply containers may nest
//! - [`Options::max_len`]: the largest count or byte length accepted from the
//!   wire before anything is allocated for it
//!
//! ## Examples
//!
//! ```rust
//! use tbin::{from_slice_with_options, to_bytes, Options, Value};
//!
//! let bytes = to_bytes(&vec![1, 2, 3]).unwrap();
//!
//! let strict = Options::new().with_max_len(2);
//! let result: Result<Value, _> = from_slice_with_options(&bytes, strict);
//! assert!(result.is_err());
//! ```

/// Default nesting limit for containers.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default limit for any count or length read from the wire (16 MiB).
pub const DEFAULT_MAX_LEN: usize = 16 * 1024 * 1024;

/// Resource limits shared by [`Encoder`](crate::Encoder) and [`Decoder`](crate::Decoder).
///
/// # Examples
///
/// ```rust
/// use tbin::Options;
///
/// let options = Options::new().with_max_depth(16).with_max_len(1024);
/// assert_eq!(options.max_depth, 16);
/// assert_eq!(options.max_len, 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Maximum nesting depth of arrays, maps, structs and unions.
    pub max_depth: usize,
    /// Maximum element count, field count or byte length accepted while decoding.
    pub max_len: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: DEFAULT_MAX_DEPTH,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl Options {
    /// Creates default options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tbin::Options;
    ///
    /// let options = Options::new();
    /// assert_eq!(options.max_depth, 128);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options without any limits.
    ///
    /// Only use this for trusted input: a corrupt length prefix can then request
    /// an arbitrarily large allocation.
    #[must_use]
    pub const fn unlimited() -> Self {
        Options {
            max_depth: usize::MAX,
            max_len: usize::MAX,
        }
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum count or length accepted from the wire.
    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

//! TBin wire format.
//!
//! A TBin stream is a sequence of unsigned varint **tags**, each followed by the
//! payload that tag implies. The first tag of every stream is a version tag.
//!
//! # Tag space
//!
//! | Tag | Meaning | Payload |
//! |-----|---------|---------|
//! | `0x00` | Null | none |
//! | `0x01` | Bool | `varint(0/1)` |
//! | `0x02`..`0x05` | Int8, Int16, Int32, Int64 | zigzag varint |
//! | `0x06` | Float32 | 4 bytes, big-endian IEEE-754 |
//! | `0x07` | Float64 | 8 bytes, big-endian IEEE-754 |
//! | `0x08` | Bytes | `varint(len)` + bytes |
//! | `0x09` | String | `varint(len)` + UTF-8 |
//! | `0x0a` | Timestamp | Float64 seconds since the epoch |
//! | `0x0b` | Symbol | `varint(id)` [+ `varint(len)` + UTF-8 on first use] |
//! | `0x0c` | UUID | 16 bytes |
//! | `0x0d` | Array | `varint(count)` + count values |
//! | `0x0e` | Map | `varint(count)` + count (key, value) pairs |
//! | `0x0f` | Struct | `varint(count)` + count (symbol, value) pairs |
//! | `0x10` | Any | only as a declared type: "a tagged value follows" |
//! | `0x11`..`0x15` | definition kinds | array, map, struct, union, enum |
//! | `0x18`..`0x1f` | Version | low 3 bits hold `version - 1` |
//! | `0x20`..`0x3f` | Tiny string | low 5 bits hold the UTF-8 length |
//! | `>= 0x40` | User tag | a stream-defined type shape |
//!
//! # Definitions
//!
//! The first time a user tag appears it is followed by a definition kind and a
//! structural description instead of a value; the value tag follows the
//! definition. Child shapes are always defined before their parents, so user
//! tags are assigned in strictly increasing order of first use on both sides.
//!
//! ```text
//! 0x40 0x13 varint(2) "x" 0x04 "y" 0x04     define 0x40 = Struct{x:Int32,y:Int32}
//! 0x40 02 16                                 value {x: 1, y: 11}
//! ```

pub const CURRENT_VERSION: u32 = 1;

pub const NULL_TAG: u32 = 0x00;
pub const BOOL_TAG: u32 = 0x01;
pub const INT8_TAG: u32 = 0x02;
pub const INT16_TAG: u32 = 0x03;
pub const INT32_TAG: u32 = 0x04;
pub const INT64_TAG: u32 = 0x05;
pub const FLOAT32_TAG: u32 = 0x06;
pub const FLOAT64_TAG: u32 = 0x07;
pub const BYTES_TAG: u32 = 0x08;
pub const STRING_TAG: u32 = 0x09;
pub const TIMESTAMP_TAG: u32 = 0x0a;
pub const SYMBOL_TAG: u32 = 0x0b;
pub const UUID_TAG: u32 = 0x0c;
pub const ARRAY_TAG: u32 = 0x0d;
pub const MAP_TAG: u32 = 0x0e;
pub const STRUCT_TAG: u32 = 0x0f;
pub const ANY_TAG: u32 = 0x10;

pub const DEF_ARRAY_TAG: u32 = 0x11;
pub const DEF_MAP_TAG: u32 = 0x12;
pub const DEF_STRUCT_TAG: u32 = 0x13;
pub const DEF_UNION_TAG: u32 = 0x14;
pub const DEF_ENUM_TAG: u32 = 0x15;

pub const VERSION_TAG: u32 = 0x18;
pub const VERSION_TAG_MASK: u32 = 0xf8;
pub const VERSION_DATA_MASK: u32 = 0x07;
pub const CURRENT_VERSION_TAG: u32 = VERSION_TAG + (CURRENT_VERSION - 1);

pub const TINY_STR_TAG: u32 = 0x20;
pub const TINY_STR_TAG_MASK: u32 = 0xe0;
pub const TINY_STR_DATA_MASK: u32 = 0x1f;
pub const TINY_STR_MAXLEN: usize = TINY_STR_DATA_MASK as usize;

pub const FIRST_USER_TAG: u32 = 0x40;

/// Returns the version carried by `tag`, or `None` if it is not a version tag.
#[inline]
#[must_use]
pub const fn version_of(tag: u32) -> Option<u32> {
    if tag & VERSION_TAG_MASK == VERSION_TAG {
        Some((tag & VERSION_DATA_MASK) + 1)
    } else {
        None
    }
}

/// Returns the UTF-8 length carried by a tiny-string tag.
#[inline]
#[must_use]
pub const fn tiny_len_of(tag: u32) -> Option<usize> {
    if tag & TINY_STR_TAG_MASK == TINY_STR_TAG {
        Some((tag & TINY_STR_DATA_MASK) as usize)
    } else {
        None
    }
}

#[inline]
#[must_use]
pub const fn is_user_tag(tag: u32) -> bool {
    tag >= FIRST_USER_TAG
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Formats bytes as space-separated lowercase hex pairs.
///
/// # Examples
///
/// ```rust
/// use tbin::format::hex;
///
/// assert_eq!(hex(&[0x18, 0x21, 0x61]), "18 21 61");
/// ```
#[must_use]
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_tags() {
        assert_eq!(CURRENT_VERSION_TAG, 0x18);
        assert_eq!(version_of(0x18), Some(1));
        assert_eq!(version_of(0x1f), Some(8));
        assert_eq!(version_of(0x20), None);
        assert_eq!(version_of(0x10), None);
    }

    #[test]
    fn test_tiny_string_tags() {
        assert_eq!(tiny_len_of(0x20), Some(0));
        assert_eq!(tiny_len_of(0x3f), Some(31));
        assert_eq!(tiny_len_of(0x40), None);
        assert_eq!(tiny_len_of(STRING_TAG), None);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[]), "");
        assert_eq!(hex(&[0x00, 0xff, 0x4a]), "00 ff 4a");
    }
}

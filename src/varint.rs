//! Variable-length integer encoding.
//!
//! Unsigned integers are split into 7-bit groups, least significant group
//! first. Each group is stored in the low 7 bits of a byte and every byte but
//! the last has its high bit set. Values below `0x80` take a single byte.
//!
//! Signed integers are zigzag-mapped first (`0, -1, 1, -2, ...` become
//! `0, 1, 2, 3, ...`) so that small negative numbers stay short.
//!
//! A 32-bit varint is at most 5 bytes and a 64-bit varint at most 10; a longer
//! run of continuation bytes is [`Error::InvalidVarint`]. Running out of input
//! in the middle of a varint is [`Error::UnexpectedEndOfStream`].

use crate::{Error, Result};
use std::io::{Read, Write};

pub const MAX_VARINT32_LEN: usize = 5;
pub const MAX_VARINT64_LEN: usize = 10;

#[inline]
#[must_use]
pub const fn zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
#[must_use]
pub const fn unzigzag32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[inline]
#[must_use]
pub const fn zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
#[must_use]
pub const fn unzigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Number of bytes the unsigned varint encoding of `n` occupies.
#[must_use]
pub const fn encoded_len(mut n: u64) -> usize {
    let mut len = 1;
    while n >= 0x80 {
        n >>= 7;
        len += 1;
    }
    len
}

/// Encodes `n` into `buf`, returning the number of bytes used.
#[inline]
fn encode_into(mut n: u64, buf: &mut [u8; MAX_VARINT64_LEN]) -> usize {
    let mut len = 0;
    while n >= 0x80 {
        buf[len] = (n as u8) | 0x80;
        n >>= 7;
        len += 1;
    }
    buf[len] = n as u8;
    len + 1
}

/// Writes an unsigned 32-bit varint.
///
/// # Examples
///
/// ```rust
/// use tbin::varint::write_u32;
///
/// let mut out = Vec::new();
/// write_u32(&mut out, 300).unwrap();
/// assert_eq!(out, vec![0xac, 0x02]);
/// ```
pub fn write_u32<W: Write + ?Sized>(writer: &mut W, n: u32) -> Result<()> {
    write_u64(writer, u64::from(n))
}

/// Writes an unsigned 64-bit varint.
pub fn write_u64<W: Write + ?Sized>(writer: &mut W, n: u64) -> Result<()> {
    let mut buf = [0u8; MAX_VARINT64_LEN];
    let len = encode_into(n, &mut buf);
    writer.write_all(&buf[..len]).map_err(Error::Io)
}

/// Writes a zigzag-encoded signed 32-bit varint.
pub fn write_i32<W: Write + ?Sized>(writer: &mut W, n: i32) -> Result<()> {
    write_u32(writer, zigzag32(n))
}

/// Writes a zigzag-encoded signed 64-bit varint.
pub fn write_i64<W: Write + ?Sized>(writer: &mut W, n: i64) -> Result<()> {
    write_u64(writer, zigzag64(n))
}

#[inline]
pub(crate) fn read_byte<R: Read + ?Sized>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Reads an unsigned 32-bit varint.
///
/// # Examples
///
/// ```rust
/// use tbin::varint::read_u32;
///
/// let mut input: &[u8] = &[0xac, 0x02];
/// assert_eq!(read_u32(&mut input).unwrap(), 300);
/// ```
pub fn read_u32<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let first = read_byte(reader)?;
    read_u32_after(reader, first)
}

/// Finishes reading an unsigned 32-bit varint whose first byte is `first`.
pub(crate) fn read_u32_after<R: Read + ?Sized>(reader: &mut R, first: u8) -> Result<u32> {
    let mut result = u32::from(first & 0x7f);
    let mut byte = first;
    for shift in (7..35).step_by(7) {
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        byte = read_byte(reader)?;
        if shift == 28 && byte & 0x70 != 0 {
            return Err(Error::InvalidVarint);
        }
        result |= u32::from(byte & 0x7f) << shift;
    }
    if byte & 0x80 == 0 {
        return Ok(result);
    }
    Err(Error::InvalidVarint)
}

/// Reads an unsigned 64-bit varint.
pub fn read_u64<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut result = 0u64;
    for shift in (0..70).step_by(7) {
        let byte = read_byte(reader)?;
        if shift == 63 && byte & 0x7e != 0 {
            return Err(Error::InvalidVarint);
        }
        result |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(Error::InvalidVarint)
}

/// Reads a zigzag-encoded signed 32-bit varint.
pub fn read_i32<R: Read + ?Sized>(reader: &mut R) -> Result<i32> {
    read_u32(reader).map(unzigzag32)
}

/// Reads a zigzag-encoded signed 64-bit varint.
pub fn read_i64<R: Read + ?Sized>(reader: &mut R) -> Result<i64> {
    read_u64(reader).map(unzigzag64)
}

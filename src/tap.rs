//! A cursor over a byte buffer with read, write, skip and match operations
//! for every Avro primitive wire representation.
//!
//! Primitive operations never fail mid-way: a read past the end of the buffer
//! or a write that does not fit only advances the position. Callers detect the
//! fault afterwards with [`Tap::is_valid`] or [`Tap::check`], which lets a
//! streaming consumer retry once more bytes arrive, and lets an encoder retry
//! with a larger buffer.

use crate::error::{AvroErr, AvroResult};
use crate::util::compare_f64;
use byteorder::{ByteOrder, LittleEndian};
use integer_encoding::VarInt;
use std::cmp::Ordering;
use std::convert::TryFrom;

/// Cursor over a buffer `B` and a position within it.
#[derive(Debug, Clone)]
pub struct Tap<B> {
    buf: B,
    pos: usize,
}

impl<B: AsRef<[u8]>> Tap<B> {
    /// Creates a tap positioned at the start of `buf`.
    pub fn new(buf: B) -> Self {
        Tap { buf, pos: 0 }
    }

    /// Creates a tap positioned at `pos`.
    pub fn with_pos(buf: B, pos: usize) -> Self {
        Tap { buf, pos }
    }

    /// Current position. May lie beyond the buffer end after a fault.
    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to `pos`.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Length of the underlying buffer.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }

    /// Whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while every operation so far stayed within the buffer.
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.pos <= self.len()
    }

    /// Same as [`Tap::is_valid`], as a `Result`.
    pub fn check(&self) -> AvroResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AvroErr::Truncated)
        }
    }

    /// Bytes between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.pos)
    }

    /// The whole underlying buffer.
    pub fn buffer(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Gives back the buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }

    #[inline(always)]
    fn invalidate(&mut self) {
        self.pos = self.len() + 1;
    }

    // Returns the slice [pos, pos + n) and advances, or an empty slice past the end.
    #[inline(always)]
    fn take(&mut self, n: usize) -> &[u8] {
        let start = self.pos;
        self.pos = start.saturating_add(n);
        if self.pos <= self.len() {
            &self.buf.as_ref()[start..self.pos]
        } else {
            &[]
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    /// Reads
    ///////////////////////////////////////////////////////////////////////////

    /// Reads one byte, nonzero being `true`.
    pub fn read_boolean(&mut self) -> bool {
        let pos = self.pos;
        self.pos += 1;
        match self.buf.as_ref().get(pos) {
            Some(b) => *b != 0,
            None => false,
        }
    }

    /// Reads a zig-zag varint.
    #[inline]
    pub fn read_long(&mut self) -> i64 {
        let decoded = match self.buf.as_ref().get(self.pos..) {
            Some(rest) if !rest.is_empty() => i64::decode_var(rest),
            _ => None,
        };
        match decoded {
            Some((n, read)) => {
                self.pos += read;
                n
            }
            None => {
                self.invalidate();
                0
            }
        }
    }

    /// Reads a long that must fit in an int; out of range values invalidate the tap.
    #[inline]
    pub fn read_int(&mut self) -> i32 {
        let n = self.read_long();
        match i32::try_from(n) {
            Ok(n) => n,
            Err(_) => {
                self.invalidate();
                0
            }
        }
    }

    /// Reads a little endian f32.
    pub fn read_float(&mut self) -> f32 {
        let bytes = self.take(4);
        if bytes.len() == 4 {
            LittleEndian::read_f32(bytes)
        } else {
            0.0
        }
    }

    /// Reads a little endian f64.
    pub fn read_double(&mut self) -> f64 {
        let bytes = self.take(8);
        if bytes.len() == 8 {
            LittleEndian::read_f64(bytes)
        } else {
            0.0
        }
    }

    /// Reads `len` raw bytes, as used by `fixed`.
    pub fn read_fixed(&mut self, len: usize) -> Vec<u8> {
        self.take(len).to_vec()
    }

    /// Reads a length-prefixed byte sequence. A negative length invalidates the tap.
    pub fn read_bytes(&mut self) -> Vec<u8> {
        match self.read_len() {
            Some(len) => self.read_fixed(len),
            None => Vec::new(),
        }
    }

    /// Reads a length-prefixed UTF-8 string. Truncation is reported by the
    /// tap, malformed UTF-8 by the returned error.
    pub fn read_string(&mut self) -> AvroResult<String> {
        let len = match self.read_len() {
            Some(len) => len,
            None => return Ok(String::new()),
        };
        let bytes = self.take(len);
        std::str::from_utf8(bytes)
            .map(ToOwned::to_owned)
            .map_err(AvroErr::InvalidUtf8)
    }

    /// Reads an array or map block header and returns its item count. A
    /// negative count is followed by the block's byte size, which is dropped.
    pub fn read_block_len(&mut self) -> i64 {
        let n = self.read_long();
        if n < 0 {
            let _size = self.read_long();
            -n
        } else {
            n
        }
    }

    fn read_len(&mut self) -> Option<usize> {
        let len = self.read_long();
        if len < 0 {
            self.invalidate();
            None
        } else {
            Some(len as usize)
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    /// Skips
    ///////////////////////////////////////////////////////////////////////////

    /// Skips a boolean.
    pub fn skip_boolean(&mut self) {
        self.pos += 1;
    }

    /// Skips a long.
    #[inline]
    pub fn skip_long(&mut self) {
        let buf = self.buf.as_ref();
        while self.pos < buf.len() {
            let b = buf[self.pos];
            self.pos += 1;
            if b & 0x80 == 0 {
                return;
            }
        }
        self.invalidate();
    }

    /// Skips an int.
    pub fn skip_int(&mut self) {
        self.skip_long();
    }

    /// Skips a float.
    pub fn skip_float(&mut self) {
        self.pos += 4;
    }

    /// Skips a double.
    pub fn skip_double(&mut self) {
        self.pos += 8;
    }

    /// Skips `len` raw bytes.
    pub fn skip_fixed(&mut self, len: usize) {
        self.pos = self.pos.saturating_add(len);
    }

    /// Skips length-prefixed bytes.
    pub fn skip_bytes(&mut self) {
        if let Some(len) = self.read_len() {
            self.skip_fixed(len);
        }
    }

    /// Skips a string.
    pub fn skip_string(&mut self) {
        self.skip_bytes();
    }

    ///////////////////////////////////////////////////////////////////////////
    /// Matches: ordering on encoded bytes without materializing values.
    ///////////////////////////////////////////////////////////////////////////

    /// Compares the next boolean of both taps, advancing both.
    pub fn match_boolean<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>) -> Ordering {
        self.read_boolean().cmp(&other.read_boolean())
    }

    /// Compares the next long of both taps, advancing both.
    pub fn match_long<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>) -> Ordering {
        self.read_long().cmp(&other.read_long())
    }

    /// Compares the next int of both taps, advancing both.
    pub fn match_int<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>) -> Ordering {
        self.match_long(other)
    }

    /// Compares the next float of both taps, advancing both.
    pub fn match_float<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>) -> Ordering {
        compare_f64(self.read_float() as f64, other.read_float() as f64)
    }

    /// Compares the next double of both taps, advancing both.
    pub fn match_double<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>) -> Ordering {
        compare_f64(self.read_double(), other.read_double())
    }

    /// Compares the next `len` bytes of both taps lexicographically.
    pub fn match_fixed<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>, len: usize) -> Ordering {
        self.take(len).cmp(other.take(len))
    }

    /// Compares the next bytes of both taps lexicographically.
    pub fn match_bytes<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>) -> Ordering {
        let len1 = self.read_len().unwrap_or(0);
        let len2 = other.read_len().unwrap_or(0);
        self.take(len1).cmp(other.take(len2))
    }

    /// Compares the next strings of both taps by their UTF-8 bytes.
    pub fn match_string<C: AsRef<[u8]>>(&mut self, other: &mut Tap<C>) -> Ordering {
        self.match_bytes(other)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Tap<B> {
    // Returns the writable slice [pos, pos + n) and advances, or None past the end.
    #[inline(always)]
    fn reserve(&mut self, n: usize) -> Option<&mut [u8]> {
        let start = self.pos;
        self.pos = start.saturating_add(n);
        if self.pos <= self.len() {
            let end = self.pos;
            Some(&mut self.buf.as_mut()[start..end])
        } else {
            None
        }
    }

    ///////////////////////////////////////////////////////////////////////////
    /// Writes
    ///////////////////////////////////////////////////////////////////////////

    /// Writes a boolean.
    pub fn write_boolean(&mut self, b: bool) {
        if let Some(dst) = self.reserve(1) {
            dst[0] = b as u8;
        }
    }

    /// Writes `n` as a zig-zag varint.
    #[inline]
    pub fn write_long(&mut self, n: i64) {
        if let Some(dst) = self.reserve(n.required_space()) {
            n.encode_var(dst);
        }
    }

    /// Writes an int.
    #[inline]
    pub fn write_int(&mut self, n: i32) {
        self.write_long(n as i64);
    }

    /// Writes a float.
    pub fn write_float(&mut self, f: f32) {
        if let Some(dst) = self.reserve(4) {
            LittleEndian::write_f32(dst, f);
        }
    }

    /// Writes a double.
    pub fn write_double(&mut self, d: f64) {
        if let Some(dst) = self.reserve(8) {
            LittleEndian::write_f64(dst, d);
        }
    }

    /// Writes `bytes` as is.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        if let Some(dst) = self.reserve(bytes.len()) {
            dst.copy_from_slice(bytes);
        }
    }

    /// Writes `bytes` prefixed by their length.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_long(bytes.len() as i64);
        self.write_fixed(bytes);
    }

    /// Writes the UTF-8 bytes of `s` prefixed by their length.
    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::Tap;
    use std::cmp::Ordering;

    fn written<F: FnOnce(&mut Tap<Vec<u8>>)>(f: F) -> Vec<u8> {
        let mut tap = Tap::new(vec![0u8; 32]);
        f(&mut tap);
        assert!(tap.is_valid());
        let pos = tap.pos();
        let mut buf = tap.into_inner();
        buf.truncate(pos);
        buf
    }

    #[test]
    fn zigzag_concrete_cases() {
        assert_eq!(written(|t| t.write_int(5)), vec![0x0a]);
        assert_eq!(written(|t| t.write_long(-3)), vec![0x05]);
        assert_eq!(written(|t| t.write_long(0)), vec![0x00]);
        assert_eq!(written(|t| t.write_long(-1)), vec![0x01]);
        assert_eq!(written(|t| t.write_long(64)), vec![0x80, 0x01]);
    }

    #[test]
    fn int_out_of_range_invalidates() {
        let buf = written(|t| t.write_long(i32::max_value() as i64 + 1));
        let mut tap = Tap::new(buf.as_slice());
        assert_eq!(tap.read_int(), 0);
        assert!(!tap.is_valid());
        assert!(tap.check().is_err());

        let buf = written(|t| t.write_long(i32::min_value() as i64));
        let mut tap = Tap::new(buf.as_slice());
        assert_eq!(tap.read_int(), i32::min_value());
        assert!(tap.is_valid());
    }

    #[test]
    fn long_extremes_round_trip() {
        for n in &[i64::min_value(), i64::max_value(), -64, 63, 1 << 40] {
            let buf = written(|t| t.write_long(*n));
            let mut tap = Tap::new(buf.as_slice());
            assert_eq!(tap.read_long(), *n);
            assert_eq!(tap.pos(), buf.len());
        }
    }

    #[test]
    fn floats_are_little_endian() {
        assert_eq!(written(|t| t.write_float(1.0)), vec![0, 0, 0x80, 0x3f]);
        let buf = written(|t| t.write_double(-2.5));
        let mut tap = Tap::new(buf.as_slice());
        assert_eq!(tap.read_double(), -2.5);
    }

    #[test]
    fn truncated_long_invalidates_tap() {
        let mut tap = Tap::new(&[0x80u8, 0x80][..]);
        let _ = tap.read_long();
        assert!(!tap.is_valid());
        assert!(tap.check().is_err());
    }

    #[test]
    fn truncated_string_invalidates_tap() {
        let mut tap = Tap::new(&[0x0au8, b'a', b'b'][..]);
        let s = tap.read_string().unwrap();
        assert!(s.is_empty());
        assert!(!tap.is_valid());
    }

    #[test]
    fn overflowing_write_invalidates_tap() {
        let mut tap = Tap::new(vec![0u8; 2]);
        tap.write_string("hello");
        assert!(!tap.is_valid());
        assert_eq!(tap.pos(), 6);
        // untouched
        assert_eq!(tap.into_inner(), vec![0x0a, 0]);
    }

    #[test]
    fn skip_advances_past_values() {
        let buf = written(|t| {
            t.write_long(300);
            t.write_string("abc");
            t.write_double(1.5);
            t.write_boolean(true);
        });
        let mut tap = Tap::new(buf.as_slice());
        tap.skip_long();
        tap.skip_string();
        tap.skip_double();
        assert!(tap.read_boolean());
        assert_eq!(tap.pos(), buf.len());
    }

    #[test]
    fn negative_block_count_reads_size() {
        let buf = written(|t| {
            t.write_long(-2);
            t.write_long(4);
        });
        let mut tap = Tap::new(buf.as_slice());
        assert_eq!(tap.read_block_len(), 2);
        assert_eq!(tap.pos(), buf.len());
    }

    #[test]
    fn match_on_encoded_bytes() {
        let a = written(|t| t.write_long(-10));
        let b = written(|t| t.write_long(3));
        assert_eq!(
            Tap::new(a.as_slice()).match_long(&mut Tap::new(b.as_slice())),
            Ordering::Less
        );

        let a = written(|t| t.write_string("abc"));
        let b = written(|t| t.write_string("ab"));
        assert_eq!(
            Tap::new(a.as_slice()).match_string(&mut Tap::new(b.as_slice())),
            Ordering::Greater
        );
    }
}

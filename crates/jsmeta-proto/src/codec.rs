// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical tagged codec (protobuf-compatible wire subset).
//!
//! Every field is written as `varint(field << 3 | wire_type)` followed by its
//! payload:
//!
//! ```text
//! wire 0  varint      LEB-128, at most 10 bytes
//! wire 1  fixed64     8 bytes little-endian
//! wire 2  delimited   varint length || bytes
//! wire 5  fixed32     4 bytes little-endian
//! ```
//!
//! Writers emit fields in ascending field order and never emit defaults for
//! optional fields, so equal records always produce equal bytes. Readers skip
//! unknown field numbers and reject everything else that is malformed.

use crate::error::CorruptionError;

/// Maximum record nesting accepted by [`Reader::read_message`].
pub const MAX_NESTING: usize = 256;

/// Largest field number a tag may carry.
pub const MAX_FIELD: u64 = (1 << 29) - 1;

/// Wire type carried in the low three bits of every tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// LEB-128 varint.
    Varint,
    /// Eight little-endian bytes.
    Fixed64,
    /// Varint length followed by that many bytes.
    Delimited,
    /// Four little-endian bytes.
    Fixed32,
}

impl WireType {
    /// Raw three-bit value.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::Delimited => 2,
            Self::Fixed32 => 5,
        }
    }

    /// Parse the three-bit value from a tag.
    pub fn from_bits(bits: u8) -> Result<Self, CorruptionError> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::Delimited),
            5 => Ok(Self::Fixed32),
            other => Err(CorruptionError::InvalidWireType(other)),
        }
    }
}

/// Trait for canonical encoding of a record body (without length prefix).
pub trait Encode {
    /// Append this record's fields to `writer`.
    fn encode(&self, writer: &mut Writer);
}

/// Trait for decoding a record body that spans the whole reader.
pub trait Decode: Sized {
    /// Decode from the provided reader, consuming it to the end.
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError>;
}

/// Encode a record into a fresh Vec.
pub fn encode_to_vec<T: Encode>(value: &T) -> Vec<u8> {
    let mut writer = Writer::default();
    value.encode(&mut writer);
    writer.into_vec()
}

/// Decode a record occupying the whole of `bytes`.
pub fn decode_from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, CorruptionError> {
    let mut reader = Reader::new(bytes);
    T::decode(&mut reader)
}

/// Append `value` to `out` as a delimited record (varint length prefix).
pub fn write_delimited<T: Encode>(value: &T, out: &mut Vec<u8>) {
    let mut writer = Writer::default();
    writer.write_delimited(value);
    out.extend_from_slice(&writer.into_vec());
}

/// Zigzag-map a signed integer so small magnitudes stay short.
#[inline]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Canonical writer for tagged fields.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a big-endian i32 (used by the per-package version prefix).
    pub fn write_i32_be(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write an unsigned LEB-128 varint.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
    }

    /// Write a field tag.
    pub fn write_tag(&mut self, field: u32, wire: WireType) {
        self.write_varint((u64::from(field) << 3) | u64::from(wire.bits()));
    }

    /// Write a varint field.
    pub fn uint_field(&mut self, field: u32, value: u64) {
        self.write_tag(field, WireType::Varint);
        self.write_varint(value);
    }

    /// Write a varint field only when `value` is present.
    pub fn opt_uint_field(&mut self, field: u32, value: Option<u32>) {
        if let Some(value) = value {
            self.uint_field(field, u64::from(value));
        }
    }

    /// Write a boolean field only when `value` is true.
    pub fn bool_field(&mut self, field: u32, value: bool) {
        if value {
            self.uint_field(field, 1);
        }
    }

    /// Write a zigzag-encoded signed field.
    pub fn sint_field(&mut self, field: u32, value: i64) {
        self.uint_field(field, zigzag_encode(value));
    }

    /// Write an IEEE-754 double as fixed64.
    pub fn double_field(&mut self, field: u32, value: f64) {
        self.write_tag(field, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_bits().to_le_bytes());
    }

    /// Write a length-delimited byte field.
    pub fn bytes_field(&mut self, field: u32, bytes: &[u8]) {
        self.write_tag(field, WireType::Delimited);
        self.write_varint(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    /// Write a UTF-8 string field.
    pub fn string_field(&mut self, field: u32, value: &str) {
        self.bytes_field(field, value.as_bytes());
    }

    /// Write an embedded record field.
    pub fn message_field<T: Encode>(&mut self, field: u32, value: &T) {
        let body = encode_to_vec(value);
        self.bytes_field(field, &body);
    }

    /// Write one embedded record field per element.
    pub fn repeated_message_field<T: Encode>(&mut self, field: u32, values: &[T]) {
        for value in values {
            self.message_field(field, value);
        }
    }

    /// Write a record prefixed by its varint byte length.
    pub fn write_delimited<T: Encode>(&mut self, value: &T) {
        let body = encode_to_vec(value);
        self.write_varint(body.len() as u64);
        self.write_bytes(&body);
    }

    /// Consume the writer and return the buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Strict reader for tagged fields.
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over the provided byte slice.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            depth: 0,
        }
    }

    /// True once every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Current read offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Unread tail of the input; consumes it.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.offset.min(self.bytes.len())..];
        self.offset = self.bytes.len();
        rest
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CorruptionError> {
        let truncated = CorruptionError::Truncated {
            offset: self.offset,
            needed: len,
        };
        let end = self.offset.checked_add(len).ok_or(truncated.clone())?;
        if end > self.bytes.len() {
            return Err(truncated);
        }
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    /// Read a big-endian i32.
    pub fn read_i32_be(&mut self) -> Result<i32, CorruptionError> {
        let chunk = self.take(4)?;
        let raw: [u8; 4] = chunk.try_into().map_err(|_| CorruptionError::Truncated {
            offset: self.offset,
            needed: 4,
        })?;
        Ok(i32::from_be_bytes(raw))
    }

    /// Read an unsigned LEB-128 varint.
    pub fn read_varint(&mut self) -> Result<u64, CorruptionError> {
        let start = self.offset;
        let mut value = 0u64;
        for shift in (0..70).step_by(7) {
            let byte = self.take(1)?[0];
            if shift == 63 && byte > 1 {
                return Err(CorruptionError::VarintOverflow(start));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CorruptionError::VarintOverflow(start))
    }

    /// Read the next field tag, or `None` at the end of the record.
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_field(&mut self) -> Result<Option<(u32, WireType)>, CorruptionError> {
        if self.is_at_end() {
            return Ok(None);
        }
        let tag = self.read_varint()?;
        let field = tag >> 3;
        if field == 0 || field > MAX_FIELD {
            return Err(CorruptionError::InvalidField(field));
        }
        let wire = WireType::from_bits((tag & 0x07) as u8)?;
        let field = u32::try_from(field).map_err(|_| CorruptionError::InvalidField(field))?;
        Ok(Some((field, wire)))
    }

    fn expect_wire(field: u32, expected: WireType, found: WireType) -> Result<(), CorruptionError> {
        if expected == found {
            Ok(())
        } else {
            Err(CorruptionError::WireTypeMismatch {
                field,
                expected,
                found,
            })
        }
    }

    /// Read a varint field payload.
    pub fn read_uint(&mut self, field: u32, wire: WireType) -> Result<u64, CorruptionError> {
        Self::expect_wire(field, WireType::Varint, wire)?;
        self.read_varint()
    }

    /// Read a varint field payload that must fit in `u32`.
    pub fn read_u32(&mut self, field: u32, wire: WireType) -> Result<u32, CorruptionError> {
        let start = self.offset;
        let value = self.read_uint(field, wire)?;
        u32::try_from(value).map_err(|_| CorruptionError::VarintOverflow(start))
    }

    /// Read a boolean field payload.
    pub fn read_bool(&mut self, field: u32, wire: WireType) -> Result<bool, CorruptionError> {
        Ok(self.read_uint(field, wire)? != 0)
    }

    /// Read a zigzag-encoded signed field payload.
    pub fn read_sint(&mut self, field: u32, wire: WireType) -> Result<i64, CorruptionError> {
        Ok(zigzag_decode(self.read_uint(field, wire)?))
    }

    /// Read a fixed64 double field payload.
    pub fn read_double(&mut self, field: u32, wire: WireType) -> Result<f64, CorruptionError> {
        Self::expect_wire(field, WireType::Fixed64, wire)?;
        let chunk = self.take(8)?;
        let raw: [u8; 8] = chunk.try_into().map_err(|_| CorruptionError::Truncated {
            offset: self.offset,
            needed: 8,
        })?;
        Ok(f64::from_bits(u64::from_le_bytes(raw)))
    }

    fn read_length_prefixed(&mut self) -> Result<&'a [u8], CorruptionError> {
        let len = self.read_varint()?;
        let remaining = self.bytes.len().saturating_sub(self.offset);
        let len_usize = usize::try_from(len)
            .ok()
            .filter(|len| *len <= remaining)
            .ok_or(CorruptionError::LengthTooLarge { len, remaining })?;
        self.take(len_usize)
    }

    /// Read a length-delimited byte field payload.
    pub fn read_bytes(&mut self, field: u32, wire: WireType) -> Result<&'a [u8], CorruptionError> {
        Self::expect_wire(field, WireType::Delimited, wire)?;
        self.read_length_prefixed()
    }

    /// Read a UTF-8 string field payload.
    pub fn read_string(&mut self, field: u32, wire: WireType) -> Result<String, CorruptionError> {
        let bytes = self.read_bytes(field, wire)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CorruptionError::InvalidUtf8)
    }

    /// Read an embedded record field payload.
    pub fn read_message<T: Decode>(&mut self, field: u32, wire: WireType) -> Result<T, CorruptionError> {
        let bytes = self.read_bytes(field, wire)?;
        self.nested(bytes)
    }

    /// Read a varint-length-prefixed record (the delimited framing).
    pub fn read_delimited<T: Decode>(&mut self) -> Result<T, CorruptionError> {
        let bytes = self.read_length_prefixed()?;
        self.nested(bytes)
    }

    fn nested<T: Decode>(&self, bytes: &'a [u8]) -> Result<T, CorruptionError> {
        let depth = self.depth + 1;
        if depth > MAX_NESTING {
            return Err(CorruptionError::NestingTooDeep(MAX_NESTING));
        }
        let mut inner = Reader {
            bytes,
            offset: 0,
            depth,
        };
        T::decode(&mut inner)
    }

    /// Skip the payload of a field this decoder does not know.
    pub fn skip(&mut self, wire: WireType) -> Result<(), CorruptionError> {
        match wire {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Delimited => {
                self.read_length_prefixed()?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
        }
        Ok(())
    }
}

/// Unwrap an optional decoded field or report it missing.
pub fn required<T>(value: Option<T>, name: &'static str) -> Result<T, CorruptionError> {
    value.ok_or(CorruptionError::MissingField(name))
}

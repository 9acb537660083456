// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Corruption errors raised while decoding metadata records.

use crate::codec::WireType;

/// Malformed framing or dangling references found while decoding.
///
/// Always fatal to the decode call that produced it; decoded records are never
/// partially repaired.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorruptionError {
    /// Input ended in the middle of a value.
    #[error("truncated input: need {needed} bytes at offset {offset}")]
    Truncated {
        /// Offset at which the read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
    },
    /// A varint ran longer than ten bytes or overflowed its target width.
    #[error("varint overflow at offset {0}")]
    VarintOverflow(usize),
    /// The low three tag bits name a wire type this codec does not know.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),
    /// Field number zero or larger than the protocol allows.
    #[error("invalid field number {0}")]
    InvalidField(u64),
    /// A known field arrived with the wrong wire type.
    #[error("field {field}: expected wire type {expected:?}, got {found:?}")]
    WireTypeMismatch {
        /// Field number being read.
        field: u32,
        /// Wire type the record schema requires.
        expected: WireType,
        /// Wire type found on the wire.
        found: WireType,
    },
    /// String bytes are not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,
    /// A length prefix points past the end of the input.
    #[error("length {len} exceeds remaining {remaining} bytes")]
    LengthTooLarge {
        /// Declared length.
        len: u64,
        /// Bytes actually remaining.
        remaining: usize,
    },
    /// A required field was absent from a record.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// Annotation argument value carries a tag outside the known set.
    #[error("unknown annotation value tag {0}")]
    UnknownValueTag(u64),
    /// An enum field carries a value outside the known set.
    #[error("invalid value {value} for enum `{name}`")]
    InvalidEnum {
        /// Enum being decoded.
        name: &'static str,
        /// Raw value found.
        value: u64,
    },
    /// A string index does not resolve inside the string table.
    #[error("string index {index} out of range (table has {len})")]
    StringIndexOutOfRange {
        /// Offending index.
        index: u32,
        /// Size of the string table.
        len: usize,
    },
    /// A qualified-name index does not resolve inside the qualified-name table.
    #[error("qualified name index {index} out of range (table has {len})")]
    QualifiedNameIndexOutOfRange {
        /// Offending index.
        index: u32,
        /// Size of the qualified-name table.
        len: usize,
    },
    /// A declaration names a file the fragment does not list.
    #[error("declaration refers to unknown file id {0}")]
    UnknownFileId(u32),
    /// Two file records resolve to the same id.
    #[error("file id {0} listed twice")]
    DuplicateFileId(u32),
    /// Records nest deeper than the decoder permits.
    #[error("records nested deeper than {0}")]
    NestingTooDeep(usize),
}

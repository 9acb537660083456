// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! String and qualified-name tables shared by one serialized unit.
//!
//! Index *is* position: the n-th string is referenced by `n`. Decoders never
//! remap ids, they only check that every reference resolves.

use crate::codec::{Decode, Encode, Reader, Writer};
use crate::error::CorruptionError;

/// Ordered table of unique strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTableRecord {
    /// Strings in first-interned order.
    pub strings: Vec<String>,
}

impl Encode for StringTableRecord {
    fn encode(&self, writer: &mut Writer) {
        for s in &self.strings {
            writer.string_field(1, s);
        }
    }
}

impl Decode for StringTableRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.strings.push(reader.read_string(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

/// Multi-segment name; each segment is a string-table index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualifiedNameRecord {
    /// Segment string indices, outermost first.
    pub segments: Vec<u32>,
    /// Set for names local to a class member body.
    pub is_local: bool,
}

impl Encode for QualifiedNameRecord {
    fn encode(&self, writer: &mut Writer) {
        for segment in &self.segments {
            writer.uint_field(1, u64::from(*segment));
        }
        writer.bool_field(2, self.is_local);
    }
}

impl Decode for QualifiedNameRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.segments.push(reader.read_u32(field, wire)?),
                2 => out.is_local = reader.read_bool(field, wire)?,
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

/// Ordered table of qualified names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifiedNameTableRecord {
    /// Names in first-interned order.
    pub names: Vec<QualifiedNameRecord>,
}

impl Encode for QualifiedNameTableRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.repeated_message_field(1, &self.names);
    }
}

impl Decode for QualifiedNameTableRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.names.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

/// Borrowed view over a pair of tables, used to resolve and check indices.
#[derive(Debug, Clone, Copy)]
pub struct NameTables<'a> {
    strings: &'a StringTableRecord,
    names: &'a QualifiedNameTableRecord,
}

impl<'a> NameTables<'a> {
    /// Pair a string table with its qualified-name table.
    pub fn new(strings: &'a StringTableRecord, names: &'a QualifiedNameTableRecord) -> Self {
        Self { strings, names }
    }

    /// Resolve a string index.
    pub fn string(&self, index: u32) -> Result<&'a str, CorruptionError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.strings.get(i))
            .map(String::as_str)
            .ok_or(CorruptionError::StringIndexOutOfRange {
                index,
                len: self.strings.strings.len(),
            })
    }

    /// Resolve a qualified-name index to its record.
    pub fn qualified_name(&self, index: u32) -> Result<&'a QualifiedNameRecord, CorruptionError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.names.get(i))
            .ok_or(CorruptionError::QualifiedNameIndexOutOfRange {
                index,
                len: self.names.names.len(),
            })
    }

    /// Resolve a qualified-name index to its dotted text form.
    pub fn dotted_name(&self, index: u32) -> Result<String, CorruptionError> {
        let record = self.qualified_name(index)?;
        let segments = record
            .segments
            .iter()
            .map(|s| self.string(*s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(segments.join("."))
    }

    /// Check that a string index resolves.
    pub fn check_string(&self, index: u32) -> Result<(), CorruptionError> {
        self.string(index).map(|_| ())
    }

    /// Check that a qualified-name index resolves, including its segments.
    pub fn check_name(&self, index: u32) -> Result<(), CorruptionError> {
        let record = self.qualified_name(index)?;
        record.segments.iter().try_for_each(|s| self.check_string(*s))
    }

    /// Check every entry of the qualified-name table against the string table.
    pub fn check_tables(&self) -> Result<(), CorruptionError> {
        self.names
            .names
            .iter()
            .flat_map(|n| n.segments.iter())
            .try_for_each(|s| self.check_string(*s))
    }
}

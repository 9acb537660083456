// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Header record preceding fragments in both output framings.

use crate::annotation::AnnotationRecord;
use crate::codec::{Decode, Encode, Reader, Writer};
use crate::error::CorruptionError;
use crate::tables::{NameTables, QualifiedNameTableRecord, StringTableRecord};

/// Header flag bits.
pub mod header_flags {
    /// Produced by a pre-release compiler; consumers treat unknown fields leniently.
    pub const PRE_RELEASE: u32 = 1 << 0;
}

/// Small fixed record: optional package name, flags and experimental opt-ins.
///
/// The tables here are private to the header so it can be read without
/// touching any fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRecord {
    /// Set in per-package headers, absent in module headers.
    pub package_fq_name: Option<String>,
    /// See [`header_flags`].
    pub flags: u32,
    /// Header-local strings (present only with experimental annotations).
    pub strings: Option<StringTableRecord>,
    /// Header-local qualified names.
    pub qualified_names: Option<QualifiedNameTableRecord>,
    /// Experimental opt-in annotations (class reference only).
    pub annotations: Vec<AnnotationRecord>,
}

impl HeaderRecord {
    /// True when the producer was a pre-release build.
    pub const fn is_pre_release(&self) -> bool {
        self.flags & header_flags::PRE_RELEASE != 0
    }

    /// Check every annotation reference against the header's own tables.
    pub fn validate(&self) -> Result<(), CorruptionError> {
        let empty_strings = StringTableRecord::default();
        let empty_names = QualifiedNameTableRecord::default();
        let tables = NameTables::new(
            self.strings.as_ref().unwrap_or(&empty_strings),
            self.qualified_names.as_ref().unwrap_or(&empty_names),
        );
        tables.check_tables()?;
        self.annotations.iter().try_for_each(|a| a.validate(&tables))
    }
}

impl Encode for HeaderRecord {
    fn encode(&self, writer: &mut Writer) {
        if let Some(name) = &self.package_fq_name {
            writer.string_field(1, name);
        }
        if self.flags != 0 {
            writer.uint_field(2, u64::from(self.flags));
        }
        if let Some(strings) = &self.strings {
            writer.message_field(3, strings);
        }
        if let Some(names) = &self.qualified_names {
            writer.message_field(4, names);
        }
        writer.repeated_message_field(5, &self.annotations);
    }
}

impl Decode for HeaderRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.package_fq_name = Some(reader.read_string(field, wire)?),
                2 => out.flags = reader.read_u32(field, wire)?,
                3 => out.strings = Some(reader.read_message(field, wire)?),
                4 => out.qualified_names = Some(reader.read_message(field, wire)?),
                5 => out.annotations.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::{decode_from_bytes, encode_to_vec};

    #[test]
    fn module_header_without_options_is_empty_on_the_wire() {
        assert!(encode_to_vec(&HeaderRecord::default()).is_empty());
    }

    #[test]
    fn package_header_carries_name_and_flags() {
        let header = HeaderRecord {
            package_fq_name: Some("a.b".into()),
            flags: header_flags::PRE_RELEASE,
            ..HeaderRecord::default()
        };
        let bytes = encode_to_vec(&header);
        assert_eq!(hex::encode(&bytes), "0a03612e62 1001".replace(' ', ""));
        let back: HeaderRecord = decode_from_bytes(&bytes).unwrap();
        assert!(back.is_pre_release());
        assert_eq!(back, header);
    }

    #[test]
    fn annotation_without_tables_fails_validation() {
        let header = HeaderRecord {
            annotations: vec![AnnotationRecord::default()],
            ..HeaderRecord::default()
        };
        assert!(header.validate().is_err());
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Library container: module kind, imports and every package fragment.

use crate::codec::{Decode, Encode, Reader, Writer};
use crate::error::CorruptionError;
use crate::fragment::PackageFragmentRecord;

/// Module wrapping convention as carried on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ModuleKindRecord {
    /// Plain script (the default; never written).
    #[default]
    Plain,
    /// AMD `define`.
    Amd,
    /// CommonJS `require`.
    CommonJs,
    /// Universal module definition.
    Umd,
}

impl ModuleKindRecord {
    /// Raw wire value.
    pub const fn to_wire(self) -> u64 {
        match self {
            Self::Plain => 0,
            Self::Amd => 1,
            Self::CommonJs => 2,
            Self::Umd => 3,
        }
    }

    /// Parse a raw wire value; unknown values read as [`ModuleKindRecord::Plain`].
    pub const fn from_wire(value: u64) -> Self {
        match value {
            1 => Self::Amd,
            2 => Self::CommonJs,
            3 => Self::Umd,
            _ => Self::Plain,
        }
    }
}

/// Whole-library record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryRecord {
    /// Module kind.
    pub kind: ModuleKindRecord,
    /// Fragments sorted by package name.
    pub package_fragments: Vec<PackageFragmentRecord>,
    /// Imported module names in declaration order.
    pub imported_modules: Vec<String>,
}

impl Encode for LibraryRecord {
    fn encode(&self, writer: &mut Writer) {
        if self.kind != ModuleKindRecord::Plain {
            writer.uint_field(1, self.kind.to_wire());
        }
        writer.repeated_message_field(2, &self.package_fragments);
        for module in &self.imported_modules {
            writer.string_field(3, module);
        }
    }
}

impl Decode for LibraryRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.kind = ModuleKindRecord::from_wire(reader.read_uint(field, wire)?),
                2 => out.package_fragments.push(reader.read_message(field, wire)?),
                3 => out.imported_modules.push(reader.read_string(field, wire)?),
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
    fn plain_kind_is_not_written() {
        let library = LibraryRecord::default();
        assert!(encode_to_vec(&library).is_empty());
        let back: LibraryRecord = decode_from_bytes(&[]).unwrap();
        assert_eq!(back.kind, ModuleKindRecord::Plain);
    }

    #[test]
    fn unknown_kind_reads_as_plain() {
        let mut w = Writer::default();
        w.uint_field(1, 17);
        let back: LibraryRecord = decode_from_bytes(&w.into_vec()).unwrap();
        assert_eq!(back.kind, ModuleKindRecord::Plain);
    }

    #[test]
    fn import_order_is_preserved() {
        let library = LibraryRecord {
            kind: ModuleKindRecord::CommonJs,
            package_fragments: vec![],
            imported_modules: vec!["zeta".into(), "alpha".into()],
        };
        let back: LibraryRecord = decode_from_bytes(&encode_to_vec(&library)).unwrap();
        assert_eq!(back.imported_modules, vec!["zeta", "alpha"]);
        assert_eq!(back.kind, ModuleKindRecord::CommonJs);
    }
}

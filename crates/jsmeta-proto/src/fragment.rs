// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Package fragment: everything one package contributes, with its own tables.

use std::collections::BTreeSet;

use crate::annotation::AnnotationRecord;
use crate::codec::{Decode, Encode, Reader, Writer};
use crate::declaration::{ClassRecord, PackageRecord};
use crate::error::CorruptionError;
use crate::tables::{NameTables, QualifiedNameTableRecord, StringTableRecord};

/// Field number of the per-file annotation table inside a fragment.
pub const FILES_FIELD: u32 = 100;

/// Annotations attached to one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    /// Explicit file id; absent when the id equals the record's position.
    pub id: Option<u32>,
    /// File-level annotations (source-only ones already removed).
    pub annotations: Vec<AnnotationRecord>,
}

/// Per-file annotation table of a fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilesRecord {
    /// Files in ascending id order.
    pub files: Vec<FileRecord>,
}

impl FilesRecord {
    /// Resolve each file's id, reading an absent id as the file's position.
    pub fn resolved_ids(&self) -> Vec<u32> {
        self.files
            .iter()
            .zip(0u32..)
            .map(|(file, position)| file.id.unwrap_or(position))
            .collect()
    }

    /// Find the annotations recorded for file `id`.
    pub fn annotations_for(&self, id: u32) -> Option<&[AnnotationRecord]> {
        self.resolved_ids()
            .into_iter()
            .position(|candidate| candidate == id)
            .map(|i| self.files[i].annotations.as_slice())
    }
}

/// Serialized form of one package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageFragmentRecord {
    /// Fragment-local string table.
    pub strings: StringTableRecord,
    /// Fragment-local qualified-name table.
    pub qualified_names: QualifiedNameTableRecord,
    /// Top-level functions, properties and type aliases.
    pub package: PackageRecord,
    /// Classes, nested ones included, in pre-order.
    pub classes: Vec<ClassRecord>,
    /// Per-file annotations.
    pub files: FilesRecord,
}

impl PackageFragmentRecord {
    /// A fragment with no classes and no top-level members is never emitted.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.package.is_empty()
    }

    /// View over this fragment's tables.
    pub fn tables(&self) -> NameTables<'_> {
        NameTables::new(&self.strings, &self.qualified_names)
    }

    /// Check that every index in the fragment resolves in its own tables.
    pub fn validate(&self) -> Result<(), CorruptionError> {
        let tables = self.tables();
        tables.check_tables()?;
        self.package.validate(&tables)?;
        self.classes.iter().try_for_each(|c| c.validate(&tables))?;
        self.files
            .files
            .iter()
            .flat_map(|f| f.annotations.iter())
            .try_for_each(|a| a.validate(&tables))?;
        self.validate_file_ids()
    }

    fn validate_file_ids(&self) -> Result<(), CorruptionError> {
        let mut known = BTreeSet::new();
        for id in self.files.resolved_ids() {
            if !known.insert(id) {
                return Err(CorruptionError::DuplicateFileId(id));
            }
        }
        let members = std::iter::once(&self.package)
            .flat_map(|package| {
                package
                    .functions
                    .iter()
                    .map(|f| f.containing_file_id)
                    .chain(package.properties.iter().map(|p| p.containing_file_id))
            })
            .chain(self.classes.iter().flat_map(|c| {
                std::iter::once(c.containing_file_id)
                    .chain(c.functions.iter().map(|f| f.containing_file_id))
                    .chain(c.properties.iter().map(|p| p.containing_file_id))
            }));
        members
            .flatten()
            .find(|id| !known.contains(id))
            .map_or(Ok(()), |id| Err(CorruptionError::UnknownFileId(id)))
    }
}

impl Encode for FileRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.opt_uint_field(1, self.id);
        writer.repeated_message_field(2, &self.annotations);
    }
}

impl Decode for FileRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.id = Some(reader.read_u32(field, wire)?),
                2 => out.annotations.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

impl Encode for FilesRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.repeated_message_field(1, &self.files);
    }
}

impl Decode for FilesRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.files.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

impl Encode for PackageFragmentRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.message_field(1, &self.strings);
        writer.message_field(2, &self.qualified_names);
        writer.message_field(3, &self.package);
        writer.repeated_message_field(4, &self.classes);
        writer.message_field(FILES_FIELD, &self.files);
    }
}

impl Decode for PackageFragmentRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.strings = reader.read_message(field, wire)?,
                2 => out.qualified_names = reader.read_message(field, wire)?,
                3 => out.package = reader.read_message(field, wire)?,
                4 => out.classes.push(reader.read_message(field, wire)?),
                FILES_FIELD => out.files = reader.read_message(field, wire)?,
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

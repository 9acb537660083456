// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mutable state threaded through every serializer call of one fragment.

use std::sync::Arc;

use jsmeta_proto::AnnotationRecord;

use crate::annotation::AnnotationEncoder;
use crate::descriptor::{Annotation, SourceFile};
use crate::error::Result;
use crate::file_registry::FileRegistry;
use crate::name::FqName;
use crate::settings::Settings;
use crate::string_table::StringTable;

/// String table, file registry and annotation encoder for one fragment.
///
/// Created fresh for each fragment and consumed when the fragment is
/// finished; never shared between fragments.
#[derive(Debug)]
pub struct SerializerContext<'s> {
    strings: StringTable,
    files: FileRegistry,
    annotations: AnnotationEncoder,
    settings: &'s Settings,
}

impl<'s> SerializerContext<'s> {
    /// Empty context bound to `settings`.
    pub fn new(settings: &'s Settings) -> Self {
        Self {
            strings: StringTable::new(),
            files: FileRegistry::new(),
            annotations: AnnotationEncoder::new(settings.annotation_depth_limit()),
            settings,
        }
    }

    /// Settings of the current pass.
    pub const fn settings(&self) -> &'s Settings {
        self.settings
    }

    /// Intern a simple name.
    pub fn string(&mut self, value: &str) -> u32 {
        self.strings.intern(value)
    }

    /// Intern a fully-qualified name.
    pub fn name(&mut self, name: &FqName) -> u32 {
        self.strings.fq_name_index(name)
    }

    /// Register the declaring file, if any, and return its id.
    pub fn file_id(&mut self, source: Option<&Arc<SourceFile>>) -> Option<u32> {
        source.map(|file| self.files.id_for(file))
    }

    /// Encode the annotations that survive into metadata.
    pub fn annotations(&mut self, annotations: &[Annotation]) -> Result<Vec<AnnotationRecord>> {
        self.annotations.encode_retained(annotations, &mut self.strings)
    }

    /// Read-only view of the string table.
    pub const fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Read-only view of the file registry.
    pub const fn files(&self) -> &FileRegistry {
        &self.files
    }

    /// Split into the finished table and registry.
    pub fn finish(self) -> (StringTable, FileRegistry) {
        (self.strings, self.files)
    }
}

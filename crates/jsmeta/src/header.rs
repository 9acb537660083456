// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Module and package headers.

use jsmeta_proto::header::header_flags;
use jsmeta_proto::{
    AnnotationRecord, CorruptionError, HeaderRecord, NameTables, QualifiedNameTableRecord,
    StringTableRecord,
};
use tracing::debug;

use crate::module::ModuleDescriptor;
use crate::name::FqName;
use crate::settings::Settings;
use crate::string_table::StringTable;

/// Build a header; `package` is set for per-package blobs only.
///
/// Experimental annotation names that do not resolve to a class of `module`
/// are left out. Once any names are configured the header carries its own
/// tables, even if none of them resolved.
pub fn serialize_header(
    module: &dyn ModuleDescriptor,
    settings: &Settings,
    package: Option<&FqName>,
) -> HeaderRecord {
    let mut header = HeaderRecord {
        package_fq_name: package.map(|p| p.as_str().to_owned()),
        ..HeaderRecord::default()
    };
    if settings.pre_release {
        header.flags |= header_flags::PRE_RELEASE;
    }
    if settings.experimental_annotations.is_empty() {
        return header;
    }
    let mut strings = StringTable::new();
    for name in &settings.experimental_annotations {
        let fq_name = FqName::new(name.as_str());
        let Some(class) = module.resolve_class(&fq_name) else {
            debug!(annotation = %fq_name, "experimental annotation not found in module, skipped");
            continue;
        };
        header.annotations.push(AnnotationRecord {
            id: strings.fq_name_index(&class.fq_name),
            arguments: Vec::new(),
        });
    }
    let (strings, names) = strings.into_records();
    header.strings = Some(strings);
    header.qualified_names = Some(names);
    header
}

/// Decoded header with every reference resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Package of a per-package header.
    pub package: Option<FqName>,
    /// Producer was a pre-release build.
    pub pre_release: bool,
    /// Experimental opt-in annotation classes.
    pub experimental_annotations: Vec<FqName>,
}

impl HeaderInfo {
    /// Resolve a header record through its private tables.
    pub fn from_record(record: &HeaderRecord) -> Result<Self, CorruptionError> {
        record.validate()?;
        let empty_strings = StringTableRecord::default();
        let empty_names = QualifiedNameTableRecord::default();
        let tables = NameTables::new(
            record.strings.as_ref().unwrap_or(&empty_strings),
            record.qualified_names.as_ref().unwrap_or(&empty_names),
        );
        let experimental_annotations = record
            .annotations
            .iter()
            .map(|a| tables.dotted_name(a.id).map(FqName::new))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            package: record.package_fq_name.as_deref().map(FqName::new),
            pre_release: record.is_pre_release(),
            experimental_annotations,
        })
    }
}

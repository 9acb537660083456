// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Whole-library container: gzip over a delimited header and the library record.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use jsmeta_proto::{
    decode_from_bytes, encode_to_vec, write_delimited, HeaderRecord, LibraryRecord, ModuleKindRecord,
    PackageFragmentRecord, Reader,
};
use tracing::instrument;

use crate::descriptor::ModuleKind;
use crate::error::{MetadataError, Result};

impl From<ModuleKind> for ModuleKindRecord {
    fn from(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Plain => Self::Plain,
            ModuleKind::Amd => Self::Amd,
            ModuleKind::CommonJs => Self::CommonJs,
            ModuleKind::Umd => Self::Umd,
        }
    }
}

impl From<ModuleKindRecord> for ModuleKind {
    fn from(kind: ModuleKindRecord) -> Self {
        match kind {
            ModuleKindRecord::Plain => Self::Plain,
            ModuleKindRecord::Amd => Self::Amd,
            ModuleKindRecord::CommonJs => Self::CommonJs,
            ModuleKindRecord::Umd => Self::Umd,
        }
    }
}

/// Everything a whole-library artifact carries, decoded and validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryParts {
    /// Module header (no package name).
    pub header: HeaderRecord,
    /// Module kind; unknown wire values read as [`ModuleKind::Plain`].
    pub kind: ModuleKind,
    /// Imported modules in import order.
    pub imported_modules: Vec<String>,
    /// Fragments in the order they were written (sorted by package name).
    pub fragments: Vec<PackageFragmentRecord>,
}

impl LibraryParts {
    /// Uncompressed payload: delimited header followed by the library record.
    pub fn encode_payload(&self) -> Vec<u8> {
        let library = LibraryRecord {
            kind: self.kind.into(),
            package_fragments: self.fragments.clone(),
            imported_modules: self.imported_modules.clone(),
        };
        let mut out = Vec::new();
        write_delimited(&self.header, &mut out);
        out.extend_from_slice(&encode_to_vec(&library));
        out
    }

    /// Decode an uncompressed payload and check every table reference.
    pub fn decode_payload(payload: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(payload);
        let header: HeaderRecord = reader.read_delimited()?;
        let library: LibraryRecord = decode_from_bytes(reader.take_rest())?;
        header.validate()?;
        for fragment in &library.package_fragments {
            fragment.validate()?;
        }
        Ok(Self {
            header,
            kind: library.kind.into(),
            imported_modules: library.imported_modules,
            fragments: library.package_fragments,
        })
    }
}

/// Gzip `payload`. Output is byte-stable: the gzip header carries no timestamp.
pub fn compress(payload: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

/// Inflate a gzip stream.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut payload)
        .map_err(MetadataError::Decompression)?;
    Ok(payload)
}

/// Read a whole-library artifact.
#[instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn read_module(bytes: &[u8]) -> Result<LibraryParts> {
    LibraryParts::decode_payload(&decompress(bytes)?)
}

/// Write a whole-library artifact to `out`.
pub fn write_module<W: Write>(parts: &LibraryParts, out: &mut W) -> Result<()> {
    out.write_all(&compress(&parts.encode_payload())?)?;
    Ok(())
}

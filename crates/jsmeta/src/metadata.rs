// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serialization pass over a whole module and the per-package read path.
//!
//! A pass enumerates every package reachable from the root (the root itself
//! included), encodes each one, drops empty fragments and keeps the rest keyed
//! by package name. The result can be rendered as one gzip artifact, as one
//! blob per package, or as a line of text.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;

use jsmeta_proto::{
    decode_from_bytes, encode_to_vec, write_delimited, CorruptionError, HeaderRecord,
    PackageFragmentRecord, Reader, Writer,
};
use tracing::{debug, info, instrument};

use crate::container::{compress, LibraryParts};
use crate::descriptor::ModuleKind;
use crate::error::{MetadataError, Result};
use crate::fragment::FragmentEncoder;
use crate::header::serialize_header;
use crate::module::ModuleDescriptor;
use crate::name::FqName;
use crate::serializer::{DeclarationSerializer, DescriptorSerializer, EmitPolicy, ModuleOwnership};
use crate::settings::Settings;
use crate::text::format_text;

/// Binary ABI version written into textual carriers.
pub const ABI_VERSION: u32 = 4;

/// File suffix of per-package blobs.
pub const PACKAGE_FILE_SUFFIX: &str = "kjsm";

/// Schema version prefixed to every per-package blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetadataVersion {
    /// Major component; readers reject any other major.
    pub major: i32,
    /// Minor component; readers reject newer minors.
    pub minor: i32,
    /// Patch component.
    pub patch: i32,
}

impl MetadataVersion {
    /// Version this crate writes and reads.
    pub const CURRENT: Self = Self::new(1, 2, 6);

    /// Build from components.
    pub const fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self { major, minor, patch }
    }

    /// Components in wire order.
    pub const fn to_array(self) -> [i32; 3] {
        [self.major, self.minor, self.patch]
    }

    /// Build from wire components; missing trailing components read as 0.
    pub fn from_components(components: &[i32]) -> Self {
        let at = |i: usize| components.get(i).copied().unwrap_or(0);
        Self::new(at(0), at(1), at(2))
    }

    /// True when [`MetadataVersion::CURRENT`] can read data of this version.
    pub const fn is_compatible(self) -> bool {
        self.major == Self::CURRENT.major && self.minor <= Self::CURRENT.minor
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Relative path of the per-package blob for `package`, e.g. `a/b/b.kjsm`.
pub fn package_file_path(package: &FqName) -> String {
    let short = if package.is_root() {
        "root-package"
    } else {
        package.short_name()
    };
    let mut segments = package.segments();
    segments.push(short);
    format!("{}.{PACKAGE_FILE_SUFFIX}", segments.join("/"))
}

/// Hex-displayed BLAKE3 digest of a whole-library payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Hash `payload`.
    pub fn of(payload: &[u8]) -> Self {
        Self(*blake3::hash(payload).as_bytes())
    }

    /// Raw digest bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// One per-package blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPackage {
    /// Package name.
    pub fq_name: FqName,
    /// Version prefix, package header and fragment bytes.
    pub bytes: Vec<u8>,
}

impl SerializedPackage {
    /// Relative file path for this blob.
    pub fn file_path(&self) -> String {
        package_file_path(&self.fq_name)
    }
}

/// Output of one serialization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedMetadata {
    module_name: String,
    kind: ModuleKind,
    imported_modules: Vec<String>,
    header: HeaderRecord,
    fragments: BTreeMap<FqName, PackageFragmentRecord>,
}

impl SerializedMetadata {
    /// Module name.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Module-scoped header.
    pub const fn header(&self) -> &HeaderRecord {
        &self.header
    }

    /// Non-empty fragments keyed by package, sorted.
    pub const fn fragments(&self) -> &BTreeMap<FqName, PackageFragmentRecord> {
        &self.fragments
    }

    /// Container view of this pass.
    pub fn to_parts(&self) -> LibraryParts {
        LibraryParts {
            header: self.header.clone(),
            kind: self.kind,
            imported_modules: self.imported_modules.clone(),
            fragments: self.fragments.values().cloned().collect(),
        }
    }

    /// Uncompressed whole-library payload.
    pub fn payload(&self) -> Vec<u8> {
        self.to_parts().encode_payload()
    }

    /// Compressed whole-library artifact.
    pub fn as_bytes(&self) -> Result<Vec<u8>> {
        compress(&self.payload())
    }

    /// Write the compressed artifact to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.as_bytes()?)?;
        Ok(())
    }

    /// Textual carrier line for embedding in generated code.
    pub fn as_text(&self) -> Result<String> {
        Ok(format_text(ABI_VERSION, &self.module_name, &self.as_bytes()?))
    }

    /// BLAKE3 of [`SerializedMetadata::payload`].
    pub fn fingerprint(&self) -> ContentHash {
        ContentHash::of(&self.payload())
    }

    /// One blob per fragment, sorted by package name.
    pub fn serialized_packages(&self) -> Vec<SerializedPackage> {
        self.fragments
            .iter()
            .map(|(fq_name, fragment)| {
                let header = HeaderRecord {
                    package_fq_name: Some(fq_name.as_str().to_owned()),
                    ..self.header.clone()
                };
                SerializedPackage {
                    fq_name: fq_name.clone(),
                    bytes: encode_package(MetadataVersion::CURRENT, &header, fragment),
                }
            })
            .collect()
    }
}

/// Per-package framing: version array, delimited header, raw fragment.
pub fn encode_package(
    version: MetadataVersion,
    header: &HeaderRecord,
    fragment: &PackageFragmentRecord,
) -> Vec<u8> {
    let components = version.to_array();
    let mut writer = Writer::default();
    writer.write_i32_be(i32::try_from(components.len()).unwrap_or(i32::MAX));
    for component in components {
        writer.write_i32_be(component);
    }
    let mut out = writer.into_vec();
    write_delimited(header, &mut out);
    out.extend_from_slice(&encode_to_vec(fragment));
    out
}

/// Decoded per-package blob.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageParts {
    /// Producer's schema version.
    pub version: MetadataVersion,
    /// Package-scoped header.
    pub header: HeaderRecord,
    /// The package's fragment.
    pub fragment: PackageFragmentRecord,
}

/// Read a per-package blob, rejecting incompatible versions.
#[instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn read_package(bytes: &[u8]) -> Result<PackageParts> {
    let mut reader = Reader::new(bytes);
    let count = reader.read_i32_be()?;
    let count = usize::try_from(count).map_err(|_| CorruptionError::LengthTooLarge {
        len: u64::from(count.unsigned_abs()),
        remaining: bytes.len(),
    })?;
    let components = (0..count)
        .map(|_| reader.read_i32_be())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let version = MetadataVersion::from_components(&components);
    if !version.is_compatible() {
        return Err(MetadataError::IncompatibleVersion {
            found: version,
            supported: MetadataVersion::CURRENT,
        });
    }
    let header: HeaderRecord = reader.read_delimited()?;
    let fragment: PackageFragmentRecord = decode_from_bytes(reader.take_rest())?;
    header.validate()?;
    fragment.validate()?;
    Ok(PackageParts {
        version,
        header,
        fragment,
    })
}

/// Configurable serialization pass.
pub struct MetadataSerializer<'a> {
    settings: &'a Settings,
    policy: Option<&'a dyn EmitPolicy>,
    serializer: &'a dyn DeclarationSerializer,
}

impl<'a> MetadataSerializer<'a> {
    /// Pass with the default policy and serializer.
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            policy: None,
            serializer: &DescriptorSerializer,
        }
    }

    /// Replace the emit policy.
    pub fn with_policy(mut self, policy: &'a dyn EmitPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Replace the declaration serializer.
    pub fn with_serializer(mut self, serializer: &'a dyn DeclarationSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Serialize every non-empty package of `module`.
    ///
    /// Any error aborts the pass; nothing partial is returned.
    #[instrument(skip_all, fields(module = module.name()))]
    pub fn serialize(&self, module: &dyn ModuleDescriptor) -> Result<SerializedMetadata> {
        let ownership = ModuleOwnership::new(module.module_id());
        let policy: &dyn EmitPolicy = match self.policy {
            Some(policy) => policy,
            None => &ownership,
        };
        let encoder = FragmentEncoder::new(module, policy, self.serializer, self.settings);

        let mut fragments = BTreeMap::new();
        for package in package_names(module) {
            let fragment = encoder.encode(&package)?;
            if fragment.is_empty() {
                debug!(package = %package, "empty fragment dropped");
                continue;
            }
            fragments.insert(package, fragment);
        }

        let metadata = SerializedMetadata {
            module_name: module.name().to_owned(),
            kind: module.kind(),
            imported_modules: module.imported_modules().to_vec(),
            header: serialize_header(module, self.settings, None),
            fragments,
        };
        let payload = metadata.payload();
        info!(
            fragments = metadata.fragments.len(),
            bytes = payload.len(),
            fingerprint = %ContentHash::of(&payload),
            "module metadata serialized"
        );
        Ok(metadata)
    }
}

/// Serialize `module` with the default policy and serializer.
pub fn serialize_metadata(
    module: &dyn ModuleDescriptor,
    settings: &Settings,
) -> Result<SerializedMetadata> {
    MetadataSerializer::new(settings).serialize(module)
}

/// Every package reachable from the root, the root included, sorted.
pub fn package_names(module: &dyn ModuleDescriptor) -> BTreeSet<FqName> {
    let mut seen = BTreeSet::new();
    let mut pending = vec![FqName::root()];
    while let Some(package) = pending.pop() {
        if seen.insert(package.clone()) {
            pending.extend(module.sub_packages(&package));
        }
    }
    seen
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::{ClassDescriptor, ClassKind, FunctionDescriptor, TypeRef};
    use crate::module::ModuleGraph;

    #[test]
    fn version_compatibility_rules() {
        assert!(MetadataVersion::CURRENT.is_compatible());
        assert!(MetadataVersion::new(1, 0, 99).is_compatible());
        assert!(!MetadataVersion::new(1, 3, 0).is_compatible());
        assert!(!MetadataVersion::new(2, 0, 0).is_compatible());
        assert_eq!(MetadataVersion::from_components(&[1, 2]), MetadataVersion::new(1, 2, 0));
        assert_eq!(MetadataVersion::CURRENT.to_string(), "1.2.6");
    }

    #[test]
    fn package_paths() {
        assert_eq!(package_file_path(&FqName::new("a.b")), "a/b/b.kjsm");
        assert_eq!(package_file_path(&FqName::root()), "root-package.kjsm");
    }

    #[test]
    fn enumeration_includes_root_and_descendants() {
        let mut graph = ModuleGraph::new("m");
        graph.add_package("x.y.z");
        let names: Vec<String> = package_names(&graph)
            .into_iter()
            .map(|p| p.as_str().to_owned())
            .collect();
        assert_eq!(names, vec!["", "x", "x.y", "x.y.z"]);
    }

    #[test]
    fn per_package_blob_reads_back() {
        let mut graph = ModuleGraph::new("m");
        let id = graph.id().clone();
        graph
            .declare("a", ClassDescriptor::new("a.Foo", ClassKind::Class, &id))
            .declare("a.b", FunctionDescriptor::new("baz", &id, TypeRef::named("lib.Unit")));
        let metadata = serialize_metadata(&graph, &Settings::default()).unwrap();
        let packages = metadata.serialized_packages();
        assert_eq!(packages.len(), 2);
        assert_eq!(hex::encode(&packages[0].bytes[..16]), "00000003000000010000000200000006");
        let parts = read_package(&packages[1].bytes).unwrap();
        assert_eq!(parts.version, MetadataVersion::CURRENT);
        assert_eq!(parts.header.package_fq_name.as_deref(), Some("a.b"));
        assert_eq!(&parts.fragment, &metadata.fragments()[&FqName::new("a.b")]);
    }

    #[test]
    fn newer_minor_is_rejected() {
        let bytes = encode_package(
            MetadataVersion::new(1, 9, 0),
            &HeaderRecord::default(),
            &PackageFragmentRecord::default(),
        );
        let err = read_package(&bytes).unwrap_err();
        assert!(matches!(err, MetadataError::IncompatibleVersion { found, .. } if found.minor == 9));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let graph = ModuleGraph::new("m");
        let metadata = serialize_metadata(&graph, &Settings::default()).unwrap();
        let shown = metadata.fingerprint().to_string();
        assert_eq!(shown.len(), 64);
        assert_eq!(shown, ContentHash::of(&metadata.payload()).to_string());
    }
}

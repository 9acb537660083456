// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! jsmeta: versioned binary metadata for compiled library modules.
//!
//! A front-end hands over a [`ModuleDescriptor`]; [`serialize_metadata`]
//! walks every package reachable from the root, encodes the non-empty ones
//! against fragment-local string tables and returns [`SerializedMetadata`].
//! That result is distributed either as one gzip artifact
//! ([`SerializedMetadata::as_bytes`], read back with [`read_module`]) or as
//! one blob per package ([`SerializedMetadata::serialized_packages`], read
//! back with [`read_package`]).
//!
//! ```
//! use jsmeta::{serialize_metadata, read_module, ClassDescriptor, ClassKind, ModuleGraph, Settings};
//!
//! let mut graph = ModuleGraph::new("app");
//! let id = graph.id().clone();
//! graph.declare("a", ClassDescriptor::new("a.Foo", ClassKind::Class, &id));
//!
//! let metadata = serialize_metadata(&graph, &Settings::default())?;
//! let parts = read_module(&metadata.as_bytes()?)?;
//! assert_eq!(parts.fragments.len(), 1);
//! # Ok::<(), jsmeta::MetadataError>(())
//! ```
//!
//! Passes never share state: each fragment owns its string table and file
//! registry, so independent modules can be serialized in parallel.

pub mod annotation;
pub mod container;
pub mod context;
pub mod descriptor;
mod error;
pub mod file_registry;
pub mod fragment;
pub mod header;
pub mod metadata;
pub mod module;
pub mod name;
pub mod render;
pub mod serializer;
pub mod settings;
pub mod string_table;
pub mod text;

pub use jsmeta_proto as proto;

pub use annotation::{decode_annotation, AnnotationEncoder};
pub use container::{read_module, write_module, LibraryParts};
pub use context::SerializerContext;
pub use descriptor::{
    Annotation, ClassDescriptor, ClassKind, ConstValue, Declaration, DeclarationMeta, DeserializedFileRef,
    FileKey, FunctionDescriptor, LiveFile, ModuleId, ModuleKind, PropertyDescriptor, Retention, SourceFile,
    TypeAliasDescriptor, TypeRef, ValueParameter, WithMeta,
};
pub use error::{MetadataError, Result};
pub use file_registry::FileRegistry;
pub use fragment::FragmentEncoder;
pub use header::{serialize_header, HeaderInfo};
pub use metadata::{
    encode_package, package_file_path, package_names, read_package, serialize_metadata, ContentHash,
    MetadataSerializer, MetadataVersion, PackageParts, SerializedMetadata, SerializedPackage, ABI_VERSION,
    PACKAGE_FILE_SUFFIX,
};
pub use module::{ModuleDescriptor, ModuleGraph};
pub use name::FqName;
pub use render::dump;
pub use serializer::{DeclarationSerializer, DescriptorSerializer, EmitPolicy, ModuleOwnership, MAX_TYPE_DEPTH};
pub use settings::{Settings, MAX_ANNOTATION_DEPTH};
pub use string_table::StringTable;
pub use text::{format_text, parse_text, TextMetadata};

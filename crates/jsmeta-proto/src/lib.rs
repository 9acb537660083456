// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire records for jsmeta library metadata.
//!
//! Every record here is a plain value with a canonical [`Encode`] and a strict
//! [`Decode`]. Records reference text only through the string and
//! qualified-name tables carried next to them; `validate` methods check that
//! every such reference resolves.
//!
//! Layout of a whole-library artifact (before compression):
//!
//! ```text
//! varint(len) || HeaderRecord || LibraryRecord (to EOF)
//! ```
//!
//! Layout of a per-package artifact:
//!
//! ```text
//! i32_be(n) || i32_be(version[0]) .. i32_be(version[n-1])
//! varint(len) || HeaderRecord
//! PackageFragmentRecord (to EOF)
//! ```

pub mod annotation;
pub mod codec;
pub mod declaration;
mod error;
pub mod fragment;
pub mod header;
pub mod library;
pub mod tables;

pub use annotation::{AnnotationRecord, ArgumentRecord, ValueRecord};
pub use codec::{decode_from_bytes, encode_to_vec, write_delimited, Decode, Encode, Reader, Writer};
pub use declaration::{
    ClassKindRecord, ClassRecord, DeclarationFlags, FunctionRecord, PackageRecord, PropertyRecord,
    TypeAliasRecord, TypeRecord, ValueParameterRecord,
};
pub use error::CorruptionError;
pub use fragment::{FileRecord, FilesRecord, PackageFragmentRecord};
pub use header::HeaderRecord;
pub use library::{LibraryRecord, ModuleKindRecord};
pub use tables::{NameTables, QualifiedNameRecord, QualifiedNameTableRecord, StringTableRecord};

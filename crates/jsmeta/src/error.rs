// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for serialization and reading passes.

use jsmeta_proto::CorruptionError;

use crate::metadata::MetadataVersion;

/// Errors that abort a whole serialization or read pass.
///
/// No variant leaves partial output behind: callers get either the complete
/// result or one of these.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Input bytes are malformed or reference missing table entries.
    #[error("corrupt metadata: {0}")]
    Corruption(#[from] CorruptionError),
    /// The class serializer produced no record for a class it was handed.
    #[error("class not serialized: {0}")]
    ClassNotSerialized(String),
    /// Annotation arguments nest deeper than the configured limit.
    #[error("annotation `{annotation}` nests deeper than {limit}")]
    AnnotationTooDeep {
        /// Outermost annotation class.
        annotation: String,
        /// Configured limit.
        limit: usize,
    },
    /// Type arguments nest deeper than readers accept.
    #[error("type of `{declaration}` nests deeper than {limit}")]
    TypeTooDeep {
        /// Declaration whose type is too deep.
        declaration: String,
        /// Deepest accepted argument nesting.
        limit: usize,
    },
    /// A per-package blob was written by an incompatible producer.
    #[error("incompatible metadata version {found} (reader supports {supported})")]
    IncompatibleVersion {
        /// Version found in the blob.
        found: MetadataVersion,
        /// Version this reader implements.
        supported: MetadataVersion,
    },
    /// Gzip stream could not be inflated.
    #[error("decompression failed: {0}")]
    Decompression(#[source] std::io::Error),
    /// Writing or reading a stream failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Settings could not be parsed.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
    /// A textual carrier line is malformed.
    #[error("invalid metadata text at line {line}: {reason}")]
    InvalidText {
        /// One-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },
}

/// Result alias for jsmeta operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

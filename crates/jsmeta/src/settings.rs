// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Language-version settings that shape what a pass emits.

use std::fs;
use std::path::Path;

use jsmeta_proto::codec::MAX_NESTING;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default bound on annotation argument nesting.
pub const DEFAULT_MAX_ANNOTATION_DEPTH: usize = 64;

/// Deepest annotation nesting a reader can decode.
///
/// The outermost argument value of a member or file annotation sits six
/// records below the library (fragment, class, function, annotation, argument,
/// value) and every further level adds at most three (annotation, argument,
/// value). The innermost value may still hold an argument-less annotation.
pub const MAX_ANNOTATION_DEPTH: usize = (MAX_NESTING - 4) / 3;

/// Producer settings, usually loaded from a JSON file.
///
/// Every field has a default, so `{}` is a valid settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The producing compiler is a pre-release build (header flag bit 0).
    pub pre_release: bool,
    /// Fully-qualified names of experimental opt-in annotations to record in headers.
    pub experimental_annotations: Vec<String>,
    /// Maximum nesting of annotation argument values; never above [`MAX_ANNOTATION_DEPTH`].
    pub max_annotation_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pre_release: false,
            experimental_annotations: Vec::new(),
            max_annotation_depth: DEFAULT_MAX_ANNOTATION_DEPTH,
        }
    }
}

impl Settings {
    /// Annotation nesting bound actually enforced: the configured value,
    /// clamped to [`MAX_ANNOTATION_DEPTH`].
    pub fn annotation_depth_limit(&self) -> usize {
        self.max_annotation_depth.min(MAX_ANNOTATION_DEPTH)
    }

    /// Parse settings from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_json_slice(&bytes)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(Settings::from_json_slice(b"{}").unwrap(), Settings::default());
        assert_eq!(Settings::from_json_slice(b"  \n").unwrap(), Settings::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let settings = Settings::from_json_slice(
            br#"{ "pre_release": true, "experimental_annotations": ["lib.Experimental"] }"#,
        )
        .unwrap();
        assert!(settings.pre_release);
        assert_eq!(settings.experimental_annotations, vec!["lib.Experimental"]);
        assert_eq!(settings.max_annotation_depth, DEFAULT_MAX_ANNOTATION_DEPTH);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(Settings::from_json_slice(b"{ nope").is_err());
    }

    #[test]
    fn annotation_depth_is_clamped_to_what_readers_accept() {
        assert_eq!(Settings::default().annotation_depth_limit(), DEFAULT_MAX_ANNOTATION_DEPTH);
        let settings = Settings::from_json_slice(br#"{ "max_annotation_depth": 1000 }"#).unwrap();
        assert_eq!(settings.annotation_depth_limit(), MAX_ANNOTATION_DEPTH);
        assert_eq!(MAX_ANNOTATION_DEPTH, 84);
    }

    #[test]
    fn json_round_trip() {
        let settings = Settings {
            pre_release: true,
            experimental_annotations: vec!["x.Y".into()],
            max_annotation_depth: 8,
        };
        let back = Settings::from_json_slice(&settings.to_json().unwrap()).unwrap();
        assert_eq!(back, settings);
    }
}

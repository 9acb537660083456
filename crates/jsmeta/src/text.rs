// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Textual carrier for embedding whole-library metadata in generated code.
//!
//! One line per module:
//!
//! ```text
//! // jsmeta.module_metadata(4, "my-module", "H4sIAAAAAAAA/...");
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{MetadataError, Result};

const MARKER: &str = "// jsmeta.module_metadata(";
const TERMINATOR: &str = ");";

/// One carrier line, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMetadata {
    /// ABI version written by the producer.
    pub abi_version: u32,
    /// Module name.
    pub module_name: String,
    /// Compressed whole-library bytes.
    pub bytes: Vec<u8>,
}

/// Render one carrier line. Strings are JSON-quoted.
pub fn format_text(abi_version: u32, module_name: &str, bytes: &[u8]) -> String {
    let name = serde_json::Value::from(module_name);
    let body = serde_json::Value::from(STANDARD.encode(bytes));
    format!("{MARKER}{abi_version}, {name}, {body}{TERMINATOR}")
}

/// Collect every carrier line in `text`; other lines are ignored.
pub fn parse_text(text: &str) -> Result<Vec<TextMetadata>> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            line.trim_start()
                .strip_prefix(MARKER)
                .map(|rest| parse_line(index + 1, rest))
        })
        .collect()
}

fn parse_line(line: usize, rest: &str) -> Result<TextMetadata> {
    let invalid = |reason: String| MetadataError::InvalidText { line, reason };
    let arguments = rest
        .trim_end()
        .strip_suffix(TERMINATOR)
        .ok_or_else(|| invalid(format!("missing `{TERMINATOR}`")))?;
    let (abi, strings) = arguments
        .split_once(',')
        .ok_or_else(|| invalid("missing arguments".to_owned()))?;
    let abi_version = abi
        .trim()
        .parse::<u32>()
        .map_err(|e| invalid(format!("bad abi version: {e}")))?;
    let (module_name, encoded): (String, String) = serde_json::from_str(&format!("[{strings}]"))
        .map_err(|e| invalid(format!("bad string arguments: {e}")))?;
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| invalid(format!("bad base64: {e}")))?;
    Ok(TextMetadata {
        abi_version,
        module_name,
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn carrier_line_round_trips_and_quotes_names() {
        let line = format_text(4, "we\"ird", &[0x1f, 0x8b, 0x00]);
        assert_eq!(line, r#"// jsmeta.module_metadata(4, "we\"ird", "H4sA");"#);
        let parsed = parse_text(&format!("var x = 1;\n    {line}\n")).unwrap();
        assert_eq!(
            parsed,
            vec![TextMetadata {
                abi_version: 4,
                module_name: "we\"ird".into(),
                bytes: vec![0x1f, 0x8b, 0x00],
            }]
        );
    }

    #[test]
    fn text_without_marker_yields_nothing() {
        assert!(parse_text("// just a comment\nfoo();").unwrap().is_empty());
    }

    #[test]
    fn malformed_lines_report_their_position() {
        let text = "\n// jsmeta.module_metadata(4, \"m\", \"!!!\");";
        let err = parse_text(text).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidText { line: 2, .. }));

        let err = parse_text("// jsmeta.module_metadata(x, \"m\", \"\");").unwrap_err();
        assert!(matches!(err, MetadataError::InvalidText { line: 1, .. }));

        let err = parse_text("// jsmeta.module_metadata(4, \"m\", \"\")").unwrap_err();
        assert!(matches!(err, MetadataError::InvalidText { line: 1, .. }));
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Readers reject damaged or foreign input with typed errors.

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::scenario_graph;
use jsmeta::container::compress;
use jsmeta::proto::{
    encode_to_vec, ClassRecord, CorruptionError, FunctionRecord, HeaderRecord, PackageFragmentRecord,
    PackageRecord, QualifiedNameRecord, QualifiedNameTableRecord, StringTableRecord, Writer,
};
use jsmeta::{
    encode_package, read_module, read_package, serialize_metadata, MetadataError, MetadataVersion, Settings,
};
use proptest::prelude::*;

fn package_blob(version: [i32; 3], fragment_bytes: &[u8]) -> Vec<u8> {
    let mut w = Writer::default();
    w.write_i32_be(3);
    for component in version {
        w.write_i32_be(component);
    }
    w.write_delimited(&HeaderRecord::default());
    w.write_bytes(fragment_bytes);
    w.into_vec()
}

// =============================================================================
// WHOLE-LIBRARY ARTIFACTS
// =============================================================================

#[test]
fn non_gzip_input_is_a_decompression_error() {
    let err = read_module(b"not a gzip stream").unwrap_err();
    assert!(matches!(err, MetadataError::Decompression(_)));
}

#[test]
fn cut_gzip_stream_is_a_decompression_error() {
    let bytes = serialize_metadata(&scenario_graph(), &Settings::default())
        .unwrap()
        .as_bytes()
        .unwrap();
    let err = read_module(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, MetadataError::Decompression(_)));
}

#[test]
fn truncated_payload_is_corruption() {
    let payload = serialize_metadata(&scenario_graph(), &Settings::default())
        .unwrap()
        .payload();
    let bytes = compress(&payload[..payload.len() - 1]).unwrap();
    let err = read_module(&bytes).unwrap_err();
    assert!(matches!(err, MetadataError::Corruption(_)), "got {err:?}");
}

// =============================================================================
// PER-PACKAGE BLOBS
// =============================================================================

#[test]
fn unknown_value_tag_is_reported() {
    let mut value = Writer::default();
    value.uint_field(1, 99);
    let mut argument = Writer::default();
    argument.uint_field(1, 0);
    argument.bytes_field(2, &value.into_vec());
    let mut annotation = Writer::default();
    annotation.uint_field(1, 0);
    annotation.bytes_field(2, &argument.into_vec());
    let mut class = Writer::default();
    class.uint_field(2, 0);
    class.bytes_field(9, &annotation.into_vec());
    let mut fragment = Writer::default();
    fragment.bytes_field(4, &class.into_vec());

    let err = read_package(&package_blob([1, 2, 6], &fragment.into_vec())).unwrap_err();
    assert!(matches!(
        err,
        MetadataError::Corruption(CorruptionError::UnknownValueTag(99))
    ));
}

#[test]
fn dangling_name_index_is_reported() {
    let fragment = PackageFragmentRecord {
        classes: vec![ClassRecord {
            fq_name: 5,
            ..ClassRecord::default()
        }],
        ..PackageFragmentRecord::default()
    };
    let err = read_package(&package_blob([1, 2, 6], &encode_to_vec(&fragment))).unwrap_err();
    assert!(matches!(
        err,
        MetadataError::Corruption(CorruptionError::QualifiedNameIndexOutOfRange { index: 5, .. })
    ));
}

#[test]
fn unlisted_file_reference_is_reported() {
    let fragment = PackageFragmentRecord {
        strings: StringTableRecord {
            strings: vec!["f".into()],
        },
        qualified_names: QualifiedNameTableRecord {
            names: vec![QualifiedNameRecord {
                segments: vec![0],
                is_local: false,
            }],
        },
        package: PackageRecord {
            functions: vec![FunctionRecord {
                containing_file_id: Some(42),
                ..FunctionRecord::default()
            }],
            ..PackageRecord::default()
        },
        ..PackageFragmentRecord::default()
    };
    let err = read_package(&package_blob([1, 2, 6], &encode_to_vec(&fragment))).unwrap_err();
    assert!(matches!(
        err,
        MetadataError::Corruption(CorruptionError::UnknownFileId(42))
    ));
}

#[test]
fn incompatible_versions_are_refused() {
    let fragment = encode_to_vec(&PackageFragmentRecord::default());
    for version in [[2, 0, 0], [1, 9, 0], [0, 2, 6]] {
        let err = read_package(&package_blob(version, &fragment)).unwrap_err();
        assert!(
            matches!(err, MetadataError::IncompatibleVersion { found, .. } if found.to_array() == version),
            "{version:?} accepted"
        );
    }
}

#[test]
fn older_minor_versions_are_accepted() {
    let header = HeaderRecord::default();
    let fragment = PackageFragmentRecord::default();
    for version in [MetadataVersion::new(1, 0, 0), MetadataVersion::new(1, 1, 9), MetadataVersion::CURRENT] {
        let parts = read_package(&encode_package(version, &header, &fragment)).unwrap();
        assert_eq!(parts.version, version);
    }
}

#[test]
fn negative_version_count_is_refused() {
    let mut w = Writer::default();
    w.write_i32_be(-1);
    let err = read_package(&w.into_vec()).unwrap_err();
    assert!(matches!(
        err,
        MetadataError::Corruption(CorruptionError::LengthTooLarge { .. })
    ));
}

// =============================================================================
// NO PANICS ON ARBITRARY INPUT
// =============================================================================

proptest! {
    #[test]
    fn fuzz_read_module_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = read_module(&bytes);
        if let Ok(gz) = compress(&bytes) {
            let _ = read_module(&gz);
        }
    }

    #[test]
    fn fuzz_read_package_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = read_package(&bytes);
        let _ = read_package(&package_blob([1, 2, 6], &bytes));
    }
}

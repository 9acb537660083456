// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoders must reject garbage cleanly, never panic.

use jsmeta_proto::codec::{Reader, Writer};
use jsmeta_proto::{
    decode_from_bytes, encode_to_vec, HeaderRecord, LibraryRecord, PackageFragmentRecord,
    StringTableRecord, ValueRecord,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn fuzz_fragment_decode_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        if let Ok(fragment) = decode_from_bytes::<PackageFragmentRecord>(&bytes) {
            // Whatever decodes must either validate or report corruption.
            let _ = fragment.validate();
        }
    }

    #[test]
    fn fuzz_header_and_library_decode_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_from_bytes::<HeaderRecord>(&bytes);
        let _ = decode_from_bytes::<LibraryRecord>(&bytes);
        let _ = decode_from_bytes::<ValueRecord>(&bytes);
    }

    #[test]
    fn varints_round_trip(value in any::<u64>()) {
        let mut w = Writer::default();
        w.write_varint(value);
        let bytes = w.into_vec();
        prop_assert!(bytes.len() <= 10);
        let mut r = Reader::new(&bytes);
        prop_assert_eq!(r.read_varint().unwrap(), value);
        prop_assert!(r.is_at_end());
    }

    #[test]
    fn string_tables_round_trip(strings in prop::collection::vec(".{0,12}", 0..16)) {
        let table = StringTableRecord { strings };
        let back: StringTableRecord = decode_from_bytes(&encode_to_vec(&table)).unwrap();
        prop_assert_eq!(back, table);
    }

    #[test]
    fn truncated_string_tables_never_decode_to_the_original(
        strings in prop::collection::vec("[a-z]{1,8}", 1..8),
        cut in 1usize..8,
    ) {
        let table = StringTableRecord { strings };
        let bytes = encode_to_vec(&table);
        let cut = cut.min(bytes.len());
        let truncated = &bytes[..bytes.len() - cut];
        if let Ok(back) = decode_from_bytes::<StringTableRecord>(truncated) {
            prop_assert_ne!(back, table);
        }
    }
}

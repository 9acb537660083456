// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Append-only interner for strings and qualified names.

use std::collections::HashMap;

use jsmeta_proto::{QualifiedNameRecord, QualifiedNameTableRecord, StringTableRecord};

use crate::name::FqName;

/// Deduplicating table builder for one fragment or header.
///
/// Interning is idempotent and preserves first-seen order, so an index is the
/// entry's position in the built table.
#[derive(Debug, Default)]
pub struct StringTable {
    strings: Vec<String>,
    string_ids: HashMap<String, u32>,
    names: Vec<QualifiedNameRecord>,
    name_ids: HashMap<QualifiedNameRecord, u32>,
}

impl StringTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value`, appending it on first sight.
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(id) = self.string_ids.get(value) {
            return *id;
        }
        let id = next_index(self.strings.len());
        self.strings.push(value.to_owned());
        self.string_ids.insert(value.to_owned(), id);
        id
    }

    /// Index of the qualified name made of `segments`, interning each segment.
    pub fn intern_qualified_name<S: AsRef<str>>(&mut self, segments: &[S], is_local: bool) -> u32 {
        let record = QualifiedNameRecord {
            segments: segments.iter().map(|s| self.intern(s.as_ref())).collect(),
            is_local,
        };
        if let Some(id) = self.name_ids.get(&record) {
            return *id;
        }
        let id = next_index(self.names.len());
        self.name_ids.insert(record.clone(), id);
        self.names.push(record);
        id
    }

    /// Index of a package or class name.
    pub fn fq_name_index(&mut self, name: &FqName) -> u32 {
        self.intern_qualified_name(&name.segments(), false)
    }

    /// Number of distinct strings.
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// Number of distinct qualified names.
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Snapshot both tables in insertion order.
    pub fn build(&self) -> (StringTableRecord, QualifiedNameTableRecord) {
        (
            StringTableRecord {
                strings: self.strings.clone(),
            },
            QualifiedNameTableRecord {
                names: self.names.clone(),
            },
        )
    }

    /// Consume the table into its records.
    pub fn into_records(self) -> (StringTableRecord, QualifiedNameTableRecord) {
        (
            StringTableRecord {
                strings: self.strings,
            },
            QualifiedNameTableRecord { names: self.names },
        )
    }
}

// Wire indices are u32; a table never approaches that many entries.
#[allow(clippy::cast_possible_truncation)]
const fn next_index(len: usize) -> u32 {
    len as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = StringTable::new();
        let a = table.intern("a");
        let b = table.intern("b");
        assert_eq!(table.intern("a"), a);
        assert_eq!((a, b), (0, 1));
        assert_eq!(table.string_count(), 2);
    }

    #[test]
    fn qualified_names_share_segments() {
        let mut table = StringTable::new();
        let foo = table.fq_name_index(&FqName::new("a.Foo"));
        let bar = table.fq_name_index(&FqName::new("a.Bar"));
        assert_eq!(table.fq_name_index(&FqName::new("a.Foo")), foo);
        assert_ne!(foo, bar);
        let (strings, names) = table.build();
        assert_eq!(strings.strings, vec!["a", "Foo", "Bar"]);
        assert_eq!(names.names[1].segments, vec![0, 2]);
    }

    #[test]
    fn local_flag_distinguishes_names() {
        let mut table = StringTable::new();
        let member = table.intern_qualified_name(&["x"], false);
        let local = table.intern_qualified_name(&["x"], true);
        assert_ne!(member, local);
        assert_eq!(table.name_count(), 2);
        assert_eq!(table.string_count(), 1);
    }

    #[test]
    fn root_is_the_empty_name() {
        let mut table = StringTable::new();
        assert_eq!(table.fq_name_index(&FqName::root()), 0);
        let (strings, names) = table.into_records();
        assert!(strings.strings.is_empty());
        assert!(names.names[0].segments.is_empty());
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dense ids for the source files that emitted declarations come from.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{FileKey, SourceFile};

/// Assigns ids in first-seen order, starting at 0.
#[derive(Debug, Default)]
pub struct FileRegistry {
    ids: HashMap<FileKey, u32>,
    files: Vec<Arc<SourceFile>>,
}

impl FileRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `file`, registering it on first sight.
    pub fn id_for(&mut self, file: &Arc<SourceFile>) -> u32 {
        let key = file.key();
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        #[allow(clippy::cast_possible_truncation)]
        let id = self.files.len() as u32;
        self.ids.insert(key, id);
        self.files.push(Arc::clone(file));
        id
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True before any file was registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Registered files with their ids, ascending.
    pub fn snapshot(&self) -> impl Iterator<Item = (u32, &Arc<SourceFile>)> {
        (0u32..).zip(self.files.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DeserializedFileRef;
    use crate::name::FqName;

    #[test]
    fn ids_follow_first_sight() {
        let mut registry = FileRegistry::new();
        let f1 = SourceFile::live("a.kt", vec![]);
        let f2 = SourceFile::live("b.kt", vec![]);
        let f3 = SourceFile::live("c.kt", vec![]);
        assert_eq!(registry.id_for(&f1), 0);
        assert_eq!(registry.id_for(&f2), 1);
        assert_eq!(registry.id_for(&f1), 0);
        assert_eq!(registry.id_for(&f3), 2);
        let ids: Vec<u32> = registry.snapshot().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn identity_is_by_key_not_pointer() {
        let mut registry = FileRegistry::new();
        let first = SourceFile::live("same.kt", vec![]);
        let second = SourceFile::live("same.kt", vec![]);
        assert_eq!(registry.id_for(&first), registry.id_for(&second));

        let deserialized = Arc::new(SourceFile::Deserialized(DeserializedFileRef {
            package: FqName::new("a"),
            file_id: 0,
            annotations: vec![],
        }));
        assert_eq!(registry.id_for(&deserialized), 1);
        assert_eq!(registry.len(), 2);
    }
}

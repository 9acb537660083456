// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dotted fully-qualified names for packages and classes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully-qualified, dot-separated name. The root package is the empty name.
///
/// Ordering is plain string ordering, which is the ordering every emitted list
/// is sorted by.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FqName(String);

impl FqName {
    /// The root package.
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Build from dotted text.
    pub fn new(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    /// True for the root package.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Dotted text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name segments, outermost first; empty for the root.
    pub fn segments(&self) -> Vec<&str> {
        if self.is_root() {
            Vec::new()
        } else {
            self.0.split('.').collect()
        }
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches('.').count() + 1
        }
    }

    /// Last segment; empty for the root.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or_default()
    }

    /// Enclosing name, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rfind('.') {
            Some(dot) => Self(self.0[..dot].to_owned()),
            None => Self::root(),
        })
    }

    /// Append one segment.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_owned())
        } else {
            Self(format!("{}.{name}", self.0))
        }
    }

    /// True when `self` is `other` or encloses it.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.is_root()
            || other.0 == self.0
            || (other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'.'))
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for FqName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_segments() {
        let root = FqName::root();
        assert!(root.is_root());
        assert!(root.segments().is_empty());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn parent_child_and_ancestry() {
        let ab = FqName::new("a.b");
        assert_eq!(ab.parent(), Some(FqName::new("a")));
        assert_eq!(FqName::new("a").parent(), Some(FqName::root()));
        assert_eq!(FqName::root().child("a").child("b"), ab);
        assert_eq!(ab.short_name(), "b");
        assert_eq!(ab.depth(), 2);
        assert!(FqName::new("a").is_ancestor_of(&ab));
        assert!(!FqName::new("a.b").is_ancestor_of(&FqName::new("a.bc")));
        assert!(FqName::root().is_ancestor_of(&ab));
    }

    #[test]
    fn ordering_is_string_ordering() {
        let mut names = vec![FqName::new("a.b"), FqName::root(), FqName::new("a")];
        names.sort();
        assert_eq!(names, vec![FqName::root(), FqName::new("a"), FqName::new("a.b")]);
    }
}

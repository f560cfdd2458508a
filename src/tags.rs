//! Ordered, unique tag collections used for surname and keyword filters.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// An insertion-ordered set of non-empty, trimmed strings.
///
/// Membership is exact and case-sensitive. The same type backs both the
/// last-name and keyword filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag.
    ///
    /// Leading/trailing whitespace is trimmed. Blank input and exact
    /// duplicates are ignored. Returns whether the set changed.
    pub fn add(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if self.contains(value) {
            debug!(tag = value, "Duplicate tag ignored");
            return false;
        }
        self.tags.push(value.to_string());
        true
    }

    /// Remove the first exact match. Returns whether the set changed.
    pub fn remove(&mut self, value: &str) -> bool {
        match self.tags.iter().position(|t| t == value) {
            Some(idx) => {
                self.tags.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.tags.iter().any(|t| t == value)
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Comma-joined wire form (`""` for an empty set)
    pub fn joined(&self) -> String {
        self.tags.join(",")
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for value in iter {
            set.add(value.as_ref());
        }
        set
    }
}

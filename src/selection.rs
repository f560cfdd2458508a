//! Selection of result rows by paper id.

use std::collections::HashSet;
use tracing::debug;

/// Ids of the currently selected papers.
///
/// Owned alongside the result set; callers clear it whenever the result set
/// is replaced so no stale id survives a new search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checkbox change for one row
    pub fn toggle(&mut self, id: &str, included: bool) {
        if included {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
    }

    /// Single "Select All / Clear All" control.
    ///
    /// Clears when every id in `all_ids` is already selected, otherwise
    /// selects exactly `all_ids`.
    pub fn select_all<'a, I>(&mut self, all_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let all: HashSet<String> = all_ids.into_iter().map(str::to_string).collect();
        if self.ids == all {
            self.ids.clear();
        } else {
            self.ids = all;
        }
        debug!(selected = self.ids.len(), "Select-all toggled");
    }

    /// True when the selection equals `all_ids` exactly
    pub fn covers_all<'a, I>(&self, all_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let all: HashSet<&str> = all_ids.into_iter().collect();
        all.len() == self.ids.len() && all.iter().all(|id| self.ids.contains(*id))
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

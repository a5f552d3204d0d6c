use crate::tree::TreeNode;
use std::collections::BTreeSet;

/// The file paths the user has checked. Directories are never stored here; their state
/// is derived from this set by the aggregator.
///
/// Paths that no longer exist in the current tree are kept as-is. They simply never
/// match a file node, so they count for nothing until the file reappears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.paths.iter()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Selected paths that currently exist as files in `tree`.
    pub fn live_in(&self, tree: &TreeNode) -> BTreeSet<String> {
        let files = tree.file_paths();
        self.paths
            .iter()
            .filter(|p| files.contains(p.as_str()))
            .cloned()
            .collect()
    }
}

impl FromIterator<String> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        SelectionSet {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Directory paths expanded in the view. Has no bearing on what is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    paths: BTreeSet<String>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    /// Flips the entry and returns the new expanded state.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.paths.remove(path) {
            false
        } else {
            self.paths.insert(path.to_string());
            true
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.paths.iter()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

impl FromIterator<String> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        ExpansionSet {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Paths whose content became wanted (`added`) or unwanted (`removed`) after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl SelectionChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn merge(&mut self, other: SelectionChange) {
        for path in other.added {
            if !self.removed.remove(&path) {
                self.added.insert(path);
            }
        }
        for path in other.removed {
            if !self.added.remove(&path) {
                self.removed.insert(path);
            }
        }
    }
}

use crate::selection::SelectionSet;
use crate::tree::{NodeKind, TreeNode};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryStatus {
    Checked,
    Unchecked,
    Indeterminate,
}

/// What the renderer shows in a row's checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    File { checked: bool },
    Directory(DirectoryStatus),
}

impl NodeStatus {
    pub fn is_checked(self) -> bool {
        matches!(
            self,
            NodeStatus::File { checked: true } | NodeStatus::Directory(DirectoryStatus::Checked)
        )
    }

    /// Checkbox glyph used by the list renderer and the headless summary.
    pub fn marker(self) -> &'static str {
        match self {
            NodeStatus::File { checked: true } | NodeStatus::Directory(DirectoryStatus::Checked) => {
                "[x] "
            }
            NodeStatus::Directory(DirectoryStatus::Indeterminate) => "[-] ",
            _ => "[ ] ",
        }
    }
}

fn status_from_counts(selected: usize, total: usize) -> DirectoryStatus {
    if total == 0 || selected == 0 {
        // an empty directory is never checked
        DirectoryStatus::Unchecked
    } else if selected == total {
        DirectoryStatus::Checked
    } else {
        DirectoryStatus::Indeterminate
    }
}

/// Derives a directory's checkbox from the files below it. Selected paths that are not
/// files of this subtree are never counted.
pub fn directory_status(node: &TreeNode, selection: &SelectionSet) -> DirectoryStatus {
    let files = node.descendant_files();
    let selected = files
        .iter()
        .filter(|file| selection.contains(&file.path))
        .count();
    status_from_counts(selected, files.len())
}

pub fn node_status(node: &TreeNode, selection: &SelectionSet) -> NodeStatus {
    match node.kind {
        NodeKind::File => NodeStatus::File {
            checked: selection.contains(&node.path),
        },
        NodeKind::Directory => NodeStatus::Directory(directory_status(node, selection)),
    }
}

/// Status of every node in a tree, computed in a single bottom-up pass.
///
/// A snapshot is only valid for the tree and selection it was computed from; the engine
/// recomputes it after every mutation of either.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    statuses: HashMap<String, NodeStatus>,
    tallies: HashMap<String, (usize, usize)>,
}

impl StatusSnapshot {
    pub fn compute(tree: &TreeNode, selection: &SelectionSet) -> Self {
        let mut snapshot = StatusSnapshot::default();
        snapshot.visit(tree, selection);
        snapshot
    }

    fn visit(&mut self, node: &TreeNode, selection: &SelectionSet) -> (usize, usize) {
        match node.kind {
            NodeKind::File => {
                let checked = selection.contains(&node.path);
                self.statuses
                    .insert(node.path.clone(), NodeStatus::File { checked });
                (usize::from(checked), 1)
            }
            NodeKind::Directory => {
                let (mut selected, mut total) = (0, 0);
                for child in &node.children {
                    let (s, t) = self.visit(child, selection);
                    selected += s;
                    total += t;
                }
                self.tallies.insert(node.path.clone(), (selected, total));
                self.statuses.insert(
                    node.path.clone(),
                    NodeStatus::Directory(status_from_counts(selected, total)),
                );
                (selected, total)
            }
        }
    }

    pub fn status(&self, path: &str) -> Option<NodeStatus> {
        self.statuses.get(path).copied()
    }

    /// `(selected, total)` file counts below a directory.
    pub fn tally(&self, path: &str) -> Option<(usize, usize)> {
        self.tallies.get(path).copied()
    }
}

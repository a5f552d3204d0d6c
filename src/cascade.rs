use crate::selection::{SelectionChange, SelectionSet};
use crate::tree::TreeNode;

/// Applies a checkbox click to `node` and everything below it.
///
/// A file is added or removed on its own; a directory adds or removes every file beneath
/// it in one step, so an indeterminate directory becomes fully checked. Nothing above
/// `node` is touched: ancestor checkboxes are always re-derived from the selection.
/// Only files present in the tree are enumerated, so stale entries under a directory
/// survive an uncheck.
///
/// Returns the paths that actually changed membership.
pub fn toggle(node: &TreeNode, checked: bool, selection: &mut SelectionSet) -> SelectionChange {
    let mut change = SelectionChange::default();
    for file in node.descendant_files() {
        if checked {
            if selection.insert(file.path.clone()) {
                change.added.insert(file.path.clone());
            }
        } else if selection.remove(&file.path) {
            change.removed.insert(file.path.clone());
        }
    }
    change
}

use crate::tree::TreeNode;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Nest the scanner's flat `(path, is_dir)` list into a [`TreeNode`] rooted at `root_path`.
///
/// * Entries outside `root_path` are ignored; `root_path` itself becomes the root node.
/// * Children come out directories first, then files, each sorted by name.
/// * A file whose parent directory is missing from `paths` is attached under a synthesized
///   directory so no selectable file is lost.
pub fn build_tree(paths: &[(PathBuf, bool)], root_path: &Path) -> TreeNode {
    // parent rel path -> [(name, is_dir)]
    let mut children_of: HashMap<String, Vec<(String, bool)>> = HashMap::new();
    let mut known_dirs: HashSet<String> = HashSet::new();

    for (path, is_dir) in paths {
        let Ok(rel) = path.strip_prefix(root_path) else {
            continue;
        };
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            continue; // the root itself
        }
        // make sure every ancestor directory is registered exactly once
        let mut parent = String::new();
        for (depth, name) in parts.iter().enumerate() {
            let is_leaf = depth + 1 == parts.len();
            let this_path = TreeNode::child_path(&parent, name);
            let this_is_dir = !is_leaf || *is_dir;
            if this_is_dir {
                if known_dirs.insert(this_path.clone()) {
                    children_of
                        .entry(parent.clone())
                        .or_default()
                        .push((name.clone(), true));
                }
            } else {
                children_of
                    .entry(parent.clone())
                    .or_default()
                    .push((name.clone(), false));
            }
            parent = this_path;
        }
    }

    let root_name = root_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    let mut root = TreeNode::empty(root_name);
    root.children = assemble("", &mut children_of);
    root
}

fn assemble(parent: &str, children_of: &mut HashMap<String, Vec<(String, bool)>>) -> Vec<TreeNode> {
    let Some(mut entries) = children_of.remove(parent) else {
        return Vec::new();
    };
    entries.sort_by(|(a_name, a_dir), (b_name, b_dir)| b_dir.cmp(a_dir).then(a_name.cmp(b_name)));
    entries.dedup();
    entries
        .into_iter()
        .map(|(name, is_dir)| {
            let path = TreeNode::child_path(parent, &name);
            if is_dir {
                let kids = assemble(&path, children_of);
                TreeNode::directory(name, path, kids)
            } else {
                TreeNode::file(name, path)
            }
        })
        .collect()
}

/// A tree node together with its depth and guide prefix (`├─ `, `└─ `, `│  `).
#[derive(Debug, Clone)]
pub struct TreeLine<'a> {
    pub node: &'a TreeNode,
    pub depth: usize,
    pub prefix: String,
}

impl TreeLine<'_> {
    pub fn label(&self) -> String {
        if self.node.is_root() {
            "./".to_string()
        } else if self.node.is_dir() {
            format!("{}{}/", self.prefix, self.node.name)
        } else {
            format!("{}{}", self.prefix, self.node.name)
        }
    }
}

/// Lays out `root` as pretty tree lines in **O(n)**.
///
/// * `keep` decides whether a non-root node appears at all (and so who is the last sibling).
/// * `descend` decides whether a kept directory's children are laid out.
pub fn tree_lines<'a>(
    root: &'a TreeNode,
    keep: &dyn Fn(&TreeNode) -> bool,
    descend: &dyn Fn(&TreeNode) -> bool,
) -> Vec<TreeLine<'a>> {
    let mut lines = vec![TreeLine {
        node: root,
        depth: 0,
        prefix: String::new(),
    }];
    if descend(root) {
        // is_last_stack[d] says whether the ancestor at depth d+1 was the last of its siblings
        let mut is_last_stack = Vec::new();
        push_children(root, 1, keep, descend, &mut is_last_stack, &mut lines);
    }
    lines
}

fn push_children<'a>(
    node: &'a TreeNode,
    depth: usize,
    keep: &dyn Fn(&TreeNode) -> bool,
    descend: &dyn Fn(&TreeNode) -> bool,
    is_last_stack: &mut Vec<bool>,
    lines: &mut Vec<TreeLine<'a>>,
) {
    let kept: Vec<&TreeNode> = node.children.iter().filter(|c| keep(c)).collect();
    let count = kept.len();
    for (i, child) in kept.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let mut prefix = String::new();
        for &ancestor_last in is_last_stack.iter() {
            prefix.push_str(if ancestor_last { "   " } else { "│  " });
        }
        prefix.push_str(if is_last { "└─ " } else { "├─ " });
        lines.push(TreeLine {
            node: child,
            depth,
            prefix,
        });
        if child.is_dir() && descend(child) {
            is_last_stack.push(is_last);
            push_children(child, depth + 1, keep, descend, is_last_stack, lines);
            is_last_stack.pop();
        }
    }
}

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of the workspace tree as reported by a tree source.
///
/// Paths are workspace-relative and `/`-separated. The workspace root itself is a
/// directory whose path is the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        TreeNode {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<String>,
        children: Vec<TreeNode>,
    ) -> Self {
        TreeNode {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children,
        }
    }

    /// Root with no children, used when the tree source could not read the workspace.
    pub fn empty(name: impl Into<String>) -> Self {
        TreeNode::directory(name, "", Vec::new())
    }

    pub fn child_path(parent: &str, name: &str) -> String {
        if parent.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent, name)
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Every file at or below this node, depth-first. A file yields itself.
    pub fn descendant_files(&self) -> Vec<&TreeNode> {
        let mut files = Vec::new();
        collect_files(self, &mut files);
        files
    }

    pub fn file_paths(&self) -> BTreeSet<String> {
        self.descendant_files()
            .into_iter()
            .map(|node| node.path.clone())
            .collect()
    }

    pub fn dir_paths(&self) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        collect_dirs(self, &mut dirs);
        dirs
    }

    /// Looks a node up by path, descending only into children whose path is a prefix.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        if !self.is_dir() {
            return None;
        }
        self.children
            .iter()
            .filter(|child| child.path == path || is_ancestor_path(&child.path, path))
            .find_map(|child| child.find(path))
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    pub fn file_count(&self) -> usize {
        self.descendant_files().len()
    }
}

fn collect_files<'a>(node: &'a TreeNode, out: &mut Vec<&'a TreeNode>) {
    match node.kind {
        NodeKind::File => out.push(node),
        NodeKind::Directory => {
            for child in &node.children {
                collect_files(child, out);
            }
        }
    }
}

fn collect_dirs(node: &TreeNode, out: &mut BTreeSet<String>) {
    if node.is_dir() {
        out.insert(node.path.clone());
        for child in &node.children {
            collect_dirs(child, out);
        }
    }
}

/// `true` when `ancestor` is a strict path-prefix of `path` (the root `""` is everyone's ancestor).
pub fn is_ancestor_path(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

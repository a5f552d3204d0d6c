use crate::tree::TreeNode;
use crate::tree_builder;
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Names skipped regardless of `.gitignore`.
const NOISE_NAMES: &[&str] = &[
    "node_modules",
    ".git",
    ".vscode",
    "dist",
    "build",
    "out",
    ".next",
    ".nuxt",
    "coverage",
    ".nyc_output",
    ".DS_Store",
    "Thumbs.db",
];

/// Supplies the workspace tree. Failures surface as an empty tree, never as an error.
pub trait TreeSource {
    fn load_tree(&self, root: &Path) -> TreeNode;
}

#[derive(Debug, Clone, Default)]
pub struct FsTreeSource {
    /// File extensions to keep (no dot). Empty keeps everything.
    pub types: Vec<String>,
    pub include_ignored: bool,
}

impl FsTreeSource {
    pub fn new(types: Vec<String>, include_ignored: bool) -> Self {
        FsTreeSource {
            types,
            include_ignored,
        }
    }

    pub fn scan_files(&self, root: &Path) -> Vec<(PathBuf, bool)> {
        let mut collected_paths: Vec<(PathBuf, bool)> = Vec::new();
        let mut walker = WalkBuilder::new(root);
        walker.filter_entry(|entry| entry.depth() == 0 || !is_noise(entry.file_name()));
        if self.include_ignored {
            walker.git_ignore(false).ignore(false);
        }

        for result in walker.build() {
            let dirent = match result {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("skipping entry during scan: {}", e);
                    continue;
                }
            };

            let path = dirent.into_path();
            if path == root {
                continue;
            }

            let is_dir = path.is_dir();
            if !self.types.is_empty() && !is_dir {
                let keep = self
                    .types
                    .iter()
                    .any(|ext_filter_str| path.extension() == Some(OsStr::new(ext_filter_str)));
                if !keep {
                    continue;
                }
            }
            collected_paths.push((path, is_dir));
        }

        collected_paths.sort_by(|(a, _), (b, _)| a.cmp(b));
        collected_paths.dedup_by(|(a, _), (b, _)| a == b);
        collected_paths
    }
}

impl TreeSource for FsTreeSource {
    fn load_tree(&self, root: &Path) -> TreeNode {
        if !root.is_dir() {
            tracing::warn!(root = %root.display(), "workspace root is not a readable directory");
            return TreeNode::empty(root_name(root));
        }
        let entries = self.scan_files(root);
        let tree = tree_builder::build_tree(&entries, root);
        tracing::info!(
            root = %root.display(),
            files = tree.file_count(),
            "workspace tree loaded"
        );
        tree
    }
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string())
}

fn is_noise(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    NOISE_NAMES.contains(&name.as_ref()) || name.starts_with(".env")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn workspace() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("README.md"), "# hi").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("src/nested/util.rs"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join(".env.local"), "SECRET=1").unwrap();
        dir
    }

    #[test]
    fn loads_relative_tree_without_noise() {
        let dir = workspace();
        let tree = FsTreeSource::default().load_tree(dir.path());
        let files: Vec<String> = tree.file_paths().into_iter().collect();
        assert_eq!(files, vec!["README.md", "src/main.rs", "src/nested/util.rs"]);
        assert!(tree.find("node_modules").is_none());
    }

    #[test]
    fn type_filter_keeps_only_matching_extensions() {
        let dir = workspace();
        let source = FsTreeSource::new(vec!["rs".to_string()], false);
        let tree = source.load_tree(dir.path());
        assert_eq!(tree.file_count(), 2);
        assert!(tree.find("README.md").is_none());
    }

    #[test]
    fn missing_root_yields_empty_tree() {
        let dir = tempdir().unwrap();
        let tree = FsTreeSource::default().load_tree(&dir.path().join("gone"));
        assert!(tree.children.is_empty());
        assert_eq!(tree.file_count(), 0);
    }
}

use crate::cascade;
use crate::content::{ContentLoader, ContentReply, FileContent, Ticket};
use crate::file_scanner::TreeSource;
use crate::persistence::{SelectionGateway, WorkspaceScope};
use crate::selection::{ExpansionSet, SelectionChange, SelectionSet};
use crate::status::{NodeStatus, StatusSnapshot};
use crate::tree::{NodeKind, TreeNode};
use crate::tree_builder::tree_lines;
use glob::Pattern;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// One visible line of the checkbox tree, as handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub status: NodeStatus,
    pub is_expanded: bool,
    /// Guide prefix plus name, e.g. `│  ├─ lib.rs`.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: String,
    pub content: FileContent,
}

#[derive(Debug, Clone)]
struct ContentSlot {
    ticket: Ticket,
    content: FileContent,
}

/// The file-selection engine.
///
/// All mutations run synchronously on the caller's thread. Every mutation of the
/// selection or the tree recomputes the status snapshot, writes both sets through to
/// the gateway for the current workspace, and tells the content loader which live
/// files became wanted or unwanted.
pub struct SelectionEngine {
    tree_source: Box<dyn TreeSource>,
    gateway: SelectionGateway,
    loader: Box<dyn ContentLoader>,
    root: Option<PathBuf>,
    scope: Option<WorkspaceScope>,
    tree: TreeNode,
    selection: SelectionSet,
    expansion: ExpansionSet,
    snapshot: StatusSnapshot,
    // live selected files whose content has been requested
    contents: BTreeMap<String, ContentSlot>,
    next_ticket: Ticket,
    last_save_ok: bool,
}

impl SelectionEngine {
    pub fn new(
        tree_source: Box<dyn TreeSource>,
        gateway: SelectionGateway,
        loader: Box<dyn ContentLoader>,
    ) -> Self {
        let tree = TreeNode::empty(".");
        let selection = SelectionSet::new();
        let snapshot = StatusSnapshot::compute(&tree, &selection);
        SelectionEngine {
            tree_source,
            gateway,
            loader,
            root: None,
            scope: None,
            tree,
            selection,
            expansion: ExpansionSet::new(),
            snapshot,
            contents: BTreeMap::new(),
            next_ticket: 1,
            last_save_ok: true,
        }
    }

    // --- Workspace and tree lifecycle ---

    /// Makes `root` the active workspace: loads its tree and swaps in its persisted sets.
    /// Nothing from the previous workspace survives the switch, fetched contents included.
    pub fn open_workspace(&mut self, root: &Path) {
        let scope = WorkspaceScope::from_root(root);
        tracing::info!(scope = scope.as_str(), "opening workspace");
        self.release_all_content();
        let (selection, expansion) = self.gateway.load(&scope);
        self.selection = selection;
        self.expansion = expansion;
        self.scope = Some(scope);
        self.root = Some(root.to_path_buf());
        self.last_save_ok = true;
        let tree = self.tree_source.load_tree(root);
        self.install_tree(tree);
    }

    /// Re-scans the current workspace and reconciles the persisted sets with the new tree.
    /// Every live selected file is read again, so edits made on disk are picked up.
    pub fn refresh_tree(&mut self) {
        let Some(root) = self.root.clone() else {
            tracing::debug!("refresh requested before a workspace was opened");
            return;
        };
        self.release_all_content();
        self.reload_persisted();
        let tree = self.tree_source.load_tree(&root);
        self.install_tree(tree);
    }

    /// Replaces the tree wholesale. Selected and expanded paths missing from it are
    /// kept but stop counting until they reappear.
    pub fn set_tree(&mut self, tree: TreeNode) {
        self.install_tree(tree);
    }

    fn install_tree(&mut self, tree: TreeNode) {
        self.tree = tree;
        let stale = self.stale_selection();
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "selection holds paths missing from the tree");
        }
        self.recompute();
        self.sync_content();
    }

    fn reload_persisted(&mut self) {
        let Some(scope) = &self.scope else {
            return;
        };
        if !self.last_save_ok {
            // the store is behind the live session; keep what we have
            tracing::debug!("skipping reload, last write did not reach the store");
            return;
        }
        match self.gateway.try_load(scope) {
            Ok(Some((selection, expansion))) => {
                self.selection = selection;
                self.expansion = expansion;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("keeping in-memory selection, reload failed: {}", e),
        }
    }

    // --- Selection intents ---

    /// Checks or unchecks the node at `path` (and everything below it).
    /// Unknown or stale paths are ignored.
    pub fn toggle(&mut self, path: &str, checked: bool) -> SelectionChange {
        let Some(node) = self.tree.find(path) else {
            tracing::debug!(path, "toggle ignored, path not in tree");
            return SelectionChange::default();
        };
        let change = cascade::toggle(node, checked, &mut self.selection);
        tracing::debug!(
            path,
            checked,
            added = change.added.len(),
            removed = change.removed.len(),
            "toggled"
        );
        self.selection_changed();
        change
    }

    /// Checkbox click semantics: unchecked and indeterminate become checked, checked
    /// becomes unchecked.
    pub fn toggle_current(&mut self, path: &str) -> SelectionChange {
        match self.status(path) {
            Some(status) => self.toggle(path, !status.is_checked()),
            None => SelectionChange::default(),
        }
    }

    /// Checks every file matching one of `patterns` (workspace-relative globs).
    pub fn select_matching(&mut self, patterns: &[Pattern]) -> SelectionChange {
        let mut change = SelectionChange::default();
        for file in self.tree.descendant_files() {
            if patterns.iter().any(|p| p.matches(&file.path)) {
                change.merge(cascade::toggle(file, true, &mut self.selection));
            }
        }
        if !change.is_empty() {
            self.selection_changed();
        }
        change
    }

    /// Drops one path from the selection, whether or not it is still in the tree.
    pub fn remove_file(&mut self, path: &str) -> bool {
        let removed = self.selection.remove(path);
        if removed {
            self.selection_changed();
        }
        removed
    }

    /// Empties the selection. Expanded directories stay expanded.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.selection_changed();
    }

    fn selection_changed(&mut self) {
        self.recompute();
        self.persist();
        self.sync_content();
    }

    // --- Expansion intents ---

    /// Flips a directory open or closed and returns the new state. Files and unknown
    /// paths are left alone.
    pub fn toggle_expand(&mut self, path: &str) -> bool {
        if !self.tree.find(path).is_some_and(TreeNode::is_dir) || path.is_empty() {
            return self.is_expanded(path);
        }
        let expanded = self.expansion.toggle(path);
        self.persist();
        expanded
    }

    pub fn set_expanded(&mut self, path: &str, expanded: bool) {
        let changed = if expanded {
            self.tree.find(path).is_some_and(TreeNode::is_dir) && self.expansion.insert(path)
        } else {
            self.expansion.remove(path)
        };
        if changed {
            self.persist();
        }
    }

    pub fn expand_all(&mut self) {
        for dir in self.tree.dir_paths() {
            if !dir.is_empty() {
                self.expansion.insert(dir);
            }
        }
        self.persist();
    }

    /// Collapses every directory of the current tree; the root stays open.
    pub fn collapse_all(&mut self) {
        for dir in self.tree.dir_paths() {
            self.expansion.remove(&dir);
        }
        self.persist();
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        path.is_empty() || self.expansion.contains(path)
    }

    // --- Content bridge ---

    /// Attaches a fetched result. Replies for paths that are no longer selected, that
    /// were never requested, or that answer an older request (a previous workspace or a
    /// rescan since) are dropped. Returns whether the reply was kept.
    pub fn on_content(&mut self, reply: ContentReply) -> bool {
        let path = reply.path.as_str();
        if !self.selection.contains(path) {
            tracing::debug!(path, "discarding content for deselected file");
            return false;
        }
        let Some(slot) = self.contents.get_mut(path) else {
            tracing::debug!(path, "discarding content that was not requested");
            return false;
        };
        if slot.ticket != reply.ticket {
            tracing::debug!(path, ticket = reply.ticket, "discarding superseded content");
            return false;
        }
        slot.content = match reply.result {
            Ok(text) => FileContent::Loaded(text),
            Err(message) => FileContent::Failed(message),
        };
        true
    }

    fn release_all_content(&mut self) {
        for (path, slot) in std::mem::take(&mut self.contents) {
            self.loader.release(slot.ticket, &path);
        }
    }

    /// Brings the set of requested files in line with the live selection and emits the
    /// matching notices.
    fn sync_content(&mut self) -> SelectionChange {
        let live = self.selection.live_in(&self.tree);
        let mut notices = SelectionChange::default();

        let unwanted: Vec<String> = self
            .contents
            .keys()
            .filter(|path| !live.contains(*path))
            .cloned()
            .collect();
        for path in unwanted {
            if let Some(slot) = self.contents.remove(&path) {
                self.loader.release(slot.ticket, &path);
            }
            notices.removed.insert(path);
        }
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
        for path in live {
            if !self.contents.contains_key(&path) {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                self.contents.insert(
                    path.clone(),
                    ContentSlot {
                        ticket,
                        content: FileContent::Pending,
                    },
                );
                self.loader.request(ticket, &root, &path);
                notices.added.insert(path);
            }
        }
        notices
    }

    // --- Derived state ---

    fn recompute(&mut self) {
        self.snapshot = StatusSnapshot::compute(&self.tree, &self.selection);
    }

    fn persist(&mut self) {
        if let Some(scope) = &self.scope {
            self.last_save_ok = self.gateway.save(scope, &self.selection, &self.expansion);
        }
    }

    pub fn status(&self, path: &str) -> Option<NodeStatus> {
        self.snapshot.status(path)
    }

    /// `(selected, total)` live file counts under a directory.
    pub fn tally(&self, path: &str) -> Option<(usize, usize)> {
        self.snapshot.tally(path)
    }

    /// Rows the renderer should show: children of collapsed directories are hidden.
    /// A non-empty `filter` keeps rows whose name, or some descendant's name, contains
    /// it (case-insensitive).
    pub fn rows(&self, filter: &str) -> Vec<TreeRow> {
        let needle = filter.to_lowercase();
        let keep = |node: &TreeNode| needle.is_empty() || subtree_matches(node, &needle);
        let descend = |node: &TreeNode| self.is_expanded(&node.path);
        tree_lines(&self.tree, &keep, &descend)
            .into_iter()
            .map(|line| TreeRow {
                depth: line.depth,
                name: line.node.name.clone(),
                path: line.node.path.clone(),
                kind: line.node.kind,
                status: self
                    .snapshot
                    .status(&line.node.path)
                    .unwrap_or(NodeStatus::File { checked: false }),
                is_expanded: line.node.is_dir() && self.is_expanded(&line.node.path),
                label: line.label(),
            })
            .collect()
    }

    /// Selected files present in the tree, in tree order, with whatever content has
    /// arrived for them.
    pub fn selected_files(&self) -> Vec<SelectedFile> {
        self.tree
            .descendant_files()
            .into_iter()
            .filter(|file| self.selection.contains(&file.path))
            .map(|file| SelectedFile {
                path: file.path.clone(),
                content: self
                    .contents
                    .get(&file.path)
                    .map(|slot| slot.content.clone())
                    .unwrap_or(FileContent::Pending),
            })
            .collect()
    }

    /// Selected paths the current tree does not contain.
    pub fn stale_selection(&self) -> Vec<String> {
        let files = self.tree.file_paths();
        self.selection
            .iter()
            .filter(|path| !files.contains(*path))
            .cloned()
            .collect()
    }

    pub fn pending_paths(&self) -> Vec<String> {
        self.contents
            .iter()
            .filter(|(_, slot)| slot.content == FileContent::Pending)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Tickets of the reads still outstanding, for callers that block on them.
    pub fn pending_tickets(&self) -> HashSet<Ticket> {
        self.contents
            .values()
            .filter(|slot| slot.content == FileContent::Pending)
            .map(|slot| slot.ticket)
            .collect()
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn expansion(&self) -> &ExpansionSet {
        &self.expansion
    }

    pub fn scope(&self) -> Option<&WorkspaceScope> {
        self.scope.as_ref()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

fn subtree_matches(node: &TreeNode, needle: &str) -> bool {
    node.name.to_lowercase().contains(needle)
        || node.children.iter().any(|child| subtree_matches(child, needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tests::{Notice, RecordingLoader};
    use crate::error::StoreResult;
    use crate::persistence::tests::BrokenStore;
    use crate::persistence::{KeyValueStore, MemoryStore};
    use crate::status::DirectoryStatus;
    use crate::tree::tests::sample_tree;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Serves whatever tree the test last put in for each root.
    #[derive(Clone, Default)]
    struct FixedTreeSource {
        trees: Rc<RefCell<HashMap<PathBuf, TreeNode>>>,
    }

    impl FixedTreeSource {
        fn put(&self, root: &str, tree: TreeNode) {
            self.trees.borrow_mut().insert(PathBuf::from(root), tree);
        }
    }

    impl TreeSource for FixedTreeSource {
        fn load_tree(&self, root: &Path) -> TreeNode {
            self.trees
                .borrow()
                .get(root)
                .cloned()
                .unwrap_or_else(|| TreeNode::empty("missing"))
        }
    }

    /// Memory store the test can keep reading after handing it to the engine.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
            self.0.borrow_mut().set(key, value)
        }
    }

    struct Harness {
        engine: SelectionEngine,
        source: FixedTreeSource,
        store: SharedStore,
        loader: RecordingLoader,
    }

    fn harness() -> Harness {
        let source = FixedTreeSource::default();
        source.put("/ws/alpha", sample_tree());
        let store = SharedStore::default();
        let loader = RecordingLoader::default();
        let engine = SelectionEngine::new(
            Box::new(source.clone()),
            SelectionGateway::new(Box::new(store.clone())),
            Box::new(loader.clone()),
        );
        Harness {
            engine,
            source,
            store,
            loader,
        }
    }

    fn dir(status: DirectoryStatus) -> Option<NodeStatus> {
        Some(NodeStatus::Directory(status))
    }

    fn selected(engine: &SelectionEngine) -> Vec<&str> {
        engine.selection().iter().map(String::as_str).collect()
    }

    fn persisted(store: &SharedStore, root: &str) -> (SelectionSet, ExpansionSet) {
        SelectionGateway::new(Box::new(store.clone())).load(&WorkspaceScope::from_root(Path::new(root)))
    }

    #[test]
    fn checkbox_walkthrough_updates_ancestors() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));

        h.engine.toggle("sub", true);
        assert_eq!(selected(&h.engine), vec!["sub/b.txt", "sub/c.txt"]);
        assert_eq!(h.engine.status("sub"), dir(DirectoryStatus::Checked));
        assert_eq!(h.engine.status(""), dir(DirectoryStatus::Indeterminate));

        h.engine.toggle("a.txt", true);
        assert_eq!(h.engine.status(""), dir(DirectoryStatus::Checked));

        h.engine.toggle("sub", false);
        assert_eq!(selected(&h.engine), vec!["a.txt"]);
        assert_eq!(h.engine.status(""), dir(DirectoryStatus::Indeterminate));
        assert_eq!(h.engine.status("sub"), dir(DirectoryStatus::Unchecked));
    }

    #[test]
    fn toggle_current_checks_indeterminate_directories() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("sub/b.txt", true);
        assert_eq!(h.engine.status("sub"), dir(DirectoryStatus::Indeterminate));

        h.engine.toggle_current("sub");
        assert_eq!(h.engine.status("sub"), dir(DirectoryStatus::Checked));
        h.engine.toggle_current("sub");
        assert_eq!(h.engine.status("sub"), dir(DirectoryStatus::Unchecked));
    }

    #[test]
    fn every_mutation_is_written_through() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("a.txt", true);
        h.engine.toggle_expand("sub");

        let (selection, expansion) = persisted(&h.store, "/ws/alpha");
        assert!(selection.contains("a.txt"));
        assert!(expansion.contains("sub"));
    }

    #[test]
    fn phantom_selection_is_ignored_by_status() {
        let mut h = harness();
        let scope = WorkspaceScope::from_root(Path::new("/ws/alpha"));
        let seeded: SelectionSet = ["old/removed.txt", "a.txt"].iter().map(|s| s.to_string()).collect();
        SelectionGateway::new(Box::new(h.store.clone())).save(&scope, &seeded, &ExpansionSet::new());

        h.engine.open_workspace(Path::new("/ws/alpha"));
        assert_eq!(h.engine.status(""), dir(DirectoryStatus::Indeterminate));
        assert_eq!(h.engine.tally(""), Some((1, 3)));
        assert_eq!(h.engine.stale_selection(), vec!["old/removed.txt"]);
        assert!(h.engine.status("old/removed.txt").is_none());

        // toggling a phantom is a no-op, and the phantom survives later writes
        assert!(h.engine.toggle("old/removed.txt", false).is_empty());
        h.engine.toggle("sub", true);
        assert_eq!(h.engine.status(""), dir(DirectoryStatus::Checked));
        assert!(persisted(&h.store, "/ws/alpha").0.contains("old/removed.txt"));
    }

    #[test]
    fn switching_workspace_swaps_sets_without_leaking() {
        let mut h = harness();
        h.source.put(
            "/ws/beta",
            TreeNode::directory("beta", "", vec![TreeNode::file("b.rs", "b.rs")]),
        );
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("a.txt", true);
        h.engine.toggle_expand("sub");

        h.engine.open_workspace(Path::new("/ws/beta"));
        assert!(h.engine.selection().is_empty());
        assert!(!h.engine.expansion().contains("sub"));
        h.engine.toggle("b.rs", true);

        h.engine.open_workspace(Path::new("/ws/alpha"));
        assert_eq!(selected(&h.engine), vec!["a.txt"]);
        assert!(h.engine.expansion().contains("sub"));
        assert!(!persisted(&h.store, "/ws/alpha").0.contains("b.rs"));
    }

    #[test]
    fn refresh_keeps_vanished_paths_until_they_return() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("sub", true);
        h.loader.take();

        let shrunk = TreeNode::directory(
            "root",
            "",
            vec![
                TreeNode::directory("sub", "sub", vec![TreeNode::file("b.txt", "sub/b.txt")]),
                TreeNode::file("a.txt", "a.txt"),
            ],
        );
        h.source.put("/ws/alpha", shrunk);
        h.engine.refresh_tree();

        assert!(h.engine.selection().contains("sub/c.txt"));
        assert_eq!(h.engine.status("sub"), dir(DirectoryStatus::Checked));
        assert_eq!(h.engine.status(""), dir(DirectoryStatus::Indeterminate));
        // a rescan drops every read and asks again for what is still live
        assert_eq!(
            h.loader.take(),
            vec![
                Notice::Release("sub/b.txt".into()),
                Notice::Release("sub/c.txt".into()),
                Notice::Request("sub/b.txt".into()),
            ]
        );

        h.source.put("/ws/alpha", sample_tree());
        h.engine.refresh_tree();
        assert_eq!(h.engine.tally("sub"), Some((2, 2)));
        assert_eq!(
            h.loader.take(),
            vec![
                Notice::Release("sub/b.txt".into()),
                Notice::Request("sub/b.txt".into()),
                Notice::Request("sub/c.txt".into()),
            ]
        );
    }

    #[test]
    fn refresh_rereads_loaded_files() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("a.txt", true);
        let before_edit = h.loader.reply("a.txt", Ok("old text".into()));
        assert!(h.engine.on_content(before_edit.clone()));

        h.engine.refresh_tree();
        assert_eq!(h.engine.pending_paths(), vec!["a.txt"]);
        assert!(!h.engine.on_content(before_edit));
        assert!(h.engine.on_content(h.loader.reply("a.txt", Ok("new text".into()))));
        assert_eq!(
            h.engine.selected_files()[0].content,
            FileContent::Loaded("new text".into())
        );
    }

    #[test]
    fn switching_workspace_never_reuses_content_for_the_same_path() {
        let mut h = harness();
        h.source.put("/ws/beta", sample_tree());
        let beta = WorkspaceScope::from_root(Path::new("/ws/beta"));
        let seeded: SelectionSet = ["a.txt".to_string()].into_iter().collect();
        SelectionGateway::new(Box::new(h.store.clone())).save(&beta, &seeded, &ExpansionSet::new());

        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("a.txt", true);
        let from_alpha = h.loader.reply("a.txt", Ok("ALPHA CONTENT".into()));
        assert!(h.engine.on_content(from_alpha.clone()));
        h.loader.take();

        h.engine.open_workspace(Path::new("/ws/beta"));
        assert_eq!(
            h.loader.take(),
            vec![
                Notice::Release("a.txt".into()),
                Notice::Request("a.txt".into())
            ]
        );
        assert_eq!(h.loader.root_of("a.txt"), Some(PathBuf::from("/ws/beta")));
        assert_eq!(
            h.engine.selected_files(),
            vec![SelectedFile {
                path: "a.txt".into(),
                content: FileContent::Pending
            }]
        );

        // a read from alpha that lands after the switch is dropped
        assert!(!h.engine.on_content(from_alpha));
        assert_eq!(h.engine.pending_paths(), vec!["a.txt"]);
    }

    #[test]
    fn content_notices_follow_toggles() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.loader.take();

        h.engine.toggle("sub", true);
        assert_eq!(
            h.loader.take(),
            vec![
                Notice::Request("sub/b.txt".into()),
                Notice::Request("sub/c.txt".into())
            ]
        );
        h.engine.toggle("sub/b.txt", false);
        assert_eq!(h.loader.take(), vec![Notice::Release("sub/b.txt".into())]);
        h.engine.clear_selection();
        assert_eq!(h.loader.take(), vec![Notice::Release("sub/c.txt".into())]);
    }

    #[test]
    fn late_content_for_deselected_file_is_discarded() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("a.txt", true);
        let first = h.loader.reply("a.txt", Ok("stale".into()));
        h.engine.toggle("a.txt", false);

        assert!(!h.engine.on_content(first.clone()));
        assert!(!h.engine.selection().contains("a.txt"));
        assert!(h.engine.selected_files().is_empty());

        h.engine.toggle("a.txt", true);
        assert_eq!(h.engine.pending_paths(), vec!["a.txt"]);
        // the read from before the deselect answers an older request
        assert!(!h.engine.on_content(first));
        assert!(h.engine.on_content(h.loader.reply("a.txt", Ok("fresh".into()))));
        assert_eq!(
            h.engine.selected_files(),
            vec![SelectedFile {
                path: "a.txt".into(),
                content: FileContent::Loaded("fresh".into())
            }]
        );
    }

    #[test]
    fn failed_content_keeps_the_file_selected() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("a.txt", true);
        assert!(h.engine.on_content(h.loader.reply("a.txt", Err("permission denied".into()))));
        assert!(h.engine.selection().contains("a.txt"));
        assert_eq!(
            h.engine.selected_files()[0].content,
            FileContent::Failed("permission denied".into())
        );
    }

    #[test]
    fn failed_writes_do_not_roll_back_live_state() {
        let source = FixedTreeSource::default();
        source.put("/ws/alpha", sample_tree());
        let mut engine = SelectionEngine::new(
            Box::new(source),
            SelectionGateway::new(Box::new(BrokenStore)),
            Box::new(RecordingLoader::default()),
        );
        engine.open_workspace(Path::new("/ws/alpha"));
        engine.toggle("sub", true);
        assert_eq!(engine.status("sub"), dir(DirectoryStatus::Checked));

        engine.refresh_tree();
        assert_eq!(engine.selection().len(), 2);
    }

    #[test]
    fn clear_selection_keeps_expansion() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("", true);
        h.engine.toggle_expand("sub");
        h.engine.clear_selection();
        assert!(h.engine.selection().is_empty());
        assert!(h.engine.is_expanded("sub"));
        assert_eq!(h.engine.status(""), dir(DirectoryStatus::Unchecked));
    }

    #[test]
    fn remove_file_drops_stale_entries_too() {
        let mut h = harness();
        h.engine.set_tree(sample_tree());
        h.engine.toggle("a.txt", true);
        h.engine.set_tree(TreeNode::empty("root"));
        assert_eq!(h.engine.stale_selection(), vec!["a.txt"]);
        assert!(h.engine.remove_file("a.txt"));
        assert!(h.engine.selection().is_empty());
        assert!(!h.engine.remove_file("a.txt"));
    }

    #[test]
    fn rows_hide_collapsed_children_and_honour_filter() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        let paths = |rows: Vec<TreeRow>| rows.into_iter().map(|r| r.path).collect::<Vec<_>>();

        assert_eq!(paths(h.engine.rows("")), vec!["", "sub", "a.txt"]);
        h.engine.toggle_expand("sub");
        assert_eq!(
            paths(h.engine.rows("")),
            vec!["", "sub", "sub/b.txt", "sub/c.txt", "a.txt"]
        );
        assert_eq!(paths(h.engine.rows("C.TXT")), vec!["", "sub", "sub/c.txt"]);

        h.engine.collapse_all();
        assert_eq!(paths(h.engine.rows("")), vec!["", "sub", "a.txt"]);
        h.engine.expand_all();
        assert_eq!(h.engine.rows("").len(), 5);
    }

    #[test]
    fn rows_carry_render_state() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        h.engine.toggle("sub/b.txt", true);
        h.engine.set_expanded("sub", true);
        let rows = h.engine.rows("");
        let sub = rows.iter().find(|r| r.path == "sub").unwrap();
        assert_eq!(sub.status, NodeStatus::Directory(DirectoryStatus::Indeterminate));
        assert!(sub.is_expanded);
        assert_eq!(sub.label, "├─ sub/");
        let b = rows.iter().find(|r| r.path == "sub/b.txt").unwrap();
        assert_eq!(b.status, NodeStatus::File { checked: true });
        assert_eq!(b.depth, 2);
    }

    #[test]
    fn toggle_expand_ignores_files_and_root() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        assert!(!h.engine.toggle_expand("a.txt"));
        assert!(h.engine.toggle_expand(""));
        assert!(h.engine.expansion().iter().next().is_none());
    }

    #[test]
    fn select_matching_uses_relative_globs() {
        let mut h = harness();
        h.engine.open_workspace(Path::new("/ws/alpha"));
        let patterns = vec![Pattern::new("sub/*.txt").unwrap()];
        let change = h.engine.select_matching(&patterns);
        assert_eq!(change.added.len(), 2);
        assert_eq!(h.engine.status("sub"), dir(DirectoryStatus::Checked));
        assert!(!h.engine.selection().contains("a.txt"));
    }

    #[test]
    fn refresh_before_open_is_harmless() {
        let mut h = harness();
        h.engine.refresh_tree();
        assert_eq!(h.engine.tree().file_count(), 0);
        assert!(h.engine.toggle("a.txt", true).is_empty());
    }
}

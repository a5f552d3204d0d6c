use crate::error::{StoreError, StoreResult};
use crate::selection::{ExpansionSet, SelectionSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const STATE_VERSION: u32 = 1;

/// Identifies the workspace a persisted selection belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceScope(String);

impl WorkspaceScope {
    pub fn new(id: impl Into<String>) -> Self {
        WorkspaceScope(id.into())
    }

    /// Scope for a workspace root. The root is canonicalised when possible so that
    /// `.` and an absolute spelling of the same directory share one selection.
    pub fn from_root(root: &Path) -> Self {
        let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        WorkspaceScope(resolved.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic, filename-safe store key.
    pub fn storage_key(&self) -> String {
        format!("selection-{:x}", Sha256::digest(self.0.as_bytes()))
    }
}

/// Minimal durable key-value store the gateway writes through.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// One JSON file per key inside a state directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        // write to a sibling first so a crash never leaves a half-written document
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    version: u32,
    #[serde(default)]
    selected_files: Vec<String>,
    #[serde(default)]
    expanded_folders: Vec<String>,
}

/// Mirrors the selection and expansion sets of each workspace into a [`KeyValueStore`].
///
/// `save` and `load` never fail: store errors are logged and the caller keeps its
/// in-memory state.
pub struct SelectionGateway {
    store: Box<dyn KeyValueStore>,
}

impl SelectionGateway {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        SelectionGateway { store }
    }

    pub fn in_memory() -> Self {
        SelectionGateway::new(Box::new(MemoryStore::new()))
    }

    /// Fire-and-forget write. Returns whether the store accepted it.
    pub fn save(
        &mut self,
        scope: &WorkspaceScope,
        selection: &SelectionSet,
        expansion: &ExpansionSet,
    ) -> bool {
        match self.try_save(scope, selection, expansion) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(scope = scope.as_str(), "failed to persist selection: {}", e);
                false
            }
        }
    }

    pub fn try_save(
        &mut self,
        scope: &WorkspaceScope,
        selection: &SelectionSet,
        expansion: &ExpansionSet,
    ) -> StoreResult<()> {
        let state = PersistedState {
            version: STATE_VERSION,
            selected_files: selection.iter().cloned().collect(),
            expanded_folders: expansion.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&state)?;
        self.store.set(&scope.storage_key(), &json)?;
        tracing::debug!(
            scope = scope.as_str(),
            selected = state.selected_files.len(),
            expanded = state.expanded_folders.len(),
            "selection saved"
        );
        Ok(())
    }

    pub fn load(&self, scope: &WorkspaceScope) -> (SelectionSet, ExpansionSet) {
        match self.try_load(scope) {
            Ok(Some(pair)) => pair,
            Ok(None) => (SelectionSet::new(), ExpansionSet::new()),
            Err(e) => {
                tracing::warn!(scope = scope.as_str(), "ignoring persisted selection: {}", e);
                (SelectionSet::new(), ExpansionSet::new())
            }
        }
    }

    pub fn try_load(&self, scope: &WorkspaceScope) -> StoreResult<Option<(SelectionSet, ExpansionSet)>> {
        let key = scope.storage_key();
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        let state: PersistedState = serde_json::from_str(&raw).map_err(|source| {
            StoreError::Corrupt {
                key: key.clone(),
                source,
            }
        })?;
        if state.version != STATE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                key,
                found: state.version,
            });
        }
        Ok(Some((
            state.selected_files.into_iter().collect(),
            state.expanded_folders.into_iter().collect(),
        )))
    }
}

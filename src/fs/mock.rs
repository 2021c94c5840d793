// src/fs/mock.rs

//! In-memory [`FileSystem`] for loading manifests in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use super::FileSystem;

#[derive(Debug, Clone)]
enum MockEntry {
    File(String),
    Dir(BTreeSet<PathBuf>),
}

/// Files live under relative paths; `"."` is the root directory. Parent
/// directories are created implicitly by [`MockFileSystem::add_file`].
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("."), MockEntry::Dir(BTreeSet::new()));
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let path = normalize(path.as_ref());
        let mut entries = self.lock();
        register_in_parent(&mut entries, &path);
        entries.insert(path, MockEntry::File(contents.into()));
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        // A poisoned lock only means another test thread panicked.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Add `path` to its parent's children, creating parents as needed.
fn register_in_parent(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ if path == Path::new(".") => return,
        _ => PathBuf::from("."),
    };

    if !entries.contains_key(&parent) {
        register_in_parent(entries, &parent);
        entries.insert(parent.clone(), MockEntry::Dir(BTreeSet::new()));
    }
    if let Some(MockEntry::Dir(children)) = entries.get_mut(&parent) {
        children.insert(path.to_path_buf());
    }
}

/// Strip a leading `./` so `./a/b` and `a/b` name the same entry.
fn normalize(path: &Path) -> PathBuf {
    match path.strip_prefix(".") {
        Ok(rest) if !rest.as_os_str().is_empty() => rest.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.lock().get(&normalize(path)) {
            Some(MockEntry::File(contents)) => Ok(contents.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(&normalize(path)), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(&normalize(path)), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lock().get(&normalize(path)) {
            Some(MockEntry::Dir(children)) => Ok(children.iter().cloned().collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

//! In-memory filesystem adapter for tests and dry runs.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use strata_core::{
    application::{ApplicationError, ports::Filesystem},
    error::StrataResult,
};

use super::LocalFilesystem;

const POISONED: ApplicationError = ApplicationError::LockPoisoned {
    resource: "in-memory filesystem",
};

/// In-memory filesystem.
///
/// In overlay mode, reads of paths never written fall through to the real
/// disk, so a dry run can enhance files of an existing project without
/// modifying them.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
    base: Option<LocalFilesystem>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
            base: None,
        }
    }

    /// Memory filesystem layered over the local disk.
    pub fn overlay() -> Self {
        Self {
            base: Some(LocalFilesystem::new()),
            ..Self::new()
        }
    }

    /// Content written so far (testing and preview helper).
    pub fn get(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// Paths of every file written, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Clear all contents.
    pub fn clear(&self) -> StrataResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| POISONED)?;
        inner.files.clear();
        inner.directories.clear();
        Ok(())
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> StrataResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| POISONED)?;

        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            inner.directories.insert(current.clone());
        }

        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> StrataResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| POISONED)?;

        if let Some(parent) = path.parent() {
            let known = inner.directories.contains(parent)
                || self.base.is_some_and(|base| base.exists(parent));
            if !parent.as_os_str().is_empty() && !known {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> StrataResult<String> {
        let inner = self
            .inner
            .read()
            .map_err(|_| POISONED)?;

        match (inner.files.get(path), &self.base) {
            (Some(content), _) => Ok(content.clone()),
            (None, Some(base)) => base.read_file(path),
            (None, None) => Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file".into(),
            }
            .into()),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let in_memory = self
            .inner
            .read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false);
        in_memory || self.base.is_some_and(|base| base.exists(path))
    }
}

//! In-memory adapter registry with built-in adapters.
//!
//! Adapters are registered once at startup, from code ([`builtin`]) and from
//! `adapter.toml` directories ([`manifest`]). Lookups afterwards only read.

pub mod builtin;
pub mod manifest;

use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Arc, RwLock},
};

use tracing::{debug, info, instrument};

use strata_core::{
    application::{ApplicationError, ports::AdapterRegistry},
    domain::{AdapterMetadata, DomainValidator as validator, LoadedAdapter, ModuleKey},
    error::{StrataError, StrataResult},
};

pub use manifest::{AdapterManifest, ManifestLoader};

const POISONED: ApplicationError = ApplicationError::LockPoisoned {
    resource: "adapter registry",
};

/// Thread-safe in-memory adapter registry.
#[derive(Clone)]
pub struct InMemoryAdapterRegistry {
    inner: Arc<RwLock<BTreeMap<ModuleKey, LoadedAdapter>>>,
}

impl InMemoryAdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a registry with the built-in adapters loaded.
    pub fn with_builtin() -> StrataResult<Self> {
        let registry = Self::new();
        registry.load_builtin()?;
        Ok(registry)
    }

    pub fn load_builtin(&self) -> StrataResult<()> {
        for adapter in builtin::all() {
            self.register(adapter)?;
        }
        Ok(())
    }

    /// Register every adapter found under `dir`, returning how many loaded.
    ///
    /// A directory adapter replaces a built-in one with the same key.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn load_dir(&self, dir: &Path) -> StrataResult<usize> {
        if !dir.is_dir() {
            return Err(StrataError::configuration(format!(
                "adapters directory {} does not exist",
                dir.display()
            )));
        }
        let adapters = ManifestLoader::new(dir).load_all()?;
        let count = adapters.len();
        for adapter in adapters {
            self.register(adapter)?;
        }
        info!(count, "adapters loaded from directory");
        Ok(count)
    }

    /// Validate and insert one adapter.
    pub fn register(&self, adapter: LoadedAdapter) -> StrataResult<()> {
        validator::validate_metadata(&adapter.metadata)?;
        validator::validate_blueprint(&adapter.blueprint)?;

        let key = adapter.metadata.key();
        let mut inner = self
            .inner
            .write()
            .map_err(|_| POISONED)?;

        if inner.insert(key.clone(), adapter).is_some() {
            debug!(%key, "replaced registered adapter");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry for InMemoryAdapterRegistry {
    fn metadata(&self, key: &ModuleKey) -> Option<AdapterMetadata> {
        self.inner
            .read()
            .ok()?
            .get(key)
            .map(|a| a.metadata.clone())
    }

    fn load(&self, key: &ModuleKey) -> StrataResult<LoadedAdapter> {
        let inner = self
            .inner
            .read()
            .map_err(|_| POISONED)?;

        inner.get(key).cloned().ok_or_else(|| {
            ApplicationError::AdapterNotFound {
                category: key.category.to_string(),
                id: key.id.clone(),
            }
            .into()
        })
    }

    fn list(&self) -> Vec<AdapterMetadata> {
        self.inner
            .read()
            .map(|i| i.values().map(|a| a.metadata.clone()).collect())
            .unwrap_or_default()
    }
}

//! External Entity Resolution
//!
//! The event source asks the handler for the body of every external entity
//! it meets (DTDs, external parsed entities). [`CatalogResolver`] answers from
//! a public/system id catalog and falls back to `file:` URLs. Bodies are kept
//! in an LRU cache since the same DTD is usually requested once per pass.

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use url::Url;

/// Errors raised while resolving an external entity
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EntityError {
    /// The entity file exists in the catalog or on disk but cannot be read
    #[error("cannot read entity {system_id}: {source}")]
    Io {
        /// System id being resolved
        system_id: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The system id is not a URL
    #[error("invalid system id '{0}'")]
    InvalidSystemId(String),

    /// The system id uses a scheme other than `file`
    #[error("unsupported scheme '{scheme}' for entity {system_id}")]
    UnsupportedScheme {
        /// URL scheme of the system id
        scheme: String,
        /// System id being resolved
        system_id: String,
    },
}

/// Resolves external entities for the event source.
///
/// `Ok(None)` means "no substitution": the event source falls back to its
/// own default behaviour.
pub trait EntityResolver: Send + Sync {
    /// Resolve an entity by public and system id
    fn resolve(
        &self,
        public_id: Option<&str>,
        system_id: &str,
    ) -> Result<Option<Arc<[u8]>>, EntityError>;
}

/// Catalog-backed resolver with an LRU body cache
pub struct CatalogResolver {
    /// Public id -> file
    public: HashMap<String, PathBuf>,
    /// System id (or bare file name) -> file
    system: HashMap<String, PathBuf>,
    /// Loaded entity bodies
    cache: Mutex<LruCache<PathBuf, Arc<[u8]>>>,
}

impl CatalogResolver {
    /// Number of entity bodies kept by [`CatalogResolver::new`]
    pub const DEFAULT_CACHE_SIZE: usize = 64;

    /// Create an empty catalog
    pub fn new() -> Self {
        Self::with_cache_size(Self::DEFAULT_CACHE_SIZE)
    }

    /// Create an empty catalog caching at most `entries` bodies
    pub fn with_cache_size(entries: usize) -> Self {
        let capacity = NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            public: HashMap::new(),
            system: HashMap::new(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Map a public id to a file
    pub fn add_public(mut self, public_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.public.insert(public_id.into(), path.into());
        self
    }

    /// Map a system id, or a bare file name, to a file
    pub fn add_system(mut self, system_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.system.insert(system_id.into(), path.into());
        self
    }

    /// Number of bodies currently cached
    pub fn cached_entries(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lookup(&self, public_id: Option<&str>, system_id: &str) -> Option<&Path> {
        public_id
            .and_then(|id| self.public.get(id))
            .or_else(|| self.system.get(system_id))
            .map(PathBuf::as_path)
    }

    fn load(&self, path: &Path, system_id: &str) -> Result<Arc<[u8]>, EntityError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(body) = cache.get(path) {
            return Ok(Arc::clone(body));
        }
        let body: Arc<[u8]> = std::fs::read(path)
            .map_err(|source| EntityError::Io {
                system_id: system_id.to_string(),
                source,
            })?
            .into();
        cache.put(path.to_path_buf(), Arc::clone(&body));
        tracing::trace!(path = %path.display(), "cached external entity");
        Ok(body)
    }
}

impl Default for CatalogResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityResolver for CatalogResolver {
    fn resolve(
        &self,
        public_id: Option<&str>,
        system_id: &str,
    ) -> Result<Option<Arc<[u8]>>, EntityError> {
        if let Some(path) = self.lookup(public_id, system_id) {
            return self.load(path, system_id).map(Some);
        }
        // Unknown public ids are left to the event source
        if public_id.is_some() {
            return Ok(None);
        }

        let url = Url::parse(system_id)
            .map_err(|_| EntityError::InvalidSystemId(system_id.to_string()))?;
        if url.scheme() != "file" {
            return Err(EntityError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                system_id: system_id.to_string(),
            });
        }
        let path = url
            .to_file_path()
            .map_err(|_| EntityError::InvalidSystemId(system_id.to_string()))?;
        if path.is_file() {
            return self.load(&path, system_id).map(Some);
        }

        // Absolute path is not readable: retry the catalog with the bare file name
        let name = path.file_name().and_then(|n| n.to_str());
        match name.and_then(|n| self.lookup(None, n)) {
            Some(path) => self.load(path, system_id).map(Some),
            None => Ok(None),
        }
    }
}

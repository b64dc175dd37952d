//! Storage Backend Interface
//!
//! Operations the ingester needs from the store. Backends are shared by
//! concurrent ingestions, so every method takes `&self`; collection locking
//! is the backend's business and is exposed through [`CollectionLock`].

pub mod memory;

pub use memory::InMemoryBackend;

use crate::dom::document::Document;
use crate::dom::node::{DocId, NodeRef};
use crate::security::{Permission, User};
use thiserror::Error;

/// Errors reported by a backend
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("collection {0} not found")]
    CollectionNotFound(String),

    #[error("document {0} not found")]
    DocumentNotFound(String),

    #[error("collection {0} is locked")]
    Locked(String),

    #[error("database is read-only")]
    ReadOnly,

    /// The store refused a node or catalog write
    #[error("write rejected: {reason}")]
    WriteRejected { reason: String },

    /// A non-storage error interrupted the store pass
    #[error("store pass aborted: {reason}")]
    Aborted { reason: String },
}

/// Collection record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Absolute path
    pub path: String,
    pub permissions: Permission,
    /// Creation time, milliseconds since the epoch
    pub created: u64,
}

impl Collection {
    /// Create a collection record
    pub fn new(path: impl Into<String>, permissions: Permission, created: u64) -> Self {
        Self {
            path: path.into(),
            permissions,
            created,
        }
    }
}

/// Store operations consumed by the ingester
pub trait Backend: Send + Sync {
    /// Check if the store rejects all writes
    fn is_read_only(&self) -> bool {
        false
    }

    /// Fetch a collection without creating it
    fn collection(&self, path: &str) -> Result<Option<Collection>, BackendError>;

    /// Fetch a collection, creating it on behalf of `owner` if missing
    fn get_or_create_collection(
        &self,
        path: &str,
        owner: &User,
        now: u64,
    ) -> Result<Collection, BackendError>;

    /// Fetch the catalog entry at `path`
    fn document(&self, path: &str) -> Result<Option<Document>, BackendError>;

    /// Allocate a document id in `collection`
    fn next_doc_id(&self, collection: &Collection) -> Result<DocId, BackendError>;

    /// Take the exclusive write lock of a collection, blocking until free
    fn lock_collection(&self, path: &str) -> Result<(), BackendError>;

    /// Release a lock taken with [`Backend::lock_collection`]
    fn unlock_collection(&self, path: &str);

    /// Add an uncommitted catalog entry for `doc` at its path
    fn add_document(&self, doc: &Document) -> Result<(), BackendError>;

    /// Remove the catalog entry at `path`, leaving node content in place
    fn unlink_document(&self, path: &str) -> Result<(), BackendError>;

    /// Append a node of the document being stored under its structural path
    fn store_node(&self, node: NodeRef<'_>, path: &str) -> Result<(), BackendError>;

    /// Rewrite an already stored node whose child count grew
    fn update_node(&self, node: NodeRef<'_>) -> Result<(), BackendError>;

    /// Drop the node content of `doc`
    fn remove_document(&self, doc: &Document) -> Result<(), BackendError>;

    /// Flush `doc` and commit its catalog entry
    fn finalize(&self, doc: &Document) -> Result<(), BackendError>;

    /// Check if `user` holds `mode` on `subject`
    fn check_permission(&self, user: &User, subject: &Permission, mode: u16) -> bool {
        subject.validate(user, mode)
    }
}

/// Exclusive collection lock, released on drop
pub struct CollectionLock<'a> {
    backend: &'a dyn Backend,
    path: String,
}

impl<'a> CollectionLock<'a> {
    /// Lock the collection at `path`
    pub fn acquire(backend: &'a dyn Backend, path: &str) -> Result<Self, BackendError> {
        backend.lock_collection(path)?;
        tracing::trace!(collection = %path, "collection locked");
        Ok(Self {
            backend,
            path: path.to_string(),
        })
    }

    /// Path of the locked collection
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for CollectionLock<'_> {
    fn drop(&mut self) {
        self.backend.unlock_collection(&self.path);
        tracing::trace!(collection = %self.path, "collection unlocked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_released_on_drop() {
        let backend = InMemoryBackend::new();
        {
            let lock = CollectionLock::acquire(&backend, "/db").unwrap();
            assert_eq!(lock.path(), "/db");
            assert!(backend.is_locked("/db"));
        }
        assert!(!backend.is_locked("/db"));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::WriteRejected {
            reason: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "write rejected: disk full");
        assert_eq!(BackendError::ReadOnly.to_string(), "database is read-only");
    }
}

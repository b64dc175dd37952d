//! In-Memory Backend
//!
//! Reference [`Backend`] keeping collections, the document catalog and node
//! content in maps behind a mutex. Catalog entries remember whether they
//! were finalized, which makes the window between identity swap and commit
//! observable. Writes can be switched off or made to fail after a number of
//! nodes.

use super::{Backend, BackendError, Collection};
use crate::dom::document::Document;
use crate::dom::node::{DocId, Node, NodeRef};
use crate::security::{Permission, User};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Path of the collection every backend starts with
pub const ROOT_COLLECTION: &str = "/db";

/// Node content entry
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    /// Structural path the node was stored under
    pub path: String,
    pub node: Node,
}

#[derive(Debug)]
struct CatalogEntry {
    doc: Document,
    committed: bool,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Collection>,
    catalog: BTreeMap<String, CatalogEntry>,
    content: HashMap<DocId, Vec<StoredNode>>,
    last_doc_id: DocId,
    locked: HashSet<String>,
    read_only: bool,
    /// Node writes left before writes start failing
    write_budget: Option<usize>,
    updates: usize,
}

/// Map-backed store
#[derive(Debug)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    unlocked: Condvar,
}

impl InMemoryBackend {
    /// Create a store holding only the root collection, owned by `admin:dba`
    pub fn new() -> Self {
        let mut state = State::default();
        state.collections.insert(
            ROOT_COLLECTION.to_string(),
            Collection::new(ROOT_COLLECTION, Permission::new("admin", "dba", 0o755), 0),
        );
        Self {
            state: Mutex::new(state),
            unlocked: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch all writes off or on
    pub fn set_read_only(&self, read_only: bool) {
        self.state().read_only = read_only;
    }

    /// Reject every node write after the next `nodes` ones
    pub fn fail_writes_after(&self, nodes: usize) {
        self.state().write_budget = Some(nodes);
    }

    /// Add or replace a collection
    pub fn insert_collection(&self, collection: Collection) {
        self.state()
            .collections
            .insert(collection.path.clone(), collection);
    }

    /// Check if the catalog entry at `path` was finalized
    pub fn is_committed(&self, path: &str) -> bool {
        self.state().catalog.get(path).is_some_and(|e| e.committed)
    }

    /// Check if a collection is locked
    pub fn is_locked(&self, path: &str) -> bool {
        self.state().locked.contains(path)
    }

    /// Node content of the document at `path`, in storage order
    pub fn nodes(&self, path: &str) -> Vec<StoredNode> {
        let state = self.state();
        state
            .catalog
            .get(path)
            .and_then(|e| state.content.get(&e.doc.id))
            .cloned()
            .unwrap_or_default()
    }

    /// Check if any node content is kept for document `id`
    pub fn has_content(&self, id: DocId) -> bool {
        self.state().content.get(&id).is_some_and(|n| !n.is_empty())
    }

    /// Paths of all catalog entries
    pub fn document_paths(&self) -> Vec<String> {
        self.state().catalog.keys().cloned().collect()
    }

    /// Number of [`Backend::update_node`] calls served
    pub fn update_count(&self) -> usize {
        self.state().updates
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn writable(state: &State) -> Result<(), BackendError> {
    if state.read_only {
        Err(BackendError::ReadOnly)
    } else {
        Ok(())
    }
}

impl Backend for InMemoryBackend {
    fn is_read_only(&self) -> bool {
        self.state().read_only
    }

    fn collection(&self, path: &str) -> Result<Option<Collection>, BackendError> {
        Ok(self.state().collections.get(path).cloned())
    }

    fn get_or_create_collection(
        &self,
        path: &str,
        owner: &User,
        now: u64,
    ) -> Result<Collection, BackendError> {
        let mut state = self.state();
        if let Some(collection) = state.collections.get(path) {
            return Ok(collection.clone());
        }
        writable(&state)?;
        let collection = Collection::new(path, Permission::owned_by(owner), now);
        state
            .collections
            .insert(path.to_string(), collection.clone());
        tracing::debug!(collection = %path, owner = %owner.name(), "created collection");
        Ok(collection)
    }

    fn document(&self, path: &str) -> Result<Option<Document>, BackendError> {
        Ok(self.state().catalog.get(path).map(|e| e.doc.clone()))
    }

    fn next_doc_id(&self, collection: &Collection) -> Result<DocId, BackendError> {
        let mut state = self.state();
        if !state.collections.contains_key(&collection.path) {
            return Err(BackendError::CollectionNotFound(collection.path.clone()));
        }
        state.last_doc_id += 1;
        Ok(state.last_doc_id)
    }

    fn lock_collection(&self, path: &str) -> Result<(), BackendError> {
        let mut state = self.state();
        while state.locked.contains(path) {
            state = self
                .unlocked
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.locked.insert(path.to_string());
        Ok(())
    }

    fn unlock_collection(&self, path: &str) {
        self.state().locked.remove(path);
        self.unlocked.notify_all();
    }

    fn add_document(&self, doc: &Document) -> Result<(), BackendError> {
        let mut state = self.state();
        writable(&state)?;
        if state.catalog.contains_key(&doc.path) {
            return Err(BackendError::WriteRejected {
                reason: format!("catalog entry {} already exists", doc.path),
            });
        }
        state.catalog.insert(
            doc.path.clone(),
            CatalogEntry {
                doc: doc.clone(),
                committed: false,
            },
        );
        Ok(())
    }

    fn unlink_document(&self, path: &str) -> Result<(), BackendError> {
        let mut state = self.state();
        writable(&state)?;
        state
            .catalog
            .remove(path)
            .map(drop)
            .ok_or_else(|| BackendError::DocumentNotFound(path.to_string()))
    }

    fn store_node(&self, node: NodeRef<'_>, path: &str) -> Result<(), BackendError> {
        let mut state = self.state();
        writable(&state)?;
        if let Some(budget) = state.write_budget.as_mut() {
            if *budget == 0 {
                return Err(BackendError::WriteRejected {
                    reason: "node write budget exhausted".to_string(),
                });
            }
            *budget -= 1;
        }
        state
            .content
            .entry(node.doc())
            .or_default()
            .push(StoredNode {
                path: path.to_string(),
                node: node.to_node(),
            });
        Ok(())
    }

    fn update_node(&self, node: NodeRef<'_>) -> Result<(), BackendError> {
        let mut state = self.state();
        writable(&state)?;
        let stored = state
            .content
            .get_mut(&node.doc())
            .and_then(|nodes| {
                nodes
                    .iter_mut()
                    .find(|n| n.node.kind() == node.kind() && n.node.gid() == node.gid())
            })
            .ok_or_else(|| BackendError::WriteRejected {
                reason: format!("node {} of document {} was never stored", node.gid(), node.doc()),
            })?;
        stored.node = node.to_node();
        state.updates += 1;
        Ok(())
    }

    fn remove_document(&self, doc: &Document) -> Result<(), BackendError> {
        let mut state = self.state();
        writable(&state)?;
        state.content.remove(&doc.id);
        Ok(())
    }

    fn finalize(&self, doc: &Document) -> Result<(), BackendError> {
        let mut state = self.state();
        writable(&state)?;
        let entry = state
            .catalog
            .get_mut(&doc.path)
            .ok_or_else(|| BackendError::DocumentNotFound(doc.path.clone()))?;
        entry.doc = doc.clone();
        entry.committed = true;
        Ok(())
    }
}

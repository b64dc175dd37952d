//! Document Metadata
//!
//! The catalog record of a stored document. Node content lives in the
//! backend; this struct carries identity, timestamps, permissions and the
//! addressing parameters computed by the validate pass.

use super::node::DocId;
use crate::index::TreeLevelIndex;
use crate::security::Permission;

/// Content type recorded for documents stored by the ingester
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Name prefix of a document provisionally stored next to the one it replaces
pub const TEMPORARY_PREFIX: &str = "__";

/// Document type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentType {
    /// Declared root element name
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// Catalog record of a document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    /// Absolute path, `collection/name`
    pub path: String,
    /// Path of the owning collection
    pub collection: String,
    /// Creation time, milliseconds since the epoch
    pub created: u64,
    /// Last modification time, milliseconds since the epoch
    pub last_modified: u64,
    pub content_type: String,
    pub doctype: Option<DocumentType>,
    /// Deepest element level plus one, written once after the validate pass
    pub max_depth: usize,
    /// Per-level fan-out and positions
    pub levels: TreeLevelIndex,
    /// Top-level children (root element, comments, PIs)
    pub child_count: u32,
    pub permissions: Permission,
}

impl Document {
    /// Create an empty document `name` in `collection`
    pub fn new(
        collection: &str,
        name: &str,
        now: u64,
        permissions: Permission,
        spacing: u64,
    ) -> Self {
        Self {
            id: 0,
            path: join(collection, name),
            collection: collection.to_string(),
            created: now,
            last_modified: now,
            content_type: XML_CONTENT_TYPE.to_string(),
            doctype: None,
            max_depth: 0,
            levels: TreeLevelIndex::new(spacing),
            child_count: 0,
            permissions,
        }
    }

    /// Last path component
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map_or(self.path.as_str(), |(_, name)| name)
    }

    /// Move the document to `name` within its collection
    pub fn rename(&mut self, name: &str) {
        self.path = join(&self.collection, name);
    }

    /// Check if the document sits under its provisional name
    pub fn is_temporary(&self) -> bool {
        self.file_name().starts_with(TEMPORARY_PREFIX)
    }

    /// Take over creation time and permissions of the document being replaced
    pub fn inherit_from(&mut self, old: &Document) {
        self.created = old.created;
        self.permissions = old.permissions.clone();
    }

    /// Reserve the next top-level position
    #[inline]
    pub fn claim_child_slot(&mut self) -> u64 {
        let slot = u64::from(self.child_count);
        self.child_count += 1;
        slot
    }
}

fn join(collection: &str, name: &str) -> String {
    format!("{}/{}", collection.trim_end_matches('/'), name)
}

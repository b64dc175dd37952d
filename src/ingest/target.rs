//! Target Path Resolution

use crate::dom::document::TEMPORARY_PREFIX;
use crate::error::{IngestError, Result};
use std::fmt;

/// Resolved destination of an ingestion: collection plus document name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    collection: String,
    name: String,
}

impl TargetPath {
    /// Resolve `target` against the store root.
    ///
    /// A missing leading `/` is added and targets outside `root` are moved
    /// below it. An empty target takes the last component of `system_id`.
    pub fn resolve(target: &str, system_id: Option<&str>, root: &str) -> Result<Self> {
        let raw = if target.is_empty() {
            system_id
                .and_then(|id| id.rsplit('/').next())
                .filter(|name| !name.is_empty())
                .ok_or_else(|| IngestError::InvalidPath(target.to_string()))?
        } else {
            target
        };

        let mut path = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{raw}")
        };
        let root = root.trim_end_matches('/');
        let under_root = path
            .strip_prefix(root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if !under_root {
            path.insert_str(0, root);
        }

        let Some((collection, name)) = path.rsplit_once('/') else {
            return Err(IngestError::InvalidPath(path));
        };
        if name.is_empty() || collection.is_empty() {
            return Err(IngestError::InvalidPath(path));
        }
        Ok(Self {
            collection: collection.to_string(),
            name: name.to_string(),
        })
    }

    /// Path of the owning collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Document name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute document path
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.name)
    }

    /// Name used while the document replaces an existing one
    pub fn temporary_name(&self) -> String {
        format!("{}{}", TEMPORARY_PREFIX, self.name)
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.name)
    }
}

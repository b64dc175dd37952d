//! Permission Gate
//!
//! Unix-style owner/group/other permission bits on collections and
//! documents, and the checks an ingestion must pass before it touches the
//! backend.

use crate::dom::document::Document;
use crate::error::{IngestError, Result};
use crate::storage::{Backend, Collection};

/// Read access
pub const READ: u16 = 4;
/// Write access: create documents in a collection
pub const WRITE: u16 = 2;
/// Update access: replace an existing document
pub const UPDATE: u16 = 1;

/// Mode given to new collections and documents
pub const DEFAULT_MODE: u16 = 0o755;

/// Group whose members pass every check
pub const DBA_GROUP: &str = "dba";

/// Authenticated principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
    /// Group memberships, the primary group first
    groups: Vec<String>,
}

impl User {
    /// Create a user with a primary group
    pub fn new(name: impl Into<String>, primary_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: vec![primary_group.into()],
        }
    }

    /// Create a database administrator
    pub fn dba(name: impl Into<String>) -> Self {
        Self::new(name, DBA_GROUP)
    }

    /// Add a secondary group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// User name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary group
    pub fn primary_group(&self) -> &str {
        self.groups.first().map_or("", String::as_str)
    }

    /// Check group membership
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Check if the user administers the database
    pub fn is_dba(&self) -> bool {
        self.in_group(DBA_GROUP)
    }
}

/// Owner, group and mode bits of a collection or document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub owner: String,
    pub group: String,
    pub mode: u16,
}

impl Permission {
    /// Create a permission set
    pub fn new(owner: impl Into<String>, group: impl Into<String>, mode: u16) -> Self {
        Self {
            owner: owner.into(),
            group: group.into(),
            mode,
        }
    }

    /// Default permissions for something created by `user`
    pub fn owned_by(user: &User) -> Self {
        Self::new(user.name(), user.primary_group(), DEFAULT_MODE)
    }

    /// Check if `user` holds every bit of `required`.
    ///
    /// The owner is judged by the owner bits only, group members by the
    /// group bits, everybody else by the other bits.
    pub fn validate(&self, user: &User, required: u16) -> bool {
        if user.is_dba() {
            return true;
        }
        let shift = if user.name() == self.owner {
            6
        } else if user.in_group(&self.group) {
            3
        } else {
            0
        };
        let granted = (self.mode >> shift) & 0o7;
        granted & required == required
    }
}

/// Authorizes create and overwrite requests through the backend
pub struct PermissionGate<'a> {
    backend: &'a dyn Backend,
    user: &'a User,
}

impl<'a> PermissionGate<'a> {
    /// Create a gate for `user`
    pub fn new(backend: &'a dyn Backend, user: &'a User) -> Self {
        Self { backend, user }
    }

    /// Reject any write to a read-only backend
    pub fn check_writable(&self) -> Result<()> {
        if self.backend.is_read_only() {
            return Err(IngestError::PermissionDenied(
                "database is read-only".to_string(),
            ));
        }
        Ok(())
    }

    /// Check that a new document may be created in the collection at `path`.
    ///
    /// A collection that does not exist yet is judged by its nearest
    /// existing ancestor, which is where it would be created.
    pub fn check_create(&self, path: &str) -> Result<()> {
        let Some(collection) = self.nearest_collection(path)? else {
            if self.user.is_dba() {
                return Ok(());
            }
            return Err(IngestError::PermissionDenied(format!(
                "user '{}' not allowed to create collection '{}'",
                self.user.name(),
                path
            )));
        };
        if !self
            .backend
            .check_permission(self.user, &collection.permissions, WRITE)
        {
            return Err(IngestError::PermissionDenied(format!(
                "user '{}' not allowed to write to collection '{}'",
                self.user.name(),
                collection.path
            )));
        }
        Ok(())
    }

    /// Collection at `path` or its closest existing ancestor
    fn nearest_collection(&self, path: &str) -> Result<Option<Collection>> {
        let mut current = path.trim_end_matches('/');
        while !current.is_empty() {
            if let Some(collection) = self.backend.collection(current)? {
                return Ok(Some(collection));
            }
            current = current.rsplit_once('/').map_or("", |(parent, _)| parent);
        }
        Ok(None)
    }

    /// Check that `existing` may be replaced
    pub fn check_overwrite(&self, existing: &Document) -> Result<()> {
        if !self
            .backend
            .check_permission(self.user, &existing.permissions, UPDATE)
        {
            return Err(IngestError::PermissionDenied(format!(
                "document exists and update is not allowed for user '{}' on '{}'",
                self.user.name(),
                existing.path
            )));
        }
        Ok(())
    }
}

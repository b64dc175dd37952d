//! Commit Coordinator
//!
//! Runs an ingestion as two passes over the same event source:
//!
//! ```text
//! Idle -> Validating -> Indexed -> Storing -> Committed
//!             |                       |
//!             +------> Failed <-------+
//! ```
//!
//! The validate pass builds the tree in memory and has no backend side
//! effects. The collection lock is not held while it runs, so the catalog
//! entry is looked up and admitted again before the store pass. Once the
//! level positions are computed the identity swap happens: the old catalog entry is unlinked and the new document is
//! installed under the final path *before* its content is stored. A failure
//! after that point leaves a partially written document behind and is
//! reported as [`IngestError::BackendFailure`].

pub mod progress;
pub mod target;


pub use progress::{Progress, ProgressIndicator, ProgressObserver};
pub use target::TargetPath;

use crate::clock::{to_datetime, Clock, SystemClock};
use crate::config::IndexerConfig;
use crate::core::entities::EntityResolver;
use crate::dom::document::Document;
use crate::dom::node::DocId;
use crate::error::{IngestError, Result};
use crate::index::TreeBuilder;
use crate::sax::EventSource;
use crate::security::{Permission, PermissionGate, User};
use crate::storage::{Backend, CollectionLock};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Ingestion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Indexed,
    Storing,
    Committed,
    Failed,
}

impl Phase {
    /// Check if the ingestion is over
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Committed | Phase::Failed)
    }
}

/// Result of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub id: DocId,
    /// Absolute document path
    pub path: String,
    /// Deepest element level plus one
    pub max_depth: usize,
    /// Top-level children
    pub child_count: u32,
    /// Creation time, milliseconds since the epoch
    pub created: u64,
    /// Last modification time, milliseconds since the epoch
    pub last_modified: u64,
}

impl DocumentHandle {
    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        to_datetime(self.created)
    }

    /// Last modification time
    pub fn last_modified_at(&self) -> DateTime<Utc> {
        to_datetime(self.last_modified)
    }
}

impl From<&Document> for DocumentHandle {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            path: doc.path.clone(),
            max_depth: doc.max_depth,
            child_count: doc.child_count,
            created: doc.created,
            last_modified: doc.last_modified,
        }
    }
}

/// Outcome of the validate pass
struct Validated {
    doc: Document,
    /// Catalog entry seen when the ingestion was admitted
    old: Option<Document>,
    lines: u32,
}

/// Two-phase document ingester
pub struct Ingester<'a> {
    backend: &'a dyn Backend,
    user: &'a User,
    config: IndexerConfig,
    clock: Arc<dyn Clock>,
    resolver: Option<&'a dyn EntityResolver>,
    observer: Option<Box<dyn ProgressObserver + 'a>>,
    phase: Phase,
}

impl<'a> Ingester<'a> {
    /// Create an ingester storing into `backend` on behalf of `user`
    pub fn new(backend: &'a dyn Backend, user: &'a User) -> Self {
        Self {
            backend,
            user,
            config: IndexerConfig::default(),
            clock: Arc::new(SystemClock),
            resolver: None,
            observer: None,
            phase: Phase::Idle,
        }
    }

    /// Use `config` instead of the defaults
    pub fn with_config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    /// Take timestamps from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve external entities through `resolver`
    pub fn with_resolver(mut self, resolver: &'a dyn EntityResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Report store pass progress to `observer`
    pub fn with_progress(mut self, observer: impl ProgressObserver + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Phase of the last (or running) ingestion
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Configuration in use
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Store the document produced by `source` at `target`.
    ///
    /// `source` is streamed twice. An existing document at `target` is only
    /// replaced if `overwrite` is set.
    pub fn ingest(
        &mut self,
        source: &mut dyn EventSource,
        target: &str,
        overwrite: bool,
    ) -> Result<DocumentHandle> {
        self.phase = Phase::Idle;
        let result = self.run(source, target, overwrite);
        if result.is_err() {
            self.phase = Phase::Failed;
        }
        result
    }

    fn run(
        &mut self,
        source: &mut dyn EventSource,
        target: &str,
        overwrite: bool,
    ) -> Result<DocumentHandle> {
        let target = TargetPath::resolve(target, source.system_id(), &self.config.root_collection)?;
        let validated = self.validate(source, &target, overwrite)?;
        self.store(source, &target, overwrite, validated)
    }

    /// Check that the entry currently at `target` may be created or replaced
    fn admit(
        &self,
        gate: &PermissionGate<'_>,
        target: &TargetPath,
        overwrite: bool,
        existing: Option<&Document>,
    ) -> Result<()> {
        match existing {
            Some(_) if !overwrite => Err(IngestError::DocumentExists {
                path: target.path(),
            }),
            Some(existing) => gate.check_overwrite(existing),
            None => gate.check_create(target.collection()),
        }
    }

    /// Name `doc` and set its metadata for replacing `existing`, or for
    /// creating a new entry when there is none
    fn prepare(&self, doc: &mut Document, target: &TargetPath, existing: Option<&Document>) {
        match existing {
            Some(existing) => {
                doc.rename(&target.temporary_name());
                doc.inherit_from(existing);
            }
            None => {
                doc.rename(target.name());
                doc.created = doc.last_modified;
                doc.permissions = Permission::owned_by(self.user);
            }
        }
    }

    fn validate(
        &mut self,
        source: &mut dyn EventSource,
        target: &TargetPath,
        overwrite: bool,
    ) -> Result<Validated> {
        let gate = PermissionGate::new(self.backend, self.user);
        gate.check_writable()?;

        self.phase = Phase::Validating;
        debug!(document = %target, user = %self.user.name(), "validating document");

        let (mut doc, old) = {
            let _lock = CollectionLock::acquire(self.backend, target.collection())?;
            let old = self.backend.document(&target.path())?;
            self.admit(&gate, target, overwrite, old.as_ref())?;

            let mut doc = Document::new(
                target.collection(),
                target.name(),
                self.clock.now_millis(),
                Permission::owned_by(self.user),
                self.config.sparse_identifiers,
            );
            self.prepare(&mut doc, target, old.as_ref());
            (doc, old)
        };

        let summary = {
            let mut builder = TreeBuilder::validating(&mut doc, &self.config);
            if let Some(resolver) = self.resolver {
                builder = builder.with_resolver(resolver);
            }
            source.stream(&mut builder)?;
            builder.finish()
        };

        doc.max_depth = summary.max_depth;
        doc.levels.compute(doc.max_depth)?;
        debug!(
            document = %target,
            max_depth = doc.max_depth,
            levels = ?doc.levels.orders(),
            "document validated"
        );
        Ok(Validated {
            doc,
            old,
            lines: summary.lines,
        })
    }

    fn store(
        &mut self,
        source: &mut dyn EventSource,
        target: &TargetPath,
        overwrite: bool,
        validated: Validated,
    ) -> Result<DocumentHandle> {
        let Validated {
            mut doc,
            old,
            lines,
        } = validated;

        let _lock = CollectionLock::acquire(self.backend, target.collection())?;

        // The lock was released while validating; another writer may have
        // replaced or created the entry in the meantime.
        let gate = PermissionGate::new(self.backend, self.user);
        gate.check_writable()?;
        let current = self.backend.document(&target.path())?;
        self.admit(&gate, target, overwrite, current.as_ref())?;
        if current.as_ref().map(|d| d.id) != old.as_ref().map(|d| d.id) {
            warn!(
                document = %target,
                validated = ?old.as_ref().map(|d| d.id),
                current = ?current.as_ref().map(|d| d.id),
                "catalog entry changed during validation"
            );
            self.prepare(&mut doc, target, current.as_ref());
        }

        let collection =
            self.backend
                .get_or_create_collection(target.collection(), self.user, doc.created)?;
        doc.id = self.backend.next_doc_id(&collection)?;

        // Identity swap: the first mutation
        match &current {
            Some(existing) => {
                self.backend.unlink_document(&existing.path)?;
                doc.rename(existing.file_name());
                self.backend
                    .add_document(&doc)
                    .map_err(|err| IngestError::from(err).into_store_failure(&doc.path))?;
            }
            None => self.backend.add_document(&doc)?,
        }
        self.phase = Phase::Indexed;
        debug!(document = %doc.path, id = doc.id, "identity swapped");

        if let Err(err) = self.store_content(source, &mut doc, current.as_ref(), lines) {
            error!(
                document = %doc.path,
                error = %err,
                "store pass failed, document left partially written"
            );
            return Err(err.into_store_failure(&doc.path));
        }

        self.phase = Phase::Committed;
        info!(
            document = %doc.path,
            id = doc.id,
            max_depth = doc.max_depth,
            replaced = current.is_some(),
            "document committed"
        );
        Ok(DocumentHandle::from(&doc))
    }

    /// Replay the source into the backend and commit. Everything here may
    /// leave a partial document behind.
    fn store_content(
        &mut self,
        source: &mut dyn EventSource,
        doc: &mut Document,
        replaced: Option<&Document>,
        lines: u32,
    ) -> Result<()> {
        self.phase = Phase::Storing;
        debug!(document = %doc.path, "storing document");
        {
            let config = &self.config;
            let mut builder = TreeBuilder::storing(doc, config, self.backend);
            if let Some(resolver) = self.resolver {
                builder = builder.with_resolver(resolver);
            }
            if let Some(observer) = self.observer.as_deref_mut() {
                let indicator = ProgressIndicator::new(lines, config.progress_step);
                builder = builder.with_progress(indicator, observer);
            }
            source.stream(&mut builder)?;
        }

        self.backend.finalize(doc)?;
        if let Some(replaced) = replaced {
            self.backend.remove_document(replaced)?;
        }
        Ok(())
    }
}

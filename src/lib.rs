//! xmlstore - Two-phase XML ingestion into a node store
//!
//! Phases:
//! 1. Validate: stream the events once, build the tree in memory and record
//!    per-level fan-out and depth. Nothing reaches the backend.
//! 2. Store: compute level positions, swap the document identity in the
//!    catalog and stream the events again, handing every positioned node to
//!    the backend.
//!
//! ```no_run
//! use xmlstore::{EventLog, InMemoryBackend, Ingester, User};
//!
//! let backend = InMemoryBackend::new();
//! let user = User::dba("admin");
//! let mut source = EventLog::new().start("note").text("hello").end();
//!
//! let handle = Ingester::new(&backend, &user)
//!     .ingest(&mut source, "/db/notes/hello.xml", false)?;
//! assert_eq!(handle.max_depth, 2);
//! # Ok::<(), xmlstore::IngestError>(())
//! ```

pub mod clock;
pub mod config;
pub mod core;
pub mod dom;
pub mod error;
pub mod index;
pub mod ingest;
pub mod sax;
pub mod security;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, IndexerConfig};
pub use crate::core::{CatalogResolver, EntityError, EntityResolver, WhitespaceMode};
pub use dom::{Document, DocumentType, Node, NodeKind, NodeRef};
pub use error::{IngestError, Result};
pub use index::{TreeBuilder, TreeLevelIndex};
pub use ingest::{DocumentHandle, Ingester, Phase, Progress, ProgressObserver};
pub use sax::{ContentHandler, EventLog, EventSource};
pub use security::{Permission, User};
pub use storage::{Backend, BackendError, Collection, InMemoryBackend};

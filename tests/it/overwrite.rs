use crate::helpers::{catalog, ingester, texts, T0};
use xmlstore::sax::{ContentHandler, EventSource};
use xmlstore::security::Permission;
use xmlstore::{Backend, Collection, EventLog, InMemoryBackend, IngestError, Phase, User};

#[test]
fn test_overwrite_keeps_permissions_and_creation_time() {
    let backend = InMemoryBackend::new();
    backend.insert_collection(Collection::new(
        "/db/lib",
        Permission::new("alice", "staff", 0o755),
        0,
    ));
    let owner = User::new("alice", "staff");
    let first = ingester(&backend, &owner)
        .ingest(&mut catalog(&["old"]), "/db/lib/c.xml", false)
        .unwrap();
    assert_eq!(first.created, T0);

    let editor = User::dba("admin");
    let second = ingester(&backend, &editor)
        .ingest(&mut catalog(&["new", "newer"]), "/db/lib/c.xml", true)
        .unwrap();

    assert_eq!(backend.document_paths(), vec!["/db/lib/c.xml".to_string()]);
    let doc = backend.document("/db/lib/c.xml").unwrap().unwrap();
    assert_eq!(doc.id, second.id);
    assert_eq!(doc.permissions, Permission::new("alice", "staff", 0o755));
    assert_eq!(doc.created, first.created);
    assert!(!doc.is_temporary());
    assert_eq!(texts(&backend.nodes("/db/lib/c.xml")), vec!["new", "newer"]);
    assert!(!backend.has_content(first.id));
}

#[test]
fn test_failed_overwrite_leaves_old_document() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let first = ingester(&backend, &user)
        .ingest(&mut catalog(&["kept"]), "/db/c.xml", false)
        .unwrap();

    let mut broken = EventLog::new().start("catalog").start("book").end();
    let mut ingester = ingester(&backend, &user);
    let err = ingester.ingest(&mut broken, "/db/c.xml", true).unwrap_err();
    assert!(err.is_malformed());
    assert_eq!(ingester.phase(), Phase::Failed);

    assert_eq!(backend.document_paths(), vec!["/db/c.xml".to_string()]);
    let doc = backend.document("/db/c.xml").unwrap().unwrap();
    assert_eq!(doc.id, first.id);
    assert!(backend.is_committed("/db/c.xml"));
    assert_eq!(texts(&backend.nodes("/db/c.xml")), vec!["kept"]);
}

#[test]
fn test_existing_document_requires_overwrite() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    ingester(&backend, &user)
        .ingest(&mut catalog(&["a"]), "/db/c.xml", false)
        .unwrap();

    let err = ingester(&backend, &user)
        .ingest(&mut catalog(&["b"]), "c.xml", false)
        .unwrap_err();
    assert!(matches!(err, IngestError::DocumentExists { path } if path == "/db/c.xml"));
    assert_eq!(texts(&backend.nodes("/db/c.xml")), vec!["a"]);
}

#[test]
fn test_overwrite_store_failure_loses_old_document() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let first = ingester(&backend, &user)
        .ingest(&mut catalog(&["old"]), "/db/c.xml", false)
        .unwrap();

    backend.fail_writes_after(1);
    let err = ingester(&backend, &user)
        .ingest(&mut catalog(&["new"]), "/db/c.xml", true)
        .unwrap_err();
    assert!(err.leaves_partial_document());

    // The swap happened before the failure: the catalog points at the new
    // partial document and the old content is no longer reachable.
    let doc = backend.document("/db/c.xml").unwrap().unwrap();
    assert_ne!(doc.id, first.id);
    assert!(!backend.is_committed("/db/c.xml"));
    assert_eq!(backend.nodes("/db/c.xml").len(), 1);
}

/// Source that lets another writer ingest `target` while it is validated
struct RacingSource<'a> {
    backend: &'a InMemoryBackend,
    user: &'a User,
    target: &'static str,
    overwrite: bool,
    events: EventLog,
    rival: Option<EventLog>,
    rival_result: Option<xmlstore::Result<xmlstore::DocumentHandle>>,
}

impl<'a> RacingSource<'a> {
    fn new(
        backend: &'a InMemoryBackend,
        user: &'a User,
        target: &'static str,
        overwrite: bool,
    ) -> Self {
        Self {
            backend,
            user,
            target,
            overwrite,
            events: catalog(&["outer"]),
            rival: Some(catalog(&["rival"])),
            rival_result: None,
        }
    }
}

impl EventSource for RacingSource<'_> {
    fn stream(&mut self, handler: &mut dyn ContentHandler) -> xmlstore::Result<()> {
        if let Some(mut rival) = self.rival.take() {
            let result = ingester(self.backend, self.user).ingest(
                &mut rival,
                self.target,
                self.overwrite,
            );
            self.rival_result = Some(result);
        }
        self.events.stream(handler)
    }
}

#[test]
fn test_concurrent_create_fails_before_swap() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let mut source = RacingSource::new(&backend, &user, "/db/r.xml", false);

    let err = ingester(&backend, &user)
        .ingest(&mut source, "/db/r.xml", false)
        .unwrap_err();
    let rival = source.rival_result.take().unwrap().unwrap();

    assert!(matches!(err, IngestError::DocumentExists { .. }));
    assert!(!err.leaves_partial_document());
    assert!(backend.is_committed("/db/r.xml"));
    let doc = backend.document("/db/r.xml").unwrap().unwrap();
    assert_eq!(doc.id, rival.id);
    assert_eq!(texts(&backend.nodes("/db/r.xml")), vec!["rival"]);
}

#[test]
fn test_concurrent_overwrite_replaces_current_entry() {
    let backend = InMemoryBackend::new();
    let owner = User::new("alice", "staff");
    backend.insert_collection(Collection::new(
        "/db",
        Permission::new("admin", "dba", 0o777),
        0,
    ));
    let first = ingester(&backend, &owner)
        .ingest(&mut catalog(&["first"]), "/db/r.xml", false)
        .unwrap();

    let admin = User::dba("admin");
    let mut source = RacingSource::new(&backend, &admin, "/db/r.xml", true);
    let outer = ingester(&backend, &admin)
        .ingest(&mut source, "/db/r.xml", true)
        .unwrap();
    let rival = source.rival_result.take().unwrap().unwrap();

    assert_eq!(backend.document_paths(), vec!["/db/r.xml".to_string()]);
    let doc = backend.document("/db/r.xml").unwrap().unwrap();
    assert_eq!(doc.id, outer.id);
    assert_eq!(doc.permissions.owner, "alice");
    assert_eq!(texts(&backend.nodes("/db/r.xml")), vec!["outer"]);

    // Neither replaced document keeps orphaned content
    assert!(!backend.has_content(first.id));
    assert!(!backend.has_content(rival.id));
}

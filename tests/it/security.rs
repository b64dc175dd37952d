use crate::helpers::{catalog, ingester};
use xmlstore::security::Permission;
use xmlstore::{Backend, Collection, InMemoryBackend, User};

fn restricted_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.insert_collection(Collection::new(
        "/db/team",
        Permission::new("lead", "team", 0o750),
        0,
    ));
    backend
}

#[test]
fn test_create_denied_without_write_access() {
    let backend = restricted_backend();
    let outsider = User::new("guest", "guest");

    let err = ingester(&backend, &outsider)
        .ingest(&mut catalog(&["x"]), "/db/team/x.xml", false)
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert!(backend.document("/db/team/x.xml").unwrap().is_none());
    assert!(backend.document_paths().is_empty());
}

#[test]
fn test_group_member_without_write_bit() {
    let backend = restricted_backend();
    let member = User::new("bob", "team");

    // Group bits are r-x
    let err = ingester(&backend, &member)
        .ingest(&mut catalog(&["x"]), "/db/team/x.xml", false)
        .unwrap_err();
    assert!(err.is_permission_denied());
}

#[test]
fn test_owner_and_dba_may_create() {
    let backend = restricted_backend();
    let lead = User::new("lead", "team");
    ingester(&backend, &lead)
        .ingest(&mut catalog(&["x"]), "/db/team/x.xml", false)
        .unwrap();

    let admin = User::dba("admin");
    ingester(&backend, &admin)
        .ingest(&mut catalog(&["y"]), "/db/team/y.xml", false)
        .unwrap();
    assert_eq!(backend.document_paths().len(), 2);
}

#[test]
fn test_overwrite_by_other_user_keeps_owner() {
    let backend = InMemoryBackend::new();
    backend.insert_collection(Collection::new(
        "/db/shared",
        Permission::new("admin", "dba", 0o777),
        0,
    ));
    let owner = User::new("alice", "staff");
    let other = User::new("carol", "writers");

    ingester(&backend, &owner)
        .ingest(&mut catalog(&["mine"]), "/db/shared/a.xml", false)
        .unwrap();
    // Default mode 0755 carries the update bit for everybody
    ingester(&backend, &other)
        .ingest(&mut catalog(&["theirs"]), "/db/shared/a.xml", true)
        .unwrap();

    let doc = backend.document("/db/shared/a.xml").unwrap().unwrap();
    assert_eq!(doc.permissions.owner, "alice");
    assert_eq!(doc.permissions.group, "staff");
}

#[test]
fn test_read_only_store_rejects_ingestion() {
    let backend = InMemoryBackend::new();
    backend.set_read_only(true);
    let admin = User::dba("admin");

    let err = ingester(&backend, &admin)
        .ingest(&mut catalog(&["x"]), "/db/x.xml", false)
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert!(!backend.is_locked("/db"));
}

#[test]
fn test_missing_collection_needs_write_on_ancestor() {
    let backend = restricted_backend();
    let guest = User::new("guest", "guest");

    let err = ingester(&backend, &guest)
        .ingest(&mut catalog(&["x"]), "/db/newcoll/x.xml", false)
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert!(backend.collection("/db/newcoll").unwrap().is_none());
    assert!(backend.document_paths().is_empty());

    // Nearest existing ancestor is /db/team, closed to others
    let err = ingester(&backend, &guest)
        .ingest(&mut catalog(&["x"]), "/db/team/sub/x.xml", false)
        .unwrap_err();
    assert!(err.is_permission_denied());

    backend.insert_collection(Collection::new(
        "/db/drop",
        Permission::new("admin", "dba", 0o777),
        0,
    ));
    ingester(&backend, &guest)
        .ingest(&mut catalog(&["x"]), "/db/drop/sub/x.xml", false)
        .unwrap();
    let created = backend.collection("/db/drop/sub").unwrap().unwrap();
    assert_eq!(created.permissions.owner, "guest");
}

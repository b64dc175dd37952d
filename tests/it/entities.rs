use crate::helpers::ingester;
use std::io::Write;
use xmlstore::{CatalogResolver, EventLog, InMemoryBackend, IngestError, User};

fn with_entity(public_id: Option<&str>, system_id: &str) -> EventLog {
    EventLog::new()
        .dtd("book", public_id, Some(system_id))
        .entity(public_id, system_id)
        .start("book")
        .text("body")
        .end()
}

#[test]
fn test_entity_resolved_once_across_passes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.dtd");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"<!ELEMENT book (#PCDATA)>")
        .unwrap();
    let resolver = CatalogResolver::new().add_public("-//TEST//DTD Book//EN", &path);

    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let mut log = with_entity(Some("-//TEST//DTD Book//EN"), "http://example.com/book.dtd");
    ingester(&backend, &user)
        .with_resolver(&resolver)
        .ingest(&mut log, "/db/book.xml", false)
        .unwrap();

    assert_eq!(resolver.cached_entries(), 1);
    let doc = xmlstore::Backend::document(&backend, "/db/book.xml")
        .unwrap()
        .unwrap();
    let doctype = doc.doctype.unwrap();
    assert_eq!(doctype.public_id.as_deref(), Some("-//TEST//DTD Book//EN"));
}

#[test]
fn test_file_url_resolved_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.ent");
    std::fs::write(&path, b"local").unwrap();
    let url = url::Url::from_file_path(&path).unwrap();
    let resolver = CatalogResolver::new();

    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    ingester(&backend, &user)
        .with_resolver(&resolver)
        .ingest(&mut with_entity(None, url.as_str()), "/db/local.xml", false)
        .unwrap();
    assert_eq!(resolver.cached_entries(), 1);
}

#[test]
fn test_unsupported_scheme_is_malformed_input() {
    let resolver = CatalogResolver::new();
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");

    let err = ingester(&backend, &user)
        .with_resolver(&resolver)
        .ingest(
            &mut with_entity(None, "https://example.com/remote.dtd"),
            "/db/remote.xml",
            false,
        )
        .unwrap_err();
    match err {
        IngestError::MalformedInput { message, .. } => assert!(message.contains("https")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(xmlstore::Backend::document(&backend, "/db/remote.xml")
        .unwrap()
        .is_none());
}

#[test]
fn test_without_resolver_entities_are_left_to_the_source() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    ingester(&backend, &user)
        .ingest(
            &mut with_entity(None, "https://example.com/remote.dtd"),
            "/db/plain.xml",
            false,
        )
        .unwrap();
}

use crate::helpers::{catalog, ingester, texts};
use xmlstore::dom::{Node, NodeKind};
use xmlstore::index::{Pass, TreeBuilder};
use xmlstore::sax::{Attribute, EventSource, StartElement};
use xmlstore::{
    Backend, Document, EventLog, InMemoryBackend, IndexerConfig, Permission, User, WhitespaceMode,
};

#[test]
fn test_depth_matches_across_passes() {
    let config = IndexerConfig::default();
    let mut log = catalog(&["a", "b", "c"]);

    let mut depths = Vec::new();
    for _ in 0..2 {
        let mut doc = Document::new("/db", "c.xml", 0, Permission::new("admin", "dba", 0o755), 0);
        let mut builder = TreeBuilder::validating(&mut doc, &config);
        assert_eq!(builder.pass(), Pass::Validate);
        log.stream(&mut builder).unwrap();
        depths.push(builder.finish().max_depth);
    }
    assert_eq!(depths, vec![4, 4]);

    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let handle = ingester(&backend, &user)
        .ingest(&mut log, "/db/catalog.xml", false)
        .unwrap();
    assert_eq!(handle.max_depth, 4);
}

#[test]
fn test_children_keep_document_order() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    ingester(&backend, &user)
        .ingest(&mut catalog(&["one", "two", "three"]), "/db/c.xml", false)
        .unwrap();

    let doc = backend.document("/db/c.xml").unwrap().unwrap();
    let nodes = backend.nodes("/db/c.xml");
    let root = nodes[0].node.gid();
    assert_eq!(doc.levels.level_of(root), Some(1));

    let books: Vec<_> = nodes
        .iter()
        .filter(|n| n.node.kind() == NodeKind::Element && n.path == "/catalog/book")
        .map(|n| n.node.gid())
        .collect();
    assert_eq!(books.len(), 3);
    assert!(books.windows(2).all(|w| w[0] < w[1]));
    for gid in &books {
        assert_eq!(doc.levels.parent_gid(2, *gid), Some(root));
    }
    assert_eq!(texts(&nodes), vec!["one", "two", "three"]);
}

#[test]
fn test_filtered_attributes_never_stored() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let mut log = EventLog::new()
        .prefix("x", "urn:x")
        .start_with(
            StartElement::namespaced("urn:x", "x:root")
                .with_attribute(Attribute::new("xmlns:x", "urn:x"))
                .with_attribute(Attribute::namespaced(
                    "http://exist.sourceforge.net/NS/exist",
                    "exist:id",
                    "3",
                ))
                .with_attribute(Attribute::new("version", "2")),
        )
        .end()
        .end_prefix("x");
    ingester(&backend, &user)
        .ingest(&mut log, "/db/ns.xml", false)
        .unwrap();

    let nodes = backend.nodes("/db/ns.xml");
    let attrs: Vec<_> = nodes
        .iter()
        .filter_map(|n| match &n.node {
            Node::Attribute(a) => Some(a.name.qualified()),
            _ => None,
        })
        .collect();
    assert_eq!(attrs, vec!["version".to_string()]);
    assert_eq!(nodes[0].node.as_element().unwrap().attribute_count, 1);
}

#[test]
fn test_comment_between_text_without_whitespace_suppression() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let config = IndexerConfig::default().with_whitespace(WhitespaceMode::None);
    let mut log = EventLog::new().start("a").text("x").comment("c").text("y").end();
    ingester(&backend, &user)
        .with_config(config)
        .ingest(&mut log, "/db/mixed.xml", false)
        .unwrap();

    let nodes = backend.nodes("/db/mixed.xml");
    let summary: Vec<_> = nodes
        .iter()
        .map(|n| match &n.node {
            Node::Element(e) => format!("element:{}", e.name.qualified()),
            Node::Text(t) => format!("text:{}", t.data),
            Node::Comment(c) => format!("comment:{}", c.data),
            other => format!("{:?}", other.kind()),
        })
        .collect();
    assert_eq!(summary, vec!["element:a", "text:x", "comment:c", "text:y"]);

    let root = nodes[0].node.as_element().unwrap();
    assert_eq!(root.child_count, 3);
}

#[test]
fn test_deep_nesting_rejected_before_storing() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let mut log = EventLog::new();
    // Two children per level doubles the positions at every level
    for _ in 0..70 {
        log = log.start("n").start("leaf").end();
    }
    for _ in 0..70 {
        log = log.end();
    }

    let err = ingester(&backend, &user)
        .ingest(&mut log, "/db/deep.xml", false)
        .unwrap_err();
    assert!(matches!(err, xmlstore::IngestError::DepthExceeded { .. }));
    assert!(backend.document_paths().is_empty());
}

#[test]
fn test_backend_failure_leaves_partial_document() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    backend.fail_writes_after(3);

    let err = ingester(&backend, &user)
        .ingest(&mut catalog(&["a", "b"]), "/db/partial.xml", false)
        .unwrap_err();
    assert!(err.leaves_partial_document());
    assert!(!backend.is_committed("/db/partial.xml"));
    assert_eq!(backend.nodes("/db/partial.xml").len(), 3);
    assert!(!backend.is_locked("/db"));
}

#[test]
fn test_fatal_error_reported_with_line() {
    let backend = InMemoryBackend::new();
    let user = User::dba("admin");
    let mut log = EventLog::new().start("a").line(9).fatal("unexpected '<'");

    let err = ingester(&backend, &user)
        .ingest(&mut log, "/db/bad.xml", false)
        .unwrap_err();
    assert!(matches!(
        err,
        xmlstore::IngestError::MalformedInput { line: 9, .. }
    ));
    assert!(backend.document_paths().is_empty());
}

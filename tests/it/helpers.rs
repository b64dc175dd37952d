use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use xmlstore::dom::Node;
use xmlstore::storage::memory::StoredNode;
use xmlstore::{Clock, EventLog, InMemoryBackend, Ingester, User};

/// 2024-01-01 00:00:00 UTC
pub const T0: u64 = 1704067200000;

/// Clock ticking one millisecond per read
#[derive(Debug)]
pub struct StepClock(AtomicU64);

impl Clock for StepClock {
    fn now_millis(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

pub fn clock() -> Arc<dyn Clock> {
    Arc::new(StepClock(AtomicU64::new(T0)))
}

pub fn ingester<'a>(backend: &'a InMemoryBackend, user: &'a User) -> Ingester<'a> {
    Ingester::new(backend, user).with_clock(clock())
}

/// `<catalog><book id=".."><title>..</title></book>...</catalog>`
pub fn catalog(titles: &[&str]) -> EventLog {
    let mut log = EventLog::new().start("catalog");
    for (i, title) in titles.iter().enumerate() {
        let line = i as u32 + 2;
        log = log
            .line(line)
            .start("book")
            .attr(xmlstore::sax::Attribute::id("id", format!("b{i}")))
            .start("title")
            .text(title)
            .end()
            .end();
    }
    log.line(titles.len() as u32 + 2).end()
}

pub fn texts(nodes: &[StoredNode]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|n| match &n.node {
            Node::Text(t) => Some(t.data.clone()),
            _ => None,
        })
        .collect()
}

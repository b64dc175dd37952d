//! Tree Builder
//!
//! [`ContentHandler`] turning parse events into typed nodes. The same
//! builder runs both ingestion passes:
//!
//! - **Validate**: nodes are built and thrown away; per-level child counts
//!   and the maximum depth are recorded on the document.
//! - **Store**: every node gets its position from the document's
//!   [`TreeLevelIndex`](super::TreeLevelIndex) and is handed to the backend
//!   under its structural path.
//!
//! Character data is coalesced until the next structural boundary. Nodes
//! come from a private [`NodePool`] and go back once persisted.

use super::path::PathTracker;
use super::pool::NodePool;
use crate::config::IndexerConfig;
use crate::core::attributes::{is_identifier, is_stored, stored_count};
use crate::core::entities::EntityResolver;
use crate::core::text::TextBuffer;
use crate::dom::document::{Document, DocumentType};
use crate::dom::namespace::NamespaceScopes;
use crate::dom::node::{ElementNode, Gid, Node, NodeRef};
use crate::error::{IngestError, Result};
use crate::ingest::progress::{ProgressIndicator, ProgressObserver};
use crate::sax::{ContentHandler, StartElement};
use crate::storage::Backend;
use std::sync::Arc;
use tracing::{trace, warn};

/// Ingestion pass run by a builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Validate,
    Store,
}

/// Which boundary flushes pending text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flush {
    /// A child element opens: mixed content is kept verbatim
    Open,
    /// Element close, comment or PI: content is normalized
    Boundary,
}

/// Observations of a finished pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Deepest element level plus one
    pub max_depth: usize,
    /// Last source line seen
    pub lines: u32,
    /// Nodes handed to the backend
    pub nodes_stored: u64,
    /// Qualified name of the root element
    pub root_name: Option<String>,
    /// Nodes served from the pool instead of allocated
    pub nodes_reused: usize,
}

/// Event handler building one document
pub struct TreeBuilder<'a> {
    pass: Pass,
    doc: &'a mut Document,
    config: &'a IndexerConfig,
    backend: Option<&'a dyn Backend>,
    resolver: Option<&'a dyn EntityResolver>,
    progress: Option<(ProgressIndicator, &'a mut dyn ProgressObserver)>,
    stack: PathTracker,
    text: TextBuffer,
    namespaces: NamespaceScopes,
    pool: NodePool,
    /// Root element, kept after it closes
    root: Option<ElementNode>,
    in_dtd: bool,
    line: u32,
    /// Deepest element level seen, the root element is level 1
    deepest: usize,
    stored: u64,
}

impl<'a> TreeBuilder<'a> {
    fn new(
        pass: Pass,
        doc: &'a mut Document,
        config: &'a IndexerConfig,
        backend: Option<&'a dyn Backend>,
    ) -> Self {
        Self {
            pass,
            doc,
            config,
            backend,
            resolver: None,
            progress: None,
            stack: PathTracker::new(),
            text: TextBuffer::new(),
            namespaces: NamespaceScopes::new(),
            pool: NodePool::new(),
            root: None,
            in_dtd: false,
            line: 0,
            deepest: 0,
            stored: 0,
        }
    }

    /// Builder for the validate pass; nothing reaches a backend
    pub fn validating(doc: &'a mut Document, config: &'a IndexerConfig) -> Self {
        Self::new(Pass::Validate, doc, config, None)
    }

    /// Builder for the store pass.
    ///
    /// `doc` must carry the positions computed after the validate pass.
    pub fn storing(
        doc: &'a mut Document,
        config: &'a IndexerConfig,
        backend: &'a dyn Backend,
    ) -> Self {
        Self::new(Pass::Store, doc, config, Some(backend))
    }

    /// Resolve external entities through `resolver`
    pub fn with_resolver(mut self, resolver: &'a dyn EntityResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Report store progress to `observer`
    pub fn with_progress(
        mut self,
        indicator: ProgressIndicator,
        observer: &'a mut dyn ProgressObserver,
    ) -> Self {
        self.progress = Some((indicator, observer));
        self
    }

    /// Pass run by this builder
    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Last source line seen
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Deepest element level plus one
    pub fn max_depth(&self) -> usize {
        self.deepest + 1
    }

    /// Structural path of the innermost open element
    pub fn current_path(&self) -> &str {
        self.stack.path()
    }

    /// Consume the builder
    pub fn finish(self) -> BuildSummary {
        BuildSummary {
            max_depth: self.deepest + 1,
            lines: self.line,
            nodes_stored: self.stored,
            root_name: self.root.as_ref().map(|r| r.name.qualified()),
            nodes_reused: self.pool.reused(),
        }
    }

    fn malformed(&self, message: impl Into<String>) -> IngestError {
        IngestError::malformed(self.line, message)
    }

    /// Reserve a child position under the current parent
    fn claim_slot(&mut self) -> (usize, Gid, u64) {
        match self.stack.current_mut() {
            Some(parent) => {
                let slot = parent.claim_child_slot();
                (parent.level, parent.gid, slot)
            }
            None => (0, 0, self.doc.claim_child_slot()),
        }
    }

    /// Position of child `slot` of `parent`; zero during the validate pass
    fn position(&mut self, parent_level: usize, parent: Gid, slot: u64) -> Result<Gid> {
        if self.pass == Pass::Validate {
            return Ok(0);
        }
        if self.doc.levels.ensure_slot(parent_level, slot)? {
            warn!(
                document = %self.doc.path,
                level = parent_level,
                order = self.doc.levels.order(parent_level),
                "store pass enlarged level fan-out"
            );
        }
        self.doc
            .levels
            .child_gid(parent_level, parent, slot)
            .ok_or(IngestError::DepthExceeded {
                depth: self.doc.max_depth,
            })
    }

    /// Place a text, comment or PI node under the current parent
    fn append_leaf(&mut self, mut node: Node) -> Result<()> {
        let (parent_level, parent, slot) = self.claim_slot();
        let gid = match self.position(parent_level, parent, slot) {
            Ok(gid) => gid,
            Err(err) => {
                self.pool.release(node);
                return Err(err);
            }
        };
        node.place(self.doc.id, gid);

        let result = match self.backend {
            Some(backend) => backend.store_node(node.as_node_ref(), self.stack.path()),
            None => Ok(()),
        };
        self.pool.release(node);
        result?;
        if self.backend.is_some() {
            self.stored += 1;
        }
        Ok(())
    }

    fn flush_text(&mut self, flush: Flush) -> Result<()> {
        if self.text.is_empty() {
            return Ok(());
        }
        let normalized = self.text.normalized(self.config.suppress_whitespace);
        if normalized.is_empty() {
            self.text.reset();
            return Ok(());
        }
        let data = match flush {
            Flush::Open => self.text.as_str(),
            Flush::Boundary => normalized,
        };
        let mut node = self.pool.text();
        node.data.push_str(data);
        self.text.reset();
        self.append_leaf(Node::Text(node))
    }

    fn store_attributes(&mut self, start: &StartElement, level: usize, parent: Gid) -> Result<()> {
        let mut slot = 0;
        for attr in start.attributes.iter().filter(|a| is_stored(a)) {
            let gid = self.position(level, parent, slot)?;
            slot += 1;

            let mut node = self.pool.attribute();
            node.name.assign(&attr.namespace, &attr.qname);
            node.value.push_str(&attr.value);
            node.doc = self.doc.id;
            node.gid = gid;
            node.is_id = is_identifier(attr);

            let result = match self.backend {
                Some(backend) => {
                    let path = self.stack.attribute_path(&attr.qname);
                    backend.store_node(NodeRef::Attribute(&node), &path)
                }
                None => Ok(()),
            };
            self.pool.release(Node::Attribute(node));
            result?;
            if self.backend.is_some() {
                self.stored += 1;
            }
        }
        Ok(())
    }

    fn report_progress(&mut self) {
        if let Some((indicator, observer)) = self.progress.as_mut() {
            if let Some(progress) = indicator.set_value(self.line) {
                observer.update(progress);
            }
        }
    }
}

impl ContentHandler for TreeBuilder<'_> {
    fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    fn start_document(&mut self) -> Result<()> {
        self.doc.child_count = 0;
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        if let Some(open) = self.stack.current() {
            let message = format!("element <{}> is not closed", open.name.qualified());
            return Err(self.malformed(message));
        }
        let Some(root) = self.root.as_ref() else {
            return Err(self.malformed("document has no root element"));
        };

        match self.pass {
            Pass::Validate => self.doc.levels.observe(0, self.doc.child_count),
            Pass::Store => {
                if self.doc.doctype.is_none() {
                    self.doc.doctype = Some(DocumentType {
                        name: root.name.qualified(),
                        public_id: None,
                        system_id: Some(self.doc.path.clone()),
                    });
                }
                let observed = self.deepest + 1;
                if observed != self.doc.max_depth {
                    warn!(
                        document = %self.doc.path,
                        validated = self.doc.max_depth,
                        stored = observed,
                        "store pass depth differs from validate pass"
                    );
                }
                if let Some((indicator, observer)) = self.progress.as_mut() {
                    observer.update(indicator.finish());
                }
            }
        }
        Ok(())
    }

    fn start_element(&mut self, start: &StartElement) -> Result<()> {
        if !self.stack.is_empty() {
            self.flush_text(Flush::Open)?;
        } else if self.root.is_some() {
            return Err(self.malformed(format!(
                "element <{}> after the root element",
                start.qname
            )));
        }

        let level = self.stack.depth() + 1;
        self.deepest = self.deepest.max(level);

        let (parent_level, parent, slot) = self.claim_slot();
        let gid = self.position(parent_level, parent, slot)?;

        let mut element = self.pool.element();
        element.name.assign(&start.namespace, &start.qname);
        element.doc = self.doc.id;
        element.gid = gid;
        element.level = level;
        element.attribute_count = stored_count(&start.attributes);
        element.child_count = element.attribute_count;
        element.namespace_mappings = self.namespaces.take_pending();
        self.stack.push(element);

        if let (Some(backend), Some(element)) = (self.backend, self.stack.current()) {
            backend.store_node(NodeRef::Element(element), self.stack.path())?;
            self.stored += 1;
            trace!(path = %self.stack.path(), gid, "stored element");
        }
        self.store_attributes(start, level, gid)?;

        if self.pass == Pass::Store {
            self.report_progress();
        }
        Ok(())
    }

    fn end_element(&mut self, qname: &str) -> Result<()> {
        match self.stack.current() {
            None => return Err(self.malformed(format!("unexpected end tag </{qname}>"))),
            Some(open) if !open.name.is_named(qname) => {
                let message = format!(
                    "end tag </{}> does not match <{}>",
                    qname,
                    open.name.qualified()
                );
                return Err(self.malformed(message));
            }
            Some(_) => {}
        }
        self.flush_text(Flush::Boundary)?;

        let Some(element) = self.stack.pop() else {
            return Ok(());
        };
        match (self.pass, self.backend) {
            (Pass::Validate, _) => self
                .doc
                .levels
                .observe(element.level, element.child_count),
            (Pass::Store, Some(backend)) if element.has_content() => {
                backend.update_node(NodeRef::Element(&element))?;
            }
            _ => {}
        }

        if element.level == 1 {
            self.root = Some(element);
        } else {
            self.pool.release(Node::Element(element));
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if !self.in_dtd && !self.stack.is_empty() {
            self.text.append(text);
        }
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        if self.in_dtd {
            return Ok(());
        }
        self.flush_text(Flush::Boundary)?;
        let mut node = self.pool.comment();
        node.data.push_str(text);
        self.append_leaf(Node::Comment(node))
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        if self.in_dtd {
            return Ok(());
        }
        self.flush_text(Flush::Boundary)?;
        let mut node = self.pool.processing_instruction();
        node.target.push_str(target);
        node.data.push_str(data);
        self.append_leaf(Node::ProcessingInstruction(node))
    }

    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<()> {
        self.in_dtd = true;
        self.doc.doctype = Some(DocumentType {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        });
        Ok(())
    }

    fn end_dtd(&mut self) -> Result<()> {
        self.in_dtd = false;
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.namespaces.bind(prefix, uri);
        Ok(())
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.namespaces.unbind(prefix);
        Ok(())
    }

    fn resolve_entity(
        &mut self,
        public_id: Option<&str>,
        system_id: &str,
    ) -> Result<Option<Arc<[u8]>>> {
        let Some(resolver) = self.resolver else {
            return Ok(None);
        };
        resolver
            .resolve(public_id, system_id)
            .map_err(|err| self.malformed(err.to_string()))
    }
}

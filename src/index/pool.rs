//! Node Pool
//!
//! Free-list of retired nodes keyed by kind. Owned by a single tree builder;
//! nodes go back once they have been persisted (or, during the validate pass,
//! once their subtree is closed) and their buffers are reused for the next
//! node of the same kind.

use crate::dom::node::{AttrNode, CommentNode, ElementNode, Node, NodeKind, PiNode, TextNode};
use std::collections::HashMap;

/// Retired nodes kept per kind by [`NodePool::new`]
pub const DEFAULT_POOL_LIMIT: usize = 64;

/// Per-kind free-list
#[derive(Debug)]
pub struct NodePool {
    free: HashMap<NodeKind, Vec<Node>>,
    limit: usize,
    reused: usize,
    allocated: usize,
}

impl NodePool {
    /// Create a pool keeping at most [`DEFAULT_POOL_LIMIT`] nodes per kind
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_POOL_LIMIT)
    }

    /// Create a pool keeping at most `limit` nodes per kind
    pub fn with_limit(limit: usize) -> Self {
        Self {
            free: HashMap::with_capacity(5),
            limit,
            reused: 0,
            allocated: 0,
        }
    }

    fn take(&mut self, kind: NodeKind) -> Option<Node> {
        let node = self.free.get_mut(&kind)?.pop()?;
        self.reused += 1;
        Some(node)
    }

    /// Empty element node
    pub fn element(&mut self) -> ElementNode {
        if let Some(Node::Element(node)) = self.take(NodeKind::Element) {
            return node;
        }
        self.allocated += 1;
        ElementNode::default()
    }

    /// Empty attribute node
    pub fn attribute(&mut self) -> AttrNode {
        if let Some(Node::Attribute(node)) = self.take(NodeKind::Attribute) {
            return node;
        }
        self.allocated += 1;
        AttrNode::default()
    }

    /// Empty text node
    pub fn text(&mut self) -> TextNode {
        if let Some(Node::Text(node)) = self.take(NodeKind::Text) {
            return node;
        }
        self.allocated += 1;
        TextNode::default()
    }

    /// Empty comment node
    pub fn comment(&mut self) -> CommentNode {
        if let Some(Node::Comment(node)) = self.take(NodeKind::Comment) {
            return node;
        }
        self.allocated += 1;
        CommentNode::default()
    }

    /// Empty processing instruction node
    pub fn processing_instruction(&mut self) -> PiNode {
        if let Some(Node::ProcessingInstruction(node)) = self.take(NodeKind::ProcessingInstruction)
        {
            return node;
        }
        self.allocated += 1;
        PiNode::default()
    }

    /// Return a node for reuse
    pub fn release(&mut self, mut node: Node) {
        let list = self.free.entry(node.kind()).or_default();
        if list.len() < self.limit {
            node.clear();
            list.push(node);
        }
    }

    /// Nodes handed out from the free-list
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Nodes freshly allocated
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Retired nodes currently held
    pub fn idle(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

//! Stored Node Types
//!
//! Nodes are built by the tree builder and handed to the backend. They carry
//! their document id and global position (`gid`) instead of pointers, so a
//! node never borrows its parent or its document.

use super::namespace::NamespaceMap;
use crate::core::attributes::split_name;

/// Numeric document identifier, unique within a collection
pub type DocId = u32;

/// Global node position within a document (see [`crate::index::TreeLevelIndex`])
pub type Gid = u64;

/// Qualified name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QName {
    /// Local part
    pub local_name: String,
    /// Namespace URI, empty when unqualified
    pub namespace: String,
    /// Prefix as written
    pub prefix: Option<String>,
}

impl QName {
    /// Create an unqualified name
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            namespace: String::new(),
            prefix: None,
        }
    }

    /// Create a name from a namespace URI and a `prefix:local` string
    pub fn namespaced(namespace: &str, qname: &str) -> Self {
        let mut name = Self::default();
        name.assign(namespace, qname);
        name
    }

    /// Overwrite this name in place, reusing its buffers
    pub fn assign(&mut self, namespace: &str, qname: &str) {
        let (prefix, local) = split_name(qname);
        self.local_name.clear();
        self.local_name.push_str(local);
        self.namespace.clear();
        self.namespace.push_str(namespace);
        match (prefix, self.prefix.as_mut()) {
            (Some(p), Some(buf)) => {
                buf.clear();
                buf.push_str(p);
            }
            (Some(p), None) => self.prefix = Some(p.to_string()),
            (None, _) => self.prefix = None,
        }
    }

    /// `prefix:local`, or just the local name
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Check if this name is written as `qname`
    pub fn is_named(&self, qname: &str) -> bool {
        let (prefix, local) = split_name(qname);
        prefix == self.prefix.as_deref() && local == self.local_name
    }

    fn clear(&mut self) {
        self.local_name.clear();
        self.namespace.clear();
        self.prefix = None;
    }
}

/// Type of stored node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Element node
    Element,
    /// Attribute
    Attribute,
    /// Text content
    Text,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// Element under construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementNode {
    pub name: QName,
    pub doc: DocId,
    pub gid: Gid,
    /// Nesting level, the root element is level 1
    pub level: usize,
    /// Children appended so far, attributes included
    pub child_count: u32,
    /// Stored attributes
    pub attribute_count: u32,
    /// Bindings introduced by this element, if any
    pub namespace_mappings: Option<NamespaceMap>,
}

impl ElementNode {
    /// Reserve the next child position, returning its slot within this element
    #[inline]
    pub fn claim_child_slot(&mut self) -> u64 {
        let slot = u64::from(self.child_count);
        self.child_count += 1;
        slot
    }

    /// Check if children other than attributes were appended
    pub fn has_content(&self) -> bool {
        self.child_count > self.attribute_count
    }

    /// Reset to an empty element, keeping allocations
    pub fn clear(&mut self) {
        self.name.clear();
        self.doc = 0;
        self.gid = 0;
        self.level = 0;
        self.child_count = 0;
        self.attribute_count = 0;
        self.namespace_mappings = None;
    }
}

/// Attribute node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrNode {
    pub name: QName,
    pub value: String,
    pub doc: DocId,
    pub gid: Gid,
    /// Declared with the identifier type
    pub is_id: bool,
}

impl AttrNode {
    fn clear(&mut self) {
        self.name.clear();
        self.value.clear();
        self.doc = 0;
        self.gid = 0;
        self.is_id = false;
    }
}

/// Text node holding coalesced character data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextNode {
    pub data: String,
    pub doc: DocId,
    pub gid: Gid,
}

/// Comment node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentNode {
    pub data: String,
    pub doc: DocId,
    pub gid: Gid,
}

/// Processing instruction node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PiNode {
    pub target: String,
    pub data: String,
    pub doc: DocId,
    pub gid: Gid,
}

/// Owned node, as kept by the node pool and by backends
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(ElementNode),
    Attribute(AttrNode),
    Text(TextNode),
    Comment(CommentNode),
    ProcessingInstruction(PiNode),
}

impl Node {
    /// Node kind
    pub fn kind(&self) -> NodeKind {
        self.as_node_ref().kind()
    }

    /// Global position
    pub fn gid(&self) -> Gid {
        self.as_node_ref().gid()
    }

    /// Borrow as a [`NodeRef`]
    pub fn as_node_ref(&self) -> NodeRef<'_> {
        match self {
            Node::Element(n) => NodeRef::Element(n),
            Node::Attribute(n) => NodeRef::Attribute(n),
            Node::Text(n) => NodeRef::Text(n),
            Node::Comment(n) => NodeRef::Comment(n),
            Node::ProcessingInstruction(n) => NodeRef::ProcessingInstruction(n),
        }
    }

    /// Assign the owning document and position
    pub fn place(&mut self, doc: DocId, gid: Gid) {
        let (d, g) = match self {
            Node::Element(n) => (&mut n.doc, &mut n.gid),
            Node::Attribute(n) => (&mut n.doc, &mut n.gid),
            Node::Text(n) => (&mut n.doc, &mut n.gid),
            Node::Comment(n) => (&mut n.doc, &mut n.gid),
            Node::ProcessingInstruction(n) => (&mut n.doc, &mut n.gid),
        };
        *d = doc;
        *g = gid;
    }

    /// Reset to an empty node of the same kind, keeping allocations
    pub fn clear(&mut self) {
        match self {
            Node::Element(n) => n.clear(),
            Node::Attribute(n) => n.clear(),
            Node::Text(TextNode { data, doc, gid })
            | Node::Comment(CommentNode { data, doc, gid }) => {
                data.clear();
                *doc = 0;
                *gid = 0;
            }
            Node::ProcessingInstruction(n) => {
                n.target.clear();
                n.data.clear();
                n.doc = 0;
                n.gid = 0;
            }
        }
    }

    /// Element payload, if this is an element
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(n) => Some(n),
            _ => None,
        }
    }
}

/// Borrowed node handed to the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'n> {
    Element(&'n ElementNode),
    Attribute(&'n AttrNode),
    Text(&'n TextNode),
    Comment(&'n CommentNode),
    ProcessingInstruction(&'n PiNode),
}

impl<'n> NodeRef<'n> {
    /// Node kind
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Element(_) => NodeKind::Element,
            NodeRef::Attribute(_) => NodeKind::Attribute,
            NodeRef::Text(_) => NodeKind::Text,
            NodeRef::Comment(_) => NodeKind::Comment,
            NodeRef::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
        }
    }

    /// Global position
    pub fn gid(&self) -> Gid {
        match self {
            NodeRef::Element(n) => n.gid,
            NodeRef::Attribute(n) => n.gid,
            NodeRef::Text(n) => n.gid,
            NodeRef::Comment(n) => n.gid,
            NodeRef::ProcessingInstruction(n) => n.gid,
        }
    }

    /// Owning document
    pub fn doc(&self) -> DocId {
        match self {
            NodeRef::Element(n) => n.doc,
            NodeRef::Attribute(n) => n.doc,
            NodeRef::Text(n) => n.doc,
            NodeRef::Comment(n) => n.doc,
            NodeRef::ProcessingInstruction(n) => n.doc,
        }
    }

    /// Copy into an owned node
    pub fn to_node(&self) -> Node {
        match *self {
            NodeRef::Element(n) => Node::Element(n.clone()),
            NodeRef::Attribute(n) => Node::Attribute(n.clone()),
            NodeRef::Text(n) => Node::Text(n.clone()),
            NodeRef::Comment(n) => Node::Comment(n.clone()),
            NodeRef::ProcessingInstruction(n) => Node::ProcessingInstruction(n.clone()),
        }
    }
}

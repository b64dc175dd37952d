//! DOM Module - Stored Document Model
//!
//! Types handed from the tree builder to the storage backend:
//! - `Document`: catalog record with addressing parameters
//! - `Node` / `NodeRef`: typed nodes addressed by document id and gid
//! - namespace scoping for prefix bindings reported by the event source

pub mod document;
pub mod namespace;
pub mod node;

pub use document::{Document, DocumentType};
pub use namespace::{NamespaceMap, NamespaceScopes};
pub use node::{
    AttrNode, CommentNode, DocId, ElementNode, Gid, Node, NodeKind, NodeRef, PiNode, QName,
    TextNode,
};

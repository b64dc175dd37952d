//! SAX Event Types
//!
//! Owned form of the callbacks an event source pushes into a
//! [`ContentHandler`](super::ContentHandler). Used to record a single-pass
//! source so it can be replayed for the store pass.

use super::ContentHandler;
use crate::core::attributes::{split_name, ID_TYPE};
use crate::error::Result;

/// Attribute type reported when the source has no declaration for it
pub const CDATA_TYPE: &str = "CDATA";

/// An attribute as reported by the event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, empty when unqualified
    pub namespace: String,
    /// Local part of the name
    pub local_name: String,
    /// Qualified name as written
    pub qname: String,
    /// Normalized value
    pub value: String,
    /// Declared type (`CDATA`, `ID`, `IDREF`, ...)
    pub attr_type: String,
}

impl Attribute {
    /// Create an unqualified `CDATA` attribute
    pub fn new(qname: impl Into<String>, value: impl Into<String>) -> Self {
        Self::namespaced("", qname, value)
    }

    /// Create a `CDATA` attribute in `namespace`
    pub fn namespaced(
        namespace: impl Into<String>,
        qname: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let qname = qname.into();
        let local_name = split_name(&qname).1.to_string();
        Self {
            namespace: namespace.into(),
            local_name,
            qname,
            value: value.into(),
            attr_type: CDATA_TYPE.to_string(),
        }
    }

    /// Create an attribute declared with the identifier type
    pub fn id(qname: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(qname, value).with_type(ID_TYPE)
    }

    /// Set the declared type
    pub fn with_type(mut self, attr_type: impl Into<String>) -> Self {
        self.attr_type = attr_type.into();
        self
    }

    /// Prefix of the qualified name, if any
    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.qname).0
    }
}

/// Start-element callback payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    /// Namespace URI, empty when unqualified
    pub namespace: String,
    /// Local part of the name
    pub local_name: String,
    /// Qualified name as written
    pub qname: String,
    /// Attributes in source order, namespace declarations included
    pub attributes: Vec<Attribute>,
}

impl StartElement {
    /// Create an unqualified element without attributes
    pub fn new(qname: impl Into<String>) -> Self {
        Self::namespaced("", qname)
    }

    /// Create an element in `namespace`
    pub fn namespaced(namespace: impl Into<String>, qname: impl Into<String>) -> Self {
        let qname = qname.into();
        let local_name = split_name(&qname).1.to_string();
        Self {
            namespace: namespace.into(),
            local_name,
            qname,
            attributes: Vec::new(),
        }
    }

    /// Append an attribute
    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Prefix of the qualified name, if any
    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.qname).0
    }
}

/// A SAX parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaxEvent {
    /// Start of the document
    StartDocument,
    /// End of the document
    EndDocument,
    /// Start of an element
    StartElement(StartElement),
    /// End of an element
    EndElement {
        /// Qualified name as written in the end tag
        qname: String,
    },
    /// Character data, possibly one of several chunks of the same text
    Characters(String),
    /// Comment content (excluding markers)
    Comment(String),
    /// Processing instruction
    ProcessingInstruction {
        /// Target name
        target: String,
        /// Data, empty when absent
        data: String,
    },
    /// Start of the document type declaration
    StartDtd {
        /// Declared root element name
        name: String,
        /// Public identifier
        public_id: Option<String>,
        /// System identifier
        system_id: Option<String>,
    },
    /// End of the document type declaration
    EndDtd,
    /// Prefix comes into scope for the next element
    StartPrefixMapping {
        /// Bound prefix, empty for the default namespace
        prefix: String,
        /// Namespace URI
        uri: String,
    },
    /// Prefix goes out of scope
    EndPrefixMapping {
        /// Unbound prefix
        prefix: String,
    },
    /// External entity requested by the source
    ResolveEntity {
        /// Public identifier
        public_id: Option<String>,
        /// System identifier
        system_id: String,
    },
    /// Unrecoverable error reported by the source
    FatalError {
        /// Description from the source
        message: String,
    },
}

impl SaxEvent {
    /// Check if this is a start element event
    #[inline]
    pub fn is_start_element(&self) -> bool {
        matches!(self, SaxEvent::StartElement(_))
    }

    /// Check if this is an end element event
    #[inline]
    pub fn is_end_element(&self) -> bool {
        matches!(self, SaxEvent::EndElement { .. })
    }

    /// Check if this is a text event
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, SaxEvent::Characters(_))
    }

    /// Get the qualified name if this is a start or end element
    pub fn element_name(&self) -> Option<&str> {
        match self {
            SaxEvent::StartElement(start) => Some(&start.qname),
            SaxEvent::EndElement { qname } => Some(qname),
            _ => None,
        }
    }

    /// Push this event into `handler`.
    ///
    /// The body of a replayed entity request is discarded: the recorded
    /// stream already contains the expanded content.
    pub fn dispatch(&self, handler: &mut dyn ContentHandler, line: u32) -> Result<()> {
        match self {
            SaxEvent::StartDocument => handler.start_document(),
            SaxEvent::EndDocument => handler.end_document(),
            SaxEvent::StartElement(start) => handler.start_element(start),
            SaxEvent::EndElement { qname } => handler.end_element(qname),
            SaxEvent::Characters(text) => handler.characters(text),
            SaxEvent::Comment(text) => handler.comment(text),
            SaxEvent::ProcessingInstruction { target, data } => {
                handler.processing_instruction(target, data)
            }
            SaxEvent::StartDtd {
                name,
                public_id,
                system_id,
            } => handler.start_dtd(name, public_id.as_deref(), system_id.as_deref()),
            SaxEvent::EndDtd => handler.end_dtd(),
            SaxEvent::StartPrefixMapping { prefix, uri } => {
                handler.start_prefix_mapping(prefix, uri)
            }
            SaxEvent::EndPrefixMapping { prefix } => handler.end_prefix_mapping(prefix),
            SaxEvent::ResolveEntity {
                public_id,
                system_id,
            } => handler
                .resolve_entity(public_id.as_deref(), system_id)
                .map(drop),
            SaxEvent::FatalError { message } => handler.fatal_error(line, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names() {
        let attr = Attribute::namespaced("urn:x", "x:key", "v");
        assert_eq!(attr.local_name, "key");
        assert_eq!(attr.prefix(), Some("x"));
        assert_eq!(attr.attr_type, CDATA_TYPE);
    }

    #[test]
    fn test_start_element_builder() {
        let start = StartElement::namespaced("urn:b", "b:book")
            .with_attribute(Attribute::id("id", "b1"))
            .with_attribute(Attribute::new("lang", "en"));
        assert_eq!(start.local_name, "book");
        assert_eq!(start.prefix(), Some("b"));
        assert_eq!(start.attributes.len(), 2);
        assert_eq!(start.attributes[0].attr_type, ID_TYPE);
    }

    #[test]
    fn test_event_predicates() {
        let start = SaxEvent::StartElement(StartElement::new("a"));
        let end = SaxEvent::EndElement {
            qname: "a".to_string(),
        };
        assert!(start.is_start_element());
        assert!(end.is_end_element());
        assert_eq!(start.element_name(), Some("a"));
        assert!(SaxEvent::Characters("x".to_string()).is_text());
        assert_eq!(SaxEvent::EndDocument.element_name(), None);
    }
}

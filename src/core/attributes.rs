//! Attribute Filtering
//!
//! Decides which attributes of a start-element event become stored
//! attribute nodes.

use crate::dom::namespace::ns;
use crate::sax::Attribute;
use memchr::memchr;

/// Prefix marking a namespace declaration attribute
pub const XMLNS_MARKER: &str = "xmlns";

/// Attribute type reported for identifier attributes
pub const ID_TYPE: &str = "ID";

/// Split a qualified name into prefix and local name at the colon
pub fn split_name(qname: &str) -> (Option<&str>, &str) {
    if let Some(colon_pos) = memchr(b':', qname.as_bytes()) {
        (Some(&qname[..colon_pos]), &qname[colon_pos + 1..])
    } else {
        (None, qname)
    }
}

/// Check if an attribute is a namespace declaration
#[inline]
pub fn is_namespace_declaration(qname: &str) -> bool {
    qname.starts_with(XMLNS_MARKER)
}

/// Check if an attribute is persisted.
///
/// Namespace declarations and attributes in the engine's reserved
/// namespace are dropped.
#[inline]
pub fn is_stored(attr: &Attribute) -> bool {
    !is_namespace_declaration(&attr.qname) && attr.namespace != ns::RESERVED
}

/// Number of attributes that will be persisted
pub fn stored_count(attrs: &[Attribute]) -> u32 {
    attrs.iter().filter(|a| is_stored(a)).count() as u32
}

/// Check if an attribute was declared with the identifier type
#[inline]
pub fn is_identifier(attr: &Attribute) -> bool {
    attr.attr_type == ID_TYPE
}

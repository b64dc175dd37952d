//! Text Coalescing
//!
//! Character events arrive in arbitrary chunks. They are accumulated in a
//! [`TextBuffer`] and only turned into a text node on a structural boundary
//! (element open/close, comment, processing instruction).

use serde::{Deserialize, Serialize};

/// Whitespace suppression applied when pending text is flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceMode {
    /// Keep text exactly as received
    None,
    /// Drop leading whitespace
    Leading,
    /// Drop trailing whitespace
    Trailing,
    /// Drop leading and trailing whitespace
    #[default]
    Both,
}

#[inline]
fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Buffer for pending character data
#[derive(Debug, Default)]
pub struct TextBuffer {
    data: String,
}

impl TextBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            data: String::with_capacity(256),
        }
    }

    /// Append a chunk of character data
    #[inline]
    pub fn append(&mut self, chunk: &str) {
        self.data.push_str(chunk);
    }

    /// Check if nothing is pending
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw pending content
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Pending content with `mode` applied
    pub fn normalized(&self, mode: WhitespaceMode) -> &str {
        match mode {
            WhitespaceMode::None => &self.data,
            WhitespaceMode::Leading => self.data.trim_start_matches(is_xml_whitespace),
            WhitespaceMode::Trailing => self.data.trim_end_matches(is_xml_whitespace),
            WhitespaceMode::Both => self.data.trim_matches(is_xml_whitespace),
        }
    }

    /// Drop pending content, keeping the allocation
    #[inline]
    pub fn reset(&mut self) {
        self.data.clear();
    }
}

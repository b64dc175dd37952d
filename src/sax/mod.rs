//! SAX (Simple API for XML) Module
//!
//! Push-based event interface between an XML event source and the tree
//! builder.
//!
//! ## Architecture
//!
//! ```text
//! EventSource --stream()--> ContentHandler (TreeBuilder, validate pass)
//! EventSource --stream()--> ContentHandler (TreeBuilder, store pass)
//! ```
//!
//! A source is streamed once per ingestion phase. Sources that can only be
//! read once are wrapped in an [`EventLog`], which records the events on the
//! first pass and replays them afterwards.
//!
//! ## Event Types
//!
//! - `StartElement` / `EndElement` - element boundaries with attributes
//! - `Characters` - character data, delivered in arbitrary chunks
//! - `Comment` / `ProcessingInstruction` - markup siblings of text
//! - `StartDtd` / `EndDtd` - document type declaration
//! - `StartPrefixMapping` / `EndPrefixMapping` - namespace scope
//! - `ResolveEntity` - external entity request
//! - `FatalError` - well-formedness error with a line number

pub mod collector;
pub mod events;

pub use collector::EventLog;
pub use events::{Attribute, SaxEvent, StartElement};

use crate::error::{IngestError, Result};
use std::sync::Arc;

/// Receiver of parse callbacks.
///
/// Every callback may fail; the source must stop streaming and propagate the
/// first error it receives.
pub trait ContentHandler {
    /// Source line of the events that follow
    fn set_line(&mut self, _line: u32) {}

    /// Called once before any other event
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once after the last event
    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when an element starts
    fn start_element(&mut self, element: &StartElement) -> Result<()>;

    /// Called when an element ends
    fn end_element(&mut self, qname: &str) -> Result<()>;

    /// Called for a chunk of character data
    fn characters(&mut self, text: &str) -> Result<()>;

    /// Called for comments
    fn comment(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// Called for processing instructions
    fn processing_instruction(&mut self, _target: &str, _data: &str) -> Result<()> {
        Ok(())
    }

    /// Called when a document type declaration starts
    fn start_dtd(
        &mut self,
        _name: &str,
        _public_id: Option<&str>,
        _system_id: Option<&str>,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when a document type declaration ends
    fn end_dtd(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called before the element introducing `prefix` starts
    fn start_prefix_mapping(&mut self, _prefix: &str, _uri: &str) -> Result<()> {
        Ok(())
    }

    /// Called after the element that introduced `prefix` ends
    fn end_prefix_mapping(&mut self, _prefix: &str) -> Result<()> {
        Ok(())
    }

    /// Resolve an external entity. `None` lets the source apply its default.
    fn resolve_entity(
        &mut self,
        _public_id: Option<&str>,
        _system_id: &str,
    ) -> Result<Option<Arc<[u8]>>> {
        Ok(None)
    }

    /// Called for unrecoverable well-formedness errors
    fn fatal_error(&mut self, line: u32, message: &str) -> Result<()> {
        Err(IngestError::malformed(line, message))
    }
}

/// Producer of parse events for one document.
///
/// Each call to [`EventSource::stream`] must deliver the complete event
/// sequence of the document from the beginning.
pub trait EventSource {
    /// System identifier (URL) of the document, if known
    fn system_id(&self) -> Option<&str> {
        None
    }

    /// Push every event of the document into `handler`
    fn stream(&mut self, handler: &mut dyn ContentHandler) -> Result<()>;
}

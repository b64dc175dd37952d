//! Event Log
//!
//! Records the events of any source so they can be streamed again. Also
//! works as a fluent builder for hand-written event sequences.

use super::events::{Attribute, SaxEvent, StartElement};
use super::{ContentHandler, EventSource};
use crate::error::{IngestError, Result};
use std::sync::Arc;

/// Recorded, replayable event sequence
///
/// Document start and end are implicit: they are not stored and every
/// [`EventSource::stream`] call emits them around the recorded events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// System identifier reported to the ingester
    system_id: Option<String>,
    /// Events tagged with the source line they were reported at
    events: Vec<(u32, SaxEvent)>,
    /// Line of the next recorded event
    line: u32,
    /// Open element names, used by [`EventLog::end`]
    open: Vec<String>,
}

impl EventLog {
    /// Create an empty log starting at line 1
    pub fn new() -> Self {
        Self {
            system_id: None,
            events: Vec::with_capacity(64),
            line: 1,
            open: Vec::new(),
        }
    }

    /// Record every event of `source`
    pub fn record(source: &mut dyn EventSource) -> Result<Self> {
        let mut log = Self::new();
        log.system_id = source.system_id().map(str::to_string);
        source.stream(&mut log)?;
        Ok(log)
    }

    /// Set the system identifier
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    /// Recorded events in order
    pub fn events(&self) -> impl Iterator<Item = &SaxEvent> {
        self.events.iter().map(|(_, event)| event)
    }

    /// Get number of recorded events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Line of the last recorded event
    pub fn last_line(&self) -> u32 {
        self.events.last().map_or(0, |(line, _)| *line)
    }

    fn push(&mut self, event: SaxEvent) {
        self.events.push((self.line, event));
    }

    /// Set the line of the events that follow
    pub fn line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Open an unqualified element
    pub fn start(self, qname: &str) -> Self {
        self.start_with(StartElement::new(qname))
    }

    /// Open an element
    pub fn start_with(mut self, element: StartElement) -> Self {
        self.open.push(element.qname.clone());
        self.push(SaxEvent::StartElement(element));
        self
    }

    /// Add an attribute to the element opened last
    pub fn attr(mut self, attr: Attribute) -> Self {
        if let Some((_, SaxEvent::StartElement(start))) = self.events.last_mut() {
            start.attributes.push(attr);
        }
        self
    }

    /// Close the element opened last
    pub fn end(mut self) -> Self {
        let qname = self.open.pop().unwrap_or_default();
        self.push(SaxEvent::EndElement { qname });
        self
    }

    /// Emit an end tag with an explicit name
    pub fn end_named(mut self, qname: &str) -> Self {
        self.open.pop();
        self.push(SaxEvent::EndElement {
            qname: qname.to_string(),
        });
        self
    }

    /// Append a chunk of character data
    pub fn text(mut self, text: &str) -> Self {
        self.push(SaxEvent::Characters(text.to_string()));
        self
    }

    /// Append a comment
    pub fn comment(mut self, text: &str) -> Self {
        self.push(SaxEvent::Comment(text.to_string()));
        self
    }

    /// Append a processing instruction
    pub fn pi(mut self, target: &str, data: &str) -> Self {
        self.push(SaxEvent::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
        self
    }

    /// Append a complete document type declaration
    pub fn dtd(mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) -> Self {
        self.push(SaxEvent::StartDtd {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        });
        self.push(SaxEvent::EndDtd);
        self
    }

    /// Bring `prefix` into scope for the next element
    pub fn prefix(mut self, prefix: &str, uri: &str) -> Self {
        self.push(SaxEvent::StartPrefixMapping {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        });
        self
    }

    /// Take `prefix` out of scope
    pub fn end_prefix(mut self, prefix: &str) -> Self {
        self.push(SaxEvent::EndPrefixMapping {
            prefix: prefix.to_string(),
        });
        self
    }

    /// Request an external entity
    pub fn entity(mut self, public_id: Option<&str>, system_id: &str) -> Self {
        self.push(SaxEvent::ResolveEntity {
            public_id: public_id.map(str::to_string),
            system_id: system_id.to_string(),
        });
        self
    }

    /// Report a fatal error at the current line
    pub fn fatal(mut self, message: &str) -> Self {
        self.push(SaxEvent::FatalError {
            message: message.to_string(),
        });
        self
    }
}

impl EventSource for EventLog {
    fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    fn stream(&mut self, handler: &mut dyn ContentHandler) -> Result<()> {
        handler.set_line(1);
        handler.start_document()?;
        for (line, event) in &self.events {
            handler.set_line(*line);
            event.dispatch(handler, *line)?;
        }
        handler.end_document()
    }
}

impl ContentHandler for EventLog {
    fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    fn start_element(&mut self, element: &StartElement) -> Result<()> {
        self.push(SaxEvent::StartElement(element.clone()));
        Ok(())
    }

    fn end_element(&mut self, qname: &str) -> Result<()> {
        self.push(SaxEvent::EndElement {
            qname: qname.to_string(),
        });
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.push(SaxEvent::Characters(text.to_string()));
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.push(SaxEvent::Comment(text.to_string()));
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.push(SaxEvent::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
        Ok(())
    }

    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<()> {
        self.push(SaxEvent::StartDtd {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        });
        Ok(())
    }

    fn end_dtd(&mut self) -> Result<()> {
        self.push(SaxEvent::EndDtd);
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.push(SaxEvent::StartPrefixMapping {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        });
        Ok(())
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.push(SaxEvent::EndPrefixMapping {
            prefix: prefix.to_string(),
        });
        Ok(())
    }

    fn resolve_entity(
        &mut self,
        public_id: Option<&str>,
        system_id: &str,
    ) -> Result<Option<Arc<[u8]>>> {
        self.push(SaxEvent::ResolveEntity {
            public_id: public_id.map(str::to_string),
            system_id: system_id.to_string(),
        });
        Ok(None)
    }

    fn fatal_error(&mut self, line: u32, message: &str) -> Result<()> {
        self.line = line;
        self.push(SaxEvent::FatalError {
            message: message.to_string(),
        });
        Err(IngestError::malformed(line, message))
    }
}

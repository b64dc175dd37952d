//! Core ingestion primitives
//!
//! Building blocks shared by both ingestion passes:
//! - Attributes: which attributes become stored nodes, qualified-name splitting
//! - Entities: external entity resolution through a cached catalog
//! - Text: character data coalescing and whitespace suppression

pub mod attributes;
pub mod entities;
pub mod text;

pub use entities::{CatalogResolver, EntityError, EntityResolver};
pub use text::{TextBuffer, WhitespaceMode};

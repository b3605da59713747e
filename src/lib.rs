pub mod core {
    pub mod xml;
    pub mod package;
    pub mod schema;
    pub mod paragraph;
    pub mod table;
    pub mod section;
    pub mod document;
    pub mod parser;
    pub mod writer;
}

pub mod format {
    pub mod masthead;
    pub mod title_block;
    pub mod classifier;
    pub mod layout;
}

pub mod utils {
    pub mod document_processor;
}

pub mod config;
pub mod error;
pub mod render;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::config::{JournalCode, JournalConfig, LayoutMode, StyleOptions};
pub use crate::core::document::{Block, Document};
pub use crate::error::{Error, Result};
pub use crate::render::{Renderer, SofficeRenderer};
pub use crate::utils::document_processor::{
    DocumentProcessor, FormatReport, FormattedDocument, Outcome,
};

use serde::{Deserialize, Serialize};

/// What a body block was recognised as while formatting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlockRole {
    Title,
    Author,
    Affiliation,
    Corresponding,
    SectionHeading,
    SubHeading,
    Body,
    Reference,
    Unclassified,
}

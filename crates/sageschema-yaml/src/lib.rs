//! Textual form of SageSchema documents
//!
//! This crate handles:
//! - Rendering a document to its YAML text layout (`serialize`)
//! - Reading text back into a document, strictly (`parse`) or with
//!   fallback to the default document (`deserialize`)
//! - Loading and saving documents on disk

pub mod emit;
pub mod parse;
pub mod error;

pub use emit::serialize;
pub use parse::{deserialize, parse};
pub use error::FormatError;

use sageschema_core::SchemaDocument;
use std::path::Path;

/// Read a document from disk, failing on unreadable or malformed files
pub fn load_file(path: &Path) -> Result<SchemaDocument, FormatError> {
    let contents = std::fs::read_to_string(path).map_err(|e| FormatError::IoError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    parse(&contents)
}

/// Write a document to disk in canonical form
pub fn save_file(path: &Path, document: &SchemaDocument) -> Result<(), FormatError> {
    std::fs::write(path, serialize(document)).map_err(|e| FormatError::IoError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

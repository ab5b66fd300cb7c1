//! Document format errors

/// Errors reading or writing schema documents
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("IO error on {path}: {message}")]
    IoError { path: String, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Document loading (1xxx)
    /// The document text could not be parsed; the default document was used
    DocumentParseError,

    // Reference integrity (2xxx)
    /// A package references a catalog name that does not exist
    DanglingCatalogReference,

    /// Two catalogs share the same display name
    DuplicateCatalogName,

    /// Two distinct catalog names normalize to the same document key
    CatalogKeyCollision,

    // Catalog structure (3xxx)
    /// Two fields of one catalog share a name
    DuplicateFieldName,

    /// A catalog declares no fields
    CatalogWithoutFields,

    /// A validation rule has a blank expression
    EmptyRuleExpression,

    // General warnings (9xxx)
    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentParseError => "DOCUMENT_PARSE_ERROR",
            Self::DanglingCatalogReference => "DANGLING_CATALOG_REFERENCE",
            Self::DuplicateCatalogName => "DUPLICATE_CATALOG_NAME",
            Self::CatalogKeyCollision => "CATALOG_KEY_COLLISION",
            Self::DuplicateFieldName => "DUPLICATE_FIELD_NAME",
            Self::CatalogWithoutFields => "CATALOG_WITHOUT_FIELDS",
            Self::EmptyRuleExpression => "EMPTY_RULE_EXPRESSION",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }

    /// Severity used when no override is configured
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::DocumentParseError
            | Self::DanglingCatalogReference
            | Self::DuplicateCatalogName
            | Self::DuplicateFieldName => Severity::Error,
            Self::CatalogKeyCollision
            | Self::CatalogWithoutFields
            | Self::EmptyRuleExpression
            | Self::Warning => Severity::Warn,
            Self::Info => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - the document is not usable as-is
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Position of a diagnostic inside a document
///
/// `path` uses document keys and list indices, e.g.
/// `catalogs.ventas.fields[2]` or `packages.default_package.catalogs[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Document file, when the document came from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Dotted path into the document
    pub path: String,
}

impl Location {
    /// Create a location from a document path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            file: None,
            path: path.into(),
        }
    }

    /// Attach the file the document was read from
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Location in the document (best-effort)
    pub location: Option<Location>,

    /// Expected value (for comparison diagnostics)
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    pub actual: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
        }
    }

    /// Create a diagnostic at the code's default severity
    pub fn of(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, code.default_severity(), message)
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

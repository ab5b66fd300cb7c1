//! SageSchema Core
//!
//! Declarative validation-schema model for data packages.
//! Never rename diagnostic codes - they are part of the public API.

pub mod model;
pub mod document;
pub mod diagnostic;
pub mod check;
pub mod report;
pub mod config;

pub use model::{
    catalog_key, Catalog, DefaultValue, Field, FileFormat, MetadataKey, Package, PackageMetadata,
    ValidationRule, DEFAULT_CATALOG_FILE_TYPE, DEFAULT_FIELD_TYPE, DEFAULT_PACKAGE_FILE_TYPE,
    DEFAULT_PACKAGE_NAME,
};
pub use document::{ModelError, SchemaDocument};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use check::DocumentChecker;
pub use report::{Report, ReportVersion};
pub use config::{Config, ConfigError, SeverityThreshold, AllowlistRules};

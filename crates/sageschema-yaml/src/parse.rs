//! Text → document
//!
//! Parsing is all-or-nothing: malformed text never yields a partially filled
//! document. Well-formed text is read leniently; anything missing or of the
//! wrong shape falls back to its default.

use serde_yaml::{Mapping, Value};

use sageschema_core::{
    Catalog, DefaultValue, Field, FileFormat, Package, PackageMetadata, SchemaDocument,
    ValidationRule, DEFAULT_CATALOG_FILE_TYPE, DEFAULT_FIELD_TYPE, DEFAULT_PACKAGE_FILE_TYPE,
};

use crate::error::FormatError;

/// Parse text into a document, reporting malformed text as an error
///
/// Empty text and text whose root is not a mapping yield the default
/// document. Package catalog references are not resolved here.
pub fn parse(text: &str) -> Result<SchemaDocument, FormatError> {
    if text.trim().is_empty() {
        return Ok(SchemaDocument::default());
    }

    let root: Value = serde_yaml::from_str(text)
        .map_err(|e| FormatError::ParseError(e.to_string()))?;

    Ok(match root.as_mapping() {
        Some(root) => build_document(root),
        None => SchemaDocument::default(),
    })
}

/// Parse text into a document, falling back to the default document
///
/// Never fails. A parse failure is logged and indistinguishable from empty
/// input by return value; use [`parse`] to tell them apart.
pub fn deserialize(text: &str) -> SchemaDocument {
    match parse(text) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable schema document, using default document");
            SchemaDocument::default()
        }
    }
}

fn build_document(root: &Mapping) -> SchemaDocument {
    let mut document = SchemaDocument::default();

    if let Some(section) = root.get("sage_yaml").and_then(Value::as_mapping) {
        document.metadata = Some(build_metadata(section));
    }

    if let Some(section) = root.get("catalogs").and_then(Value::as_mapping) {
        document.catalogs = section
            .iter()
            .map(|(key, value)| build_catalog(&scalar_text(key).unwrap_or_default(), value))
            .collect();
    }

    if let Some(section) = root.get("packages").and_then(Value::as_mapping) {
        let mut entries = section.iter();
        if let Some((key, value)) = entries.next() {
            document.package = build_package(&scalar_text(key).unwrap_or_default(), value);
        }

        let dropped = entries.count();
        if dropped > 0 {
            tracing::debug!(dropped, "only the first package is kept");
        }
    }

    document
}

fn build_metadata(section: &Mapping) -> PackageMetadata {
    PackageMetadata {
        name: text(section, "name").unwrap_or_default(),
        description: text(section, "description").unwrap_or_default(),
        version: text(section, "version").unwrap_or_default(),
        author: text(section, "author").unwrap_or_default(),
        comments: text(section, "comments"),
    }
}

fn build_catalog(key: &str, value: &Value) -> Catalog {
    let empty = Mapping::new();
    let entry = value.as_mapping().unwrap_or(&empty);

    let file_format = entry
        .get("file_format")
        .and_then(Value::as_mapping)
        .map(|m| build_file_format(m, DEFAULT_CATALOG_FILE_TYPE))
        .unwrap_or_else(|| FileFormat::new(DEFAULT_CATALOG_FILE_TYPE));

    Catalog {
        name: text(entry, "name").unwrap_or_else(|| key.to_string()),
        description: text(entry, "description"),
        filename: text(entry, "filename"),
        file_format,
        fields: mappings(entry, "fields").map(build_field).collect(),
        row_validation: rules(entry, "row_validation"),
        catalog_validation: rules(entry, "catalog_validation"),
    }
}

fn build_field(entry: &Mapping) -> Field {
    Field {
        name: text(entry, "name").unwrap_or_default(),
        field_type: text(entry, "type").unwrap_or_else(|| DEFAULT_FIELD_TYPE.to_string()),
        description: text(entry, "description"),
        required: flag(entry, "required"),
        unique: flag(entry, "unique"),
        default_value: entry.get("default").and_then(default_value),
        validation_rules: rules(entry, "validation_rules"),
    }
}

fn build_package(key: &str, value: &Value) -> Package {
    let empty = Mapping::new();
    let entry = value.as_mapping().unwrap_or(&empty);

    Package {
        name: text(entry, "name").unwrap_or_else(|| key.to_string()),
        description: text(entry, "description"),
        version: text(entry, "version"),
        file_format: entry
            .get("file_format")
            .and_then(Value::as_mapping)
            .map(|m| build_file_format(m, DEFAULT_PACKAGE_FILE_TYPE)),
        catalogs: sequence(entry, "catalogs").iter().filter_map(scalar_text).collect(),
        package_validation: rules(entry, "package_validation"),
    }
}

fn build_file_format(entry: &Mapping, default_type: &str) -> FileFormat {
    FileFormat {
        file_type: text(entry, "type").unwrap_or_else(|| default_type.to_string()),
        delimiter: text(entry, "delimiter"),
        header: flag(entry, "header"),
    }
}

fn rules(entry: &Mapping, key: &str) -> Vec<ValidationRule> {
    mappings(entry, key)
        .map(|rule| ValidationRule {
            name: text(rule, "name").unwrap_or_default(),
            description: text(rule, "description").unwrap_or_default(),
            rule: text(rule, "rule").unwrap_or_default(),
            severity: text(rule, "severity").unwrap_or_default(),
        })
        .collect()
}

/// Items of a list-shaped value; anything else reads as an empty list
fn sequence<'a>(entry: &'a Mapping, key: &str) -> &'a [Value] {
    entry
        .get(key)
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Mapping items of a list; scalar items are skipped
fn mappings<'a>(entry: &'a Mapping, key: &str) -> impl Iterator<Item = &'a Mapping> {
    sequence(entry, key).iter().filter_map(Value::as_mapping)
}

fn text(entry: &Mapping, key: &str) -> Option<String> {
    entry.get(key).and_then(scalar_text)
}

fn flag(entry: &Mapping, key: &str) -> Option<bool> {
    entry.get(key).and_then(Value::as_bool)
}

/// Strings as-is, numbers and booleans in their textual form
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn default_value(value: &Value) -> Option<DefaultValue> {
    match value {
        Value::Bool(b) => Some(DefaultValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(DefaultValue::Integer(i)),
            None => n.as_f64().map(DefaultValue::Float),
        },
        Value::String(s) => Some(DefaultValue::Text(s.clone())),
        _ => None,
    }
}

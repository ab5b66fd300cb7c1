//! Entity types of a validation-schema document
//!
//! A document describes one data package: the catalogs (files) it contains,
//! the fields of each catalog and the validation rules attached at field,
//! row, catalog and package level.

use serde::{Deserialize, Serialize};

/// Package name used by freshly created and fallback documents
pub const DEFAULT_PACKAGE_NAME: &str = "Default Package";

/// Field type assumed when a field does not declare one
pub const DEFAULT_FIELD_TYPE: &str = "texto";

/// File type assumed for a catalog's file format
pub const DEFAULT_CATALOG_FILE_TYPE: &str = "CSV";

/// File type assumed for a package's container format
pub const DEFAULT_PACKAGE_FILE_TYPE: &str = "ZIP";

/// Descriptive header of a document (the `sage_yaml` section)
///
/// Fields are total: once the section exists every descriptive field
/// holds a string, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Keys accepted by [`PackageMetadata::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataKey {
    Name,
    Description,
    Version,
    Author,
    Comments,
}

impl MetadataKey {
    /// Wire spelling of the key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Version => "version",
            Self::Author => "author",
            Self::Comments => "comments",
        }
    }
}

impl std::fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MetadataKey {
    type Err = crate::ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            "version" => Ok(Self::Version),
            "author" => Ok(Self::Author),
            "comments" => Ok(Self::Comments),
            other => Err(crate::ModelError::UnknownMetadataKey(other.to_string())),
        }
    }
}

impl PackageMetadata {
    /// Merge a single key, leaving every other key untouched
    pub fn set(&mut self, key: MetadataKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            MetadataKey::Name => self.name = value,
            MetadataKey::Description => self.description = value,
            MetadataKey::Version => self.version = value,
            MetadataKey::Author => self.author = value,
            MetadataKey::Comments => self.comments = Some(value),
        }
    }

    /// Read a single key
    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        match key {
            MetadataKey::Name => Some(&self.name),
            MetadataKey::Description => Some(&self.description),
            MetadataKey::Version => Some(&self.version),
            MetadataKey::Author => Some(&self.author),
            MetadataKey::Comments => self.comments.as_deref(),
        }
    }
}

/// A named, severity-tagged rule expression
///
/// The expression is opaque here: it is stored and written back verbatim,
/// never evaluated. Severity is passed through without validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub name: String,
    pub description: String,
    pub rule: String,
    pub severity: String,
}

impl ValidationRule {
    /// Create a rule with an empty description
    pub fn new(
        name: impl Into<String>,
        rule: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            rule: rule.into(),
            severity: severity.into(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Physical encoding of a catalog file or of the package container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFormat {
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<bool>,
}

impl FileFormat {
    /// Format with only a type
    pub fn new(file_type: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            delimiter: None,
            header: None,
        }
    }

    /// Comma separated file with a header row, used for new catalogs
    pub fn csv() -> Self {
        Self {
            file_type: DEFAULT_CATALOG_FILE_TYPE.to_string(),
            delimiter: Some(",".to_string()),
            header: Some(true),
        }
    }

    /// ZIP container, used for the default package
    pub fn zip() -> Self {
        Self::new(DEFAULT_PACKAGE_FILE_TYPE)
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Set header presence
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = Some(header);
        self
    }
}

/// Default value of a field
///
/// Floats compare by bit pattern, so a `NaN` default equals itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One column of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// Semantic type label, free-form
    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    /// Written as `default` in documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,

    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
}

impl Field {
    /// Create a field with no optional attributes
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            description: None,
            required: None,
            unique: None,
            default_value: None,
            validation_rules: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }
}

/// Schema of one data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Display name, also the target of package catalog references
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    pub file_format: FileFormat,

    /// Ordered like the columns of the physical file
    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default)]
    pub row_validation: Vec<ValidationRule>,

    #[serde(default)]
    pub catalog_validation: Vec<ValidationRule>,
}

impl Catalog {
    /// Create an empty catalog with the given file format
    pub fn new(name: impl Into<String>, file_format: FileFormat) -> Self {
        Self {
            name: name.into(),
            description: None,
            filename: None,
            file_format,
            fields: Vec::new(),
            row_validation: Vec::new(),
            catalog_validation: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_row_rule(mut self, rule: ValidationRule) -> Self {
        self.row_validation.push(rule);
        self
    }

    pub fn with_catalog_rule(mut self, rule: ValidationRule) -> Self {
        self.catalog_validation.push(rule);
        self
    }

    /// Document key derived from the display name
    pub fn key(&self) -> String {
        catalog_key(&self.name)
    }

    /// Find a field by name
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in column order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// How catalogs bundle into one deliverable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_format: Option<FileFormat>,

    /// Names of referenced catalogs (weak references, not owned)
    #[serde(default)]
    pub catalogs: Vec<String>,

    #[serde(default)]
    pub package_validation: Vec<ValidationRule>,
}

impl Package {
    /// Create a package with no catalogs and no file format
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: None,
            file_format: None,
            catalogs: Vec::new(),
            package_validation: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_file_format(mut self, file_format: FileFormat) -> Self {
        self.file_format = Some(file_format);
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalogs.push(catalog.into());
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.package_validation.push(rule);
        self
    }

    /// Document key derived from the package name
    pub fn key(&self) -> String {
        catalog_key(&self.name)
    }

    /// Whether the package references a catalog name
    pub fn references(&self, catalog: &str) -> bool {
        self.catalogs.iter().any(|c| c == catalog)
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new(DEFAULT_PACKAGE_NAME).with_file_format(FileFormat::zip())
    }
}

/// Machine-safe document key: lowercase, whitespace runs become `_`
///
/// Distinct names may share a key ("Ventas" and "ventas").
pub fn catalog_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut in_space = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                key.push('_');
                in_space = true;
            }
        } else {
            key.extend(c.to_lowercase());
            in_space = false;
        }
    }

    key
}

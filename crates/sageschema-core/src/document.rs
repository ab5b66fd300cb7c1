//! Document aggregate and its mutation API
//!
//! Every mutation borrows the current document and returns a new one, so a
//! caller never observes a half-applied change. Invariants held after each
//! mutation:
//! - the document has exactly one package
//! - deleting a catalog drops every package reference to its name

use serde::{Deserialize, Serialize};

use crate::model::{Catalog, FileFormat, MetadataKey, Package, PackageMetadata};

/// Full validation specification: metadata, catalogs and one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Descriptive header, absent until set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PackageMetadata>,

    /// Catalogs in document order
    #[serde(default)]
    pub catalogs: Vec<Catalog>,

    pub package: Package,
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self {
            metadata: None,
            catalogs: Vec::new(),
            package: Package::default(),
        }
    }
}

impl SchemaDocument {
    /// Create an empty document with the default package
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a catalog named `Catalog<N>`, N being the new catalog count
    ///
    /// Numbering is positional; an existing catalog with the same name is
    /// not detected. Returns the new document and the appended catalog.
    pub fn add_catalog(&self) -> (Self, Catalog) {
        let catalog = Catalog::new(
            format!("Catalog{}", self.catalogs.len() + 1),
            FileFormat::csv(),
        );

        let mut next = self.clone();
        next.catalogs.push(catalog.clone());

        tracing::debug!(catalog = %catalog.name, "catalog added");
        (next, catalog)
    }

    /// Replace the catalog at `index`
    ///
    /// Package references are not rewritten when the name changes.
    pub fn update_catalog(&self, index: usize, catalog: Catalog) -> Result<Self, ModelError> {
        self.check_index(index)?;

        let mut next = self.clone();
        next.catalogs[index] = catalog;

        tracing::debug!(index, "catalog updated");
        Ok(next)
    }

    /// Remove the catalog at `index` and every package reference to it
    pub fn delete_catalog(&self, index: usize) -> Result<Self, ModelError> {
        self.check_index(index)?;

        let mut next = self.clone();
        let removed = next.catalogs.remove(index);
        next.package.catalogs.retain(|name| *name != removed.name);

        tracing::debug!(catalog = %removed.name, "catalog deleted");
        Ok(next)
    }

    /// Replace the package
    pub fn update_package(&self, package: Package) -> Self {
        let mut next = self.clone();
        next.package = package;
        next
    }

    /// Merge one metadata key, creating the metadata section if needed
    pub fn update_package_metadata(&self, key: MetadataKey, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.metadata
            .get_or_insert_with(PackageMetadata::default)
            .set(key, value);
        next
    }

    /// Position of the first catalog with the given name
    pub fn catalog_index(&self, name: &str) -> Option<usize> {
        self.catalogs.iter().position(|c| c.name == name)
    }

    /// Find a catalog by name
    pub fn find_catalog(&self, name: &str) -> Option<&Catalog> {
        self.catalogs.iter().find(|c| c.name == name)
    }

    /// Catalog names in document order
    pub fn catalog_names(&self) -> Vec<&str> {
        self.catalogs.iter().map(|c| c.name.as_str()).collect()
    }

    fn check_index(&self, index: usize) -> Result<(), ModelError> {
        if index < self.catalogs.len() {
            Ok(())
        } else {
            Err(ModelError::CatalogIndexOutOfRange {
                index,
                len: self.catalogs.len(),
            })
        }
    }
}

/// Model mutation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Catalog index {index} out of range (document has {len} catalogs)")]
    CatalogIndexOutOfRange { index: usize, len: usize },

    #[error("Unknown metadata key: {0}")]
    UnknownMetadataKey(String),
}

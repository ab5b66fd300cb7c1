//! Structural re-validation of a document
//!
//! Loading a document never rejects it for broken references; consumers that
//! need a consistent document run it through [`DocumentChecker`]. Rule
//! expressions are only checked for blankness, never interpreted.

use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Location};
use crate::document::SchemaDocument;
use crate::model::{Catalog, ValidationRule};

/// Produces diagnostics for a document
pub struct DocumentChecker<'a> {
    config: &'a Config,
    file: Option<String>,
}

impl<'a> DocumentChecker<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, file: None }
    }

    /// Tag every location with the file the document came from
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Run every check, in document order
    pub fn check(&self, document: &SchemaDocument) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        self.check_catalog_names(document, &mut diagnostics);

        for catalog in &document.catalogs {
            if self.config.allowlist.is_catalog_skipped(&catalog.name) {
                tracing::debug!(catalog = %catalog.name, "skipping allowlisted catalog");
                continue;
            }
            self.check_catalog(catalog, &mut diagnostics);
        }

        self.check_package(document, &mut diagnostics);

        diagnostics
    }

    /// Number of catalogs `check` inspects in depth
    pub fn catalogs_checked(&self, document: &SchemaDocument) -> usize {
        document
            .catalogs
            .iter()
            .filter(|c| !self.config.allowlist.is_catalog_skipped(&c.name))
            .count()
    }

    fn check_catalog_names(&self, document: &SchemaDocument, out: &mut Vec<Diagnostic>) {
        let mut names = HashSet::new();
        let mut keys: HashMap<String, &str> = HashMap::new();

        for catalog in &document.catalogs {
            let key = catalog.key();
            let path = format!("catalogs.{}", key);

            if !names.insert(catalog.name.as_str()) {
                out.push(self.diagnostic(
                    DiagnosticCode::DuplicateCatalogName,
                    format!("Catalog name '{}' is used more than once", catalog.name),
                    path,
                ));
                continue;
            }

            match keys.get(&key) {
                Some(first) => {
                    let diag = self
                        .diagnostic(
                            DiagnosticCode::CatalogKeyCollision,
                            format!(
                                "Catalogs '{}' and '{}' share the document key '{}'; only one survives serialization",
                                first, catalog.name, key
                            ),
                            path,
                        )
                        .with_comparison(*first, catalog.name.clone());
                    out.push(diag);
                }
                None => {
                    keys.insert(key, catalog.name.as_str());
                }
            }
        }
    }

    fn check_catalog(&self, catalog: &Catalog, out: &mut Vec<Diagnostic>) {
        let base = format!("catalogs.{}", catalog.key());

        if catalog.fields.is_empty() {
            out.push(self.diagnostic(
                DiagnosticCode::CatalogWithoutFields,
                format!("Catalog '{}' declares no fields", catalog.name),
                base.clone(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, field) in catalog.fields.iter().enumerate() {
            let path = format!("{}.fields[{}]", base, i);

            if !seen.insert(field.name.as_str()) {
                out.push(self.diagnostic(
                    DiagnosticCode::DuplicateFieldName,
                    format!("Field '{}' appears more than once in catalog '{}'", field.name, catalog.name),
                    path.clone(),
                ));
            }

            self.check_rules(&field.validation_rules, &format!("{}.validation_rules", path), out);
        }

        self.check_rules(&catalog.row_validation, &format!("{}.row_validation", base), out);
        self.check_rules(&catalog.catalog_validation, &format!("{}.catalog_validation", base), out);
    }

    fn check_package(&self, document: &SchemaDocument, out: &mut Vec<Diagnostic>) {
        let package = &document.package;
        let base = format!("packages.{}", package.key());

        for (i, reference) in package.catalogs.iter().enumerate() {
            if document.find_catalog(reference).is_none() {
                let known = document.catalog_names().join(", ");
                let diag = self
                    .diagnostic(
                        DiagnosticCode::DanglingCatalogReference,
                        format!(
                            "Package '{}' references unknown catalog '{}'",
                            package.name, reference
                        ),
                        format!("{}.catalogs[{}]", base, i),
                    )
                    .with_comparison(format!("one of [{}]", known), reference.clone());
                out.push(diag);
            }
        }

        self.check_rules(&package.package_validation, &format!("{}.package_validation", base), out);
    }

    fn check_rules(&self, rules: &[ValidationRule], base: &str, out: &mut Vec<Diagnostic>) {
        for (i, rule) in rules.iter().enumerate() {
            if rule.rule.trim().is_empty() {
                out.push(self.diagnostic(
                    DiagnosticCode::EmptyRuleExpression,
                    format!("Validation rule '{}' has no expression", rule.name),
                    format!("{}[{}]", base, i),
                ));
            }
        }
    }

    fn diagnostic(&self, code: DiagnosticCode, message: String, path: String) -> Diagnostic {
        let severity = self.config.severity.get_severity(code, code.default_severity());

        let mut location = Location::new(path);
        if let Some(file) = &self.file {
            location = location.in_file(file.clone());
        }

        Diagnostic::new(code, severity, message).with_location(location)
    }
}

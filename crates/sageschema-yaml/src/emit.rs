//! Document → text
//!
//! Layout is fixed: `sage_yaml`, `catalogs`, `packages`, two-space indent,
//! a blank line between sections. Optional attributes are omitted when
//! absent; strings are always double-quoted and escaped.

use std::fmt::Write as _;

use sageschema_core::{
    Catalog, DefaultValue, Field, FileFormat, Package, PackageMetadata, SchemaDocument,
    ValidationRule,
};

/// Render a document as text
pub fn serialize(document: &SchemaDocument) -> String {
    let mut sections = Vec::new();

    if let Some(metadata) = &document.metadata {
        sections.push(metadata_section(metadata));
    }

    if !document.catalogs.is_empty() {
        sections.push(catalogs_section(&document.catalogs));
    }

    sections.push(package_section(&document.package));

    sections.join("\n")
}

/// Indented line buffer
struct Writer {
    out: String,
}

impl Writer {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn string(&mut self, indent: usize, key: &str, value: &str) {
        self.line(indent, &format!("{}: {}", key, quote(value)));
    }

    fn opt_string(&mut self, indent: usize, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.string(indent, key, value);
        }
    }

    fn opt_bool(&mut self, indent: usize, key: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.line(indent, &format!("{}: {}", key, value));
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

fn metadata_section(metadata: &PackageMetadata) -> String {
    let mut w = Writer::new();
    w.line(0, "sage_yaml:");
    w.string(1, "name", &metadata.name);
    w.string(1, "description", &metadata.description);
    w.string(1, "version", &metadata.version);
    w.string(1, "author", &metadata.author);
    w.opt_string(1, "comments", metadata.comments.as_deref());
    w.finish()
}

fn catalogs_section(catalogs: &[Catalog]) -> String {
    // Colliding keys keep their first position and the last catalog written.
    let mut entries: Vec<(String, &Catalog)> = Vec::new();
    for catalog in catalogs {
        let key = catalog.key();
        match entries.iter_mut().find(|entry| entry.0 == key) {
            Some(entry) => {
                tracing::warn!(key = %key, catalog = %catalog.name, "catalog key collision, earlier catalog overwritten");
                entry.1 = catalog;
            }
            None => entries.push((key, catalog)),
        }
    }

    let mut w = Writer::new();
    w.line(0, "catalogs:");
    for (key, catalog) in entries {
        w.line(1, &format!("{}:", map_key(&key)));
        write_catalog(&mut w, catalog);
    }
    w.finish()
}

fn write_catalog(w: &mut Writer, catalog: &Catalog) {
    w.string(2, "name", &catalog.name);
    w.opt_string(2, "description", catalog.description.as_deref());
    w.opt_string(2, "filename", catalog.filename.as_deref());
    write_file_format(w, 2, &catalog.file_format);

    if !catalog.fields.is_empty() {
        w.line(2, "fields:");
        for field in &catalog.fields {
            write_field(w, field);
        }
    }

    write_rules(w, 2, "row_validation", &catalog.row_validation);
    write_rules(w, 2, "catalog_validation", &catalog.catalog_validation);
}

fn write_field(w: &mut Writer, field: &Field) {
    w.line(3, &format!("- name: {}", quote(&field.name)));
    w.string(4, "type", &field.field_type);
    w.opt_string(4, "description", field.description.as_deref());
    w.opt_bool(4, "required", field.required);
    w.opt_bool(4, "unique", field.unique);
    if let Some(value) = &field.default_value {
        w.line(4, &format!("default: {}", default_scalar(value)));
    }
    write_rules(w, 4, "validation_rules", &field.validation_rules);
}

fn write_file_format(w: &mut Writer, indent: usize, format: &FileFormat) {
    w.line(indent, "file_format:");
    w.string(indent + 1, "type", &format.file_type);
    w.opt_string(indent + 1, "delimiter", format.delimiter.as_deref());
    w.opt_bool(indent + 1, "header", format.header);
}

fn write_rules(w: &mut Writer, indent: usize, key: &str, rules: &[ValidationRule]) {
    if rules.is_empty() {
        return;
    }

    w.line(indent, &format!("{}:", key));
    for rule in rules {
        w.line(indent + 1, &format!("- name: {}", quote(&rule.name)));
        w.string(indent + 2, "description", &rule.description);
        w.string(indent + 2, "rule", &rule.rule);
        w.string(indent + 2, "severity", &rule.severity);
    }
}

fn package_section(package: &Package) -> String {
    let mut w = Writer::new();
    w.line(0, "packages:");
    w.line(1, &format!("{}:", map_key(&package.key())));
    w.string(2, "name", &package.name);
    w.opt_string(2, "description", package.description.as_deref());
    w.opt_string(2, "version", package.version.as_deref());
    if let Some(format) = &package.file_format {
        write_file_format(&mut w, 2, format);
    }

    if package.catalogs.is_empty() {
        w.line(2, "catalogs: []");
    } else {
        w.line(2, "catalogs:");
        for reference in &package.catalogs {
            w.line(3, &format!("- {}", quote(reference)));
        }
    }

    write_rules(&mut w, 2, "package_validation", &package.package_validation);
    w.finish()
}

fn default_scalar(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Bool(b) => b.to_string(),
        DefaultValue::Integer(i) => i.to_string(),
        DefaultValue::Float(x) => float_scalar(*x),
        DefaultValue::Text(s) => quote(s),
    }
}

/// Floats always carry a decimal point so they reload as floats
fn float_scalar(x: f64) -> String {
    if x.is_nan() {
        return ".nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }

    let mut s = x.to_string();
    if !s.contains('.') && !s.contains('e') {
        s.push_str(".0");
    }
    s
}

/// Double-quoted scalar with YAML escapes
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_escape(c) => {
                let code = c as u32;
                if code <= 0xFFFF {
                    let _ = write!(out, "\\u{:04X}", code);
                } else {
                    let _ = write!(out, "\\U{:08X}", code);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Characters outside the YAML printable set, plus the ones a reader
/// would fold as line breaks (NEL, LS, PS)
fn needs_escape(c: char) -> bool {
    let printable = matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0x7E | 0x85 | 0xA0..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    ) && c != '\u{FEFF}';

    !printable || matches!(c, '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// Keys are written bare when they cannot be mistaken for anything else
fn map_key(key: &str) -> String {
    let plain = !key.is_empty()
        && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        && !key.starts_with('-')
        && !key.starts_with(|c: char| c.is_ascii_digit())
        && !matches!(key, "true" | "false" | "null" | "yes" | "no" | "on" | "off");

    if plain {
        key.to_string()
    } else {
        quote(key)
    }
}

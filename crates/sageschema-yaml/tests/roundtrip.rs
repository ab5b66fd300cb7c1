//! Integration tests for document serialization
//!
//! Documents are built through the mutation API, written to text and read
//! back with the lenient reader.

use pretty_assertions::assert_eq;
use sageschema_core::{
    Catalog, DefaultValue, Field, FileFormat, MetadataKey, Package, SchemaDocument,
    ValidationRule, DEFAULT_PACKAGE_NAME,
};
use sageschema_yaml::{deserialize, parse, serialize};

// =============================================================================
// Helper Functions
// =============================================================================

fn edited_document() -> SchemaDocument {
    let doc = SchemaDocument::new()
        .update_package_metadata(MetadataKey::Name, "censo")
        .update_package_metadata(MetadataKey::Description, "Censo de poblacion")
        .update_package_metadata(MetadataKey::Version, "3")
        .update_package_metadata(MetadataKey::Author, "INE")
        .update_package_metadata(MetadataKey::Comments, "revisado");

    let (doc, _) = doc.add_catalog();
    let (doc, _) = doc.add_catalog();

    let personas = Catalog::new("Personas", FileFormat::csv().with_delimiter(";"))
        .with_description("Una fila por persona")
        .with_filename("personas.csv")
        .with_field(
            Field::new("id", "entero")
                .with_required(true)
                .with_unique(true),
        )
        .with_field(
            Field::new("edad", "entero")
                .with_required(false)
                .with_default(DefaultValue::Integer(0))
                .with_rule(
                    ValidationRule::new("rango", "edad >= 0 && edad < 130", "error")
                        .with_description("edad plausible"),
                ),
        )
        .with_field(Field::new("ingreso", "decimal").with_default(DefaultValue::Float(2.0)))
        .with_field(Field::new("activo", "booleano").with_default(DefaultValue::Bool(true)))
        .with_field(Field::new("pais", "texto").with_default(DefaultValue::Text("MX".to_string())))
        .with_row_rule(ValidationRule::new("id_presente", "id != null", "error"))
        .with_catalog_rule(ValidationRule::new("no_vacio", "count(*) > 0", "warning"));

    let doc = doc.update_catalog(0, personas).unwrap();

    doc.update_package(
        Package::new("Censo Nacional")
            .with_description("Entrega anual")
            .with_version("2024.1")
            .with_file_format(FileFormat::zip())
            .with_catalog("Personas")
            .with_catalog("Catalog2")
            .with_rule(ValidationRule::new("completo", "all_catalogs_present()", "error")),
    )
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_roundtrip_edited_document() {
    let doc = edited_document();
    assert_eq!(deserialize(&serialize(&doc)), doc);
}

#[test]
fn test_roundtrip_default_document() {
    let doc = SchemaDocument::new();
    assert_eq!(deserialize(&serialize(&doc)), doc);
}

#[test]
fn test_roundtrip_preserves_catalog_and_field_order() {
    let mut doc = SchemaDocument::new();
    for name in ["Zeta", "Alfa", "Medio"] {
        doc.catalogs.push(
            Catalog::new(name, FileFormat::csv())
                .with_field(Field::new("z", "texto"))
                .with_field(Field::new("a", "texto")),
        );
    }

    let back = deserialize(&serialize(&doc));
    assert_eq!(back.catalog_names(), vec!["Zeta", "Alfa", "Medio"]);
    assert_eq!(back.catalogs[1].field_names(), vec!["z", "a"]);
}

#[test]
fn test_roundtrip_escapes_quotes() {
    let catalog = Catalog::new("Dice \"hola\"", FileFormat::csv().with_delimiter("\t"))
        .with_description("ruta C:\\datos\nsegunda linea")
        .with_field(
            Field::new("nombre", "texto")
                .with_rule(ValidationRule::new("sin comillas", "!contains(nombre, '\"')", "error")),
        );

    let mut doc = SchemaDocument::new();
    doc.catalogs.push(catalog);
    doc.package.catalogs.push("Dice \"hola\"".to_string());

    let text = serialize(&doc);
    assert_eq!(parse(&text).unwrap(), doc);
}

#[test]
fn test_roundtrip_non_printable_characters() {
    let odd = "a\u{FFFE}b\u{FFFF}c\u{FEFF}d\u{7F}e\u{85}f\u{2028}g\u{0}h";

    let (doc, _) = SchemaDocument::new().add_catalog();
    let catalog = Catalog::new("Ventas", FileFormat::csv())
        .with_description(odd)
        .with_field(Field::new(odd, "texto").with_default(DefaultValue::Text(odd.to_string())));
    let doc = doc.update_catalog(0, catalog).unwrap();

    let text = serialize(&doc);
    assert_eq!(parse(&text).unwrap(), doc);
    assert_eq!(deserialize(&text), doc);
}

#[test]
fn test_roundtrip_preserves_explicit_false() {
    let mut doc = SchemaDocument::new();
    doc.catalogs.push(
        Catalog::new("Ventas", FileFormat::new("CSV").with_header(false))
            .with_field(Field::new("monto", "decimal").with_required(false).with_unique(false)),
    );

    let back = deserialize(&serialize(&doc));
    assert_eq!(back.catalogs[0].file_format.header, Some(false));
    assert_eq!(back.catalogs[0].fields[0].required, Some(false));
    assert_eq!(back.catalogs[0].fields[0].unique, Some(false));
}

// =============================================================================
// Defaulting
// =============================================================================

#[test]
fn test_defaulting_is_idempotent() {
    let texts = [
        "",
        "sage_yaml:\n  name: censo\n",
        "catalogs:\n  ventas:\n    fields:\n      - name: edad\n      - nombre\n",
        "catalogs:\n  ventas: ~\n  compras:\n    name: Compras\n    file_format: {type: TSV, header: false}\n",
        "packages:\n  p:\n    catalogs: [a, 1, true]\n    package_validation:\n      - rule: x\n",
        "catalogs:\n  x:\n    fields:\n      - name: f\n        default: 4.0\n      - name: g\n        default: \"4\"\n",
        "catalogs:\n  x:\n    fields:\n      - name: f\n        default: .nan\n      - name: g\n        default: -.inf\n",
    ];

    for text in texts {
        let once = deserialize(text);
        let twice = deserialize(&serialize(&once));
        assert_eq!(twice, once, "defaulting not stable for {:?}", text);
    }
}

#[test]
fn test_field_defaulting() {
    let doc = deserialize("catalogs:\n  personas:\n    fields: [{name: edad}]\n");
    let field = &doc.catalogs[0].fields[0];

    assert_eq!(field.field_type, "texto");
    assert_eq!(field.required, None);
    assert!(field.validation_rules.is_empty());
}

#[test]
fn test_parse_failure_fallback() {
    let doc = deserialize("not: [valid, markup");

    assert!(doc.catalogs.is_empty());
    assert!(doc.metadata.is_none());
    assert_eq!(doc.package.name, DEFAULT_PACKAGE_NAME);
    assert_eq!(doc, SchemaDocument::default());
}

#[test]
fn test_parse_failure_visible_through_parse() {
    assert!(parse("not: [valid, markup").is_err());
    assert!(parse("").is_ok());
}

// =============================================================================
// Package Handling
// =============================================================================

#[test]
fn test_only_first_package_is_kept() {
    let text = r#"
packages:
  pkg_a:
    name: "Paquete A"
    version: "1"
    catalogs:
      - ventas
  pkg_b:
    name: "Paquete B"
    catalogs:
      - compras
"#;

    let doc = deserialize(text);
    assert_eq!(
        doc.package,
        Package::new("Paquete A").with_version("1").with_catalog("ventas")
    );
}

#[test]
fn test_dangling_references_survive_loading() {
    let doc = deserialize("packages:\n  p:\n    catalogs:\n      - fantasma\n");
    assert!(doc.catalogs.is_empty());
    assert_eq!(doc.package.catalogs, vec!["fantasma".to_string()]);
}

#[test]
fn test_delete_cascade_survives_roundtrip() {
    let doc = edited_document();
    let index = doc.catalog_index("Personas").unwrap();

    let doc = doc.delete_catalog(index).unwrap();
    let back = deserialize(&serialize(&doc));

    assert!(!back.package.references("Personas"));
    assert_eq!(back.package.catalogs, vec!["Catalog2".to_string()]);
}

// =============================================================================
// Mutation API
// =============================================================================

#[test]
fn test_auto_naming_is_positional() {
    let (doc, first) = SchemaDocument::new().add_catalog();
    let renamed = Catalog { name: "Ventas".to_string(), ..first };
    let doc = doc.update_catalog(0, renamed).unwrap();

    let (doc, second) = doc.add_catalog();
    let (doc, third) = doc.add_catalog();

    assert_eq!(second.name, "Catalog2");
    assert_eq!(third.name, "Catalog3");
    assert_eq!(doc.catalog_names(), vec!["Ventas", "Catalog2", "Catalog3"]);
}

#[test]
fn test_three_new_catalogs() {
    let (doc, _) = SchemaDocument::new().add_catalog();
    let (doc, _) = doc.add_catalog();
    let (doc, _) = doc.add_catalog();

    assert_eq!(doc.catalog_names(), vec!["Catalog1", "Catalog2", "Catalog3"]);
}

// =============================================================================
// Known Boundaries
// =============================================================================

#[test]
fn test_key_collision_loses_a_catalog() {
    // "Ventas" and "ventas" are distinct in memory but share the key `ventas`.
    let mut doc = SchemaDocument::new();
    doc.catalogs.push(Catalog::new("Ventas", FileFormat::csv()));
    doc.catalogs.push(Catalog::new("ventas", FileFormat::csv()));

    let back = deserialize(&serialize(&doc));
    assert_eq!(back.catalog_names(), vec!["ventas"]);
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sageschema_core::{
    Catalog, Config, Diagnostic, DiagnosticCode, DocumentChecker, Location, MetadataKey, Package,
    Report, SchemaDocument, Severity,
};
use sageschema_yaml::{load_file, parse, save_file, serialize};

/// SageSchema - validation schemas for data packages
#[derive(Parser)]
#[command(name = "sageschema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sageschema.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new schema document
    Init {
        /// Document to create
        path: PathBuf,

        /// Package name (default: "Default Package")
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Rewrite a document in canonical form
    Fmt {
        /// Document to format
        path: PathBuf,

        /// Only report whether the document is canonical
        #[arg(long)]
        check: bool,
    },

    /// Print a summary of a document
    Show {
        /// Document to show
        path: PathBuf,

        /// Print the full model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append a new catalog
    AddCatalog {
        /// Document to edit
        path: PathBuf,

        /// Name for the new catalog (default: Catalog<N>)
        #[arg(short, long)]
        name: Option<String>,

        /// Also reference the catalog from the package
        #[arg(long)]
        link: bool,
    },

    /// Remove a catalog and every package reference to it
    RemoveCatalog {
        /// Document to edit
        path: PathBuf,

        /// Catalog name
        name: String,
    },

    /// Set one package metadata key (name, description, version, author, comments)
    SetMeta {
        /// Document to edit
        path: PathBuf,

        key: String,

        value: String,
    },

    /// Check references and catalog structure
    Check {
        /// Document to check
        path: PathBuf,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Init { path, name, force } => init_command(&path, name, force),
        Commands::Fmt { path, check } => fmt_command(&path, check),
        Commands::Show { path, json } => show_command(&path, json),
        Commands::AddCatalog { path, name, link } => add_catalog_command(&path, name, link),
        Commands::RemoveCatalog { path, name } => remove_catalog_command(&path, &name),
        Commands::SetMeta { path, key, value } => set_meta_command(&path, &key, value),
        Commands::Check { path, output, markdown } => {
            let config = load_config(cli.config.as_deref())?;
            check_command(&config, &path, &output, markdown.as_deref(), cli.verbose)
        }
    }
}

/// Explicit config path, else `sageschema.toml` in the working directory, else defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(config_path) = path {
        return Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()));
    }

    let local = Path::new("sageschema.toml");
    if local.exists() {
        return Ok(Config::from_file(local)?);
    }

    tracing::debug!("no config file found, using defaults");
    Ok(Config::default())
}

/// Init command - write a fresh document
fn init_command(path: &Path, name: Option<String>, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
    }

    let mut document = SchemaDocument::new();
    if let Some(name) = name {
        document = document.update_package(Package { name, ..Package::default() });
    }

    save_file(path, &document)?;
    println!("{} {}", "Created".green(), path.display());

    Ok(())
}

/// Fmt command - canonicalize a document in place
fn fmt_command(path: &Path, check: bool) -> Result<()> {
    let original = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let canonical = canonical_form(&original)
        .with_context(|| format!("Refusing to format unreadable document {}", path.display()))?;

    let Some(canonical) = canonical else {
        println!("{} {}", "✓ Canonical:".green(), path.display());
        return Ok(());
    };

    if check {
        println!("{} {}", "✗ Not canonical:".red(), path.display());
        std::process::exit(1);
    }

    std::fs::write(path, canonical)?;
    println!("{} {}", "Formatted".green(), path.display());

    Ok(())
}

/// Canonical text for `original`, or `None` when it is already canonical
fn canonical_form(original: &str) -> Result<Option<String>> {
    let canonical = serialize(&parse(original)?);
    Ok((canonical != original).then_some(canonical))
}

/// Show command - summarize catalogs and package
fn show_command(path: &Path, json: bool) -> Result<()> {
    if json {
        println!("{}", document_json(path)?);
        return Ok(());
    }

    let document = load_file(path)?;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Document".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if let Some(meta) = &document.metadata {
        println!("{} {} {}", "Metadata:".bold(), meta.name.green(), meta.version);
        if !meta.author.is_empty() {
            println!("  Author: {}", meta.author);
        }
        println!();
    }

    println!("{} {}", "Catalogs:".bold(), document.catalogs.len());
    for (i, catalog) in document.catalogs.iter().enumerate() {
        println!(
            "  {}. {} ({}, {} fields, {} rules)",
            i + 1,
            catalog.name.yellow(),
            catalog.file_format.file_type,
            catalog.fields.len(),
            rule_count(catalog)
        );
    }
    println!();

    let package = &document.package;
    println!("{} {}", "Package:".bold(), package.name.green());
    if let Some(format) = &package.file_format {
        println!("  Format: {}", format.file_type);
    }
    println!("  Catalogs: {}", package.catalogs.join(", "));
    println!("  Rules: {}", package.package_validation.len());

    println!();
    println!("{}", "=".repeat(60).bright_blue());

    Ok(())
}

fn document_json(path: &Path) -> Result<String> {
    Ok(serde_json::to_string_pretty(&load_file(path)?)?)
}

fn rule_count(catalog: &Catalog) -> usize {
    catalog.row_validation.len()
        + catalog.catalog_validation.len()
        + catalog.fields.iter().map(|f| f.validation_rules.len()).sum::<usize>()
}

/// Add-catalog command - append a catalog, optionally renamed and linked
fn add_catalog_command(path: &Path, name: Option<String>, link: bool) -> Result<()> {
    let document = load_file(path)?;

    let (mut document, mut catalog) = document.add_catalog();
    if let Some(name) = name {
        catalog.name = name;
        document = document.update_catalog(document.catalogs.len() - 1, catalog.clone())?;
    }

    if link {
        let package = document.package.clone().with_catalog(catalog.name.clone());
        document = document.update_package(package);
    }

    save_file(path, &document)?;
    println!("{} {}", "Added catalog".green(), catalog.name);

    Ok(())
}

/// Remove-catalog command - delete by name with reference cascade
fn remove_catalog_command(path: &Path, name: &str) -> Result<()> {
    let document = load_file(path)?;

    let index = document
        .catalog_index(name)
        .ok_or_else(|| anyhow::anyhow!(
            "Catalog '{}' not found. Known catalogs: {}",
            name,
            document.catalog_names().join(", ")
        ))?;

    let document = document.delete_catalog(index)?;
    save_file(path, &document)?;
    println!("{} {}", "Removed catalog".green(), name);

    Ok(())
}

/// Set-meta command - merge one metadata key
fn set_meta_command(path: &Path, key: &str, value: String) -> Result<()> {
    let key: MetadataKey = key.parse()?;
    let document = load_file(path)?.update_package_metadata(key, value);

    save_file(path, &document)?;
    println!("{} {}", "Updated metadata".green(), key);

    Ok(())
}

/// Check command - re-validate references and structure
fn check_command(
    config: &Config,
    path: &Path,
    output: &Path,
    markdown: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Checking".cyan(), path.display());
    }

    let report = run_check(config, path)?;

    // Save JSON report
    report.save_to_file(output)?;

    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), output.display());
    }

    // Save markdown report if requested
    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }

    print_report_summary(&report);

    if check_failed(config, &report) {
        std::process::exit(1);
    }

    Ok(())
}

/// Parse and check one document; an unparseable document is reported, not raised
fn run_check(config: &Config, path: &Path) -> Result<Report> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file = path.display().to_string();

    let mut diagnostics = Vec::new();
    let document = match parse(&contents) {
        Ok(document) => document,
        Err(err) => {
            let severity = config
                .severity
                .get_severity(DiagnosticCode::DocumentParseError, Severity::Error);
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DocumentParseError,
                    severity,
                    format!("Document could not be parsed, default document used: {}", err),
                )
                .with_location(Location::new("(document)").in_file(file.clone())),
            );
            SchemaDocument::default()
        }
    };

    let checker = DocumentChecker::new(config).with_file(file);
    diagnostics.extend(checker.check(&document));

    Ok(Report::from_diagnostics(diagnostics)
        .with_catalogs_checked(checker.catalogs_checked(&document)))
}

fn check_failed(config: &Config, report: &Report) -> bool {
    report.has_errors() || (config.fail_on_warnings && report.has_warnings())
}

/// Print report summary to stdout
fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Document Check Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Catalogs checked:  {}", report.summary.catalogs_checked);
    println!("  Total diagnostics: {}", report.summary.total);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if let Some(loc) = &diag.location {
                println!("    at {}", loc);
            }

            if let Some(exp) = &diag.expected {
                println!("    Expected: {}", exp);
            }
            if let Some(act) = &diag.actual {
                println!("    Actual:   {}", act);
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Schema Document Check Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Catalogs checked: {}\n", report.summary.catalogs_checked));
    md.push_str(&format!("- Total diagnostics: {}\n", report.summary.total));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push_str(&format!("- Info: {}\n", report.summary.info));
    md.push('\n');

    if report.diagnostics.is_empty() {
        md.push_str("✅ **No issues found!**\n");
    } else {
        md.push_str("## Diagnostics\n\n");

        for diag in &report.diagnostics {
            let severity_emoji = match diag.severity {
                Severity::Error => "❌",
                Severity::Warn => "⚠️",
                Severity::Info => "ℹ️",
            };

            md.push_str(&format!("### {} {} - {}\n\n", severity_emoji, diag.severity, diag.code));
            md.push_str(&format!("{}\n\n", diag.message));

            if let Some(loc) = &diag.location {
                md.push_str(&format!("**Location:** `{}`\n\n", loc));
            }

            if let Some(exp) = &diag.expected {
                md.push_str(&format!("**Expected:** `{}`\n\n", exp));
            }
            if let Some(act) = &diag.actual {
                md.push_str(&format!("**Actual:** `{}`\n\n", act));
            }
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn markdown_lists_diagnostics() {
        let report = Report::from_diagnostics(vec![Diagnostic::of(
            DiagnosticCode::DanglingCatalogReference,
            "Package 'p' references unknown catalog 'x'",
        )
        .with_location(Location::new("packages.p.catalogs[0]"))]);

        let md = generate_markdown_report(&report);
        assert!(md.contains("DANGLING_CATALOG_REFERENCE"));
        assert!(md.contains("`packages.p.catalogs[0]`"));
        assert!(md.contains("- Errors: 1"));
    }

    #[test]
    fn add_and_remove_catalog_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");

        init_command(&path, Some("Censo".to_string()), false).unwrap();
        add_catalog_command(&path, Some("Ventas".to_string()), true).unwrap();
        add_catalog_command(&path, None, false).unwrap();

        let document = load_file(&path).unwrap();
        assert_eq!(document.package.name, "Censo");
        assert_eq!(document.catalog_names(), vec!["Ventas", "Catalog2"]);
        assert_eq!(document.package.catalogs, vec!["Ventas".to_string()]);

        remove_catalog_command(&path, "Ventas").unwrap();
        let document = load_file(&path).unwrap();
        assert_eq!(document.catalog_names(), vec!["Catalog2"]);
        assert!(document.package.catalogs.is_empty());

        assert!(remove_catalog_command(&path, "Ventas").is_err());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");

        init_command(&path, None, false).unwrap();
        assert!(init_command(&path, None, false).is_err());
        assert!(init_command(&path, None, true).is_ok());
    }

    #[test]
    fn set_meta_rejects_unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");

        init_command(&path, None, false).unwrap();
        set_meta_command(&path, "author", "INE".to_string()).unwrap();
        assert!(set_meta_command(&path, "owner", "x".to_string()).is_err());

        let metadata = load_file(&path).unwrap().metadata.unwrap();
        assert_eq!(metadata.author, "INE");
        assert_eq!(metadata.name, "");
    }

    #[test]
    fn fmt_rewrites_non_canonical_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, "catalogs:\n  ventas: {name: Ventas}\n").unwrap();

        let original = std::fs::read_to_string(&path).unwrap();
        assert!(canonical_form(&original).unwrap().is_some());

        fmt_command(&path, false).unwrap();
        let formatted = std::fs::read_to_string(&path).unwrap();
        assert_eq!(canonical_form(&formatted).unwrap(), None);
        assert!(formatted.contains("name: \"Ventas\""));

        // Already canonical, so --check passes without exiting.
        fmt_command(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), formatted);
    }

    #[test]
    fn fmt_refuses_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, "not: [valid, markup").unwrap();

        assert!(canonical_form("not: [valid, markup").is_err());
        assert!(fmt_command(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not: [valid, markup");
    }

    #[test]
    fn check_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        let output = dir.path().join("report.json");
        std::fs::write(&path, "not: [valid, markup").unwrap();

        let config = Config::default();
        let report = run_check(&config, &path).unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, DiagnosticCode::DocumentParseError);
        assert_eq!(report.diagnostics[0].location.as_ref().unwrap().path, "(document)");
        assert!(check_failed(&config, &report));

        report.save_to_file(&output).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(saved["diagnostics"][0]["code"], "DOCUMENT_PARSE_ERROR");
        assert_eq!(saved["summary"]["errors"], 1);
    }

    #[test]
    fn check_fails_on_warnings_only_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");

        init_command(&path, None, false).unwrap();
        add_catalog_command(&path, Some("Vacio".to_string()), true).unwrap();

        let mut config = Config::default();
        let report = run_check(&config, &path).unwrap();
        assert!(!report.has_errors());
        assert!(report.has_warnings());
        assert_eq!(report.diagnostics[0].code, DiagnosticCode::CatalogWithoutFields);
        assert!(!check_failed(&config, &report));

        config.fail_on_warnings = true;
        assert!(check_failed(&config, &report));
    }

    #[test]
    fn show_json_contains_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");

        init_command(&path, Some("Censo".to_string()), false).unwrap();
        add_catalog_command(&path, Some("Ventas".to_string()), true).unwrap();

        let json: serde_json::Value = serde_json::from_str(&document_json(&path).unwrap()).unwrap();
        assert_eq!(json["catalogs"][0]["name"], "Ventas");
        assert_eq!(json["package"]["name"], "Censo");
    }

    #[test]
    fn malformed_config_only_fails_when_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("sageschema.toml");
        let path = dir.path().join("schema.yaml");
        std::fs::write(&config_path, "fail_on_warnings = ").unwrap();

        assert!(load_config(Some(&config_path)).is_err());

        init_command(&path, None, false).unwrap();
        add_catalog_command(&path, None, false).unwrap();
        assert_eq!(load_file(&path).unwrap().catalog_names(), vec!["Catalog1"]);

        std::fs::write(&config_path, "fail_on_warnings = true\n").unwrap();
        assert!(load_config(Some(&config_path)).unwrap().fail_on_warnings);
    }
}

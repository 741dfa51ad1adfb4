//! Regload CLI - validate bulk registration uploads
//!
//! ```bash
//! regload validate upload.csv --provider osf          # Validate and print the JSON report
//! regload headers --provider osf --schema prereg       # Print the template header line
//! regload categories                                   # Show the category table in use
//! ```
//!
//! The catalog comes from `--catalog` or `REGLOAD_CATALOG`; a `.env` file is
//! read if present.

use clap::{Parser, Subcommand};
use regload::{
    error_report, template_headers, BulkUpload, ConfigError, EngineConfig, FileCatalog,
    UploadReport,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "regload")]
#[command(about = "Validate bulk registration uploads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an upload and output the JSON report
    Validate {
        /// Input CSV file
        input: PathBuf,

        /// Provider the upload is filed under
        #[arg(short, long)]
        provider: String,

        /// Catalog JSON file (default: $REGLOAD_CATALOG)
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the header line a template for a schema must carry
    Headers {
        /// Provider id
        #[arg(short, long)]
        provider: String,

        /// Registration schema id
        #[arg(short, long)]
        schema: String,

        /// Catalog JSON file (default: $REGLOAD_CATALOG)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Show the category table
    Categories,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            input,
            provider,
            catalog,
            output,
        } => cmd_validate(&input, &provider, catalog, output.as_deref()),

        Commands::Headers {
            provider,
            schema,
            catalog,
        } => cmd_headers(&provider, &schema, catalog),

        Commands::Categories => cmd_categories(),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Resolve config and catalog, preferring the command-line path.
fn load(catalog: Option<PathBuf>) -> Result<(EngineConfig, FileCatalog), ConfigError> {
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = catalog {
        config = config.with_catalog_path(path);
    }

    let path = config.catalog_path.as_ref().ok_or(ConfigError::MissingCatalog)?;
    let catalog = FileCatalog::from_path(path)?;
    Ok((config, catalog))
}

fn cmd_validate(
    input: &Path,
    provider: &str,
    catalog: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (config, catalog) = load(catalog)?;

    eprintln!("📄 Validating: {}", input.display());
    let bytes = fs::read(input)?;

    let mut upload = match BulkUpload::from_bytes(&bytes, provider, &catalog, &config) {
        Ok(upload) => upload,
        Err(e) => {
            let json = serde_json::to_string_pretty(&error_report(&e))?;
            write_output(&json, output)?;
            eprintln!("❌ Upload rejected: {}", e);
            return Ok(false);
        }
    };

    eprintln!("   Encoding: {}", upload.encoding());
    eprintln!("   Schema: {}", upload.schema_id());
    eprintln!("   Rows: {}", upload.rows().len());

    upload.validate();
    let report = UploadReport::from(&upload);

    if upload.is_valid() {
        eprintln!("✅ All {} rows valid", report.stats.rows);
    } else {
        eprintln!(
            "\n📊 Results: {} errors ({} missing, {} invalid) in {} rows",
            report.errors.len(),
            report.stats.missing,
            report.stats.invalid,
            report.stats.rows_with_errors
        );
        for err in &report.errors {
            eprintln!(
                "   - line {}, column {} ({}): {}",
                err.row_index,
                err.column_index,
                err.header,
                if err.missing { "missing" } else { "invalid" }
            );
        }
    }

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;
    Ok(upload.is_valid())
}

fn cmd_headers(
    provider: &str,
    schema: &str,
    catalog: Option<PathBuf>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (_, catalog) = load(catalog)?;
    let headers = template_headers(&catalog, provider, schema)?;

    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(&headers)?;
        writer.flush()?;
    }
    let line = String::from_utf8(buf)?;

    print!("{}", line);
    Ok(true)
}

fn cmd_categories() -> Result<bool, Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env()?;

    println!("📚 Categories ({}):\n", config.categories.len());
    for (name, code) in config.categories.iter() {
        let shown = if name.is_empty() { "(blank)" } else { name };
        println!("  {:<28} → {}", shown, code);
    }
    Ok(true)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

//! docfill — turn contract documents into templates and query the variable
//! catalog from the command line. Results are printed as JSON.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docfill_core::EngineConfig;
use docfill_detect::{extract_from_html, extract_from_pdf_fields, extract_placeholders, PdfFormField};
use docfill_registry::VariableRegistry;
use docfill_runtime::TemplateProcessor;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCFILL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("docfill — contract template detection and variable mapping");
    println!();
    println!("Usage: docfill <command> [args]");
    println!();
    println!("Commands:");
    println!("  extract <file>                 Declared placeholders (.docx, .html, .json PDF fields, text)");
    println!("  detect <file>                  Blanks and filled-in fields with planned bindings");
    println!("  inject <in.docx> [out.docx]    Write a template; add --pdf to also convert it");
    println!("  analyze <text>                 Score text against the variable catalog");
    println!("  map <name> [context]           Map a placeholder name to a catalog variable");
    println!("  catalog [refresh]              Print all variables grouped by block");
    println!("  help                           Show this help message");
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn required_arg<'a>(args: &'a [String], index: usize, usage: &str) -> &'a str {
    match args.get(index) {
        Some(arg) => arg,
        None => {
            eprintln!("Usage: docfill {}", usage);
            std::process::exit(1);
        }
    }
}

async fn run(command: &str, args: &[String], config: &EngineConfig) -> docfill_core::Result<()> {
    match command {
        "extract" => {
            let path = PathBuf::from(required_arg(args, 0, "extract <file>"));
            let fields = match extension(&path).as_str() {
                "docx" => {
                    TemplateProcessor::from_config(config)?
                        .extract_docx_placeholders(&path)
                        .await?
                }
                "html" | "htm" => extract_from_html(&std::fs::read_to_string(&path)?),
                "json" => {
                    let rows: Vec<PdfFormField> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
                    extract_from_pdf_fields(&rows)
                }
                _ => extract_placeholders(&std::fs::read_to_string(&path)?),
            };
            emit(&fields)
        }
        "detect" => {
            let path = PathBuf::from(required_arg(args, 0, "detect <file>"));
            let processor = TemplateProcessor::from_config(config)?;
            let report = if extension(&path) == "docx" {
                processor.detect_docx(&path).await?
            } else {
                processor.detect(&std::fs::read_to_string(&path)?)
            };
            emit(&report)
        }
        "inject" => {
            let input = PathBuf::from(required_arg(args, 0, "inject <in.docx> [out.docx] [--pdf]"));
            let want_pdf = args.iter().any(|a| a == "--pdf");
            let output = match args.get(1).filter(|a| !a.starts_with("--")) {
                Some(out) => PathBuf::from(out),
                None => {
                    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
                    config.data_paths.output.join(format!("{}.template.docx", stem))
                }
            };

            let processor = TemplateProcessor::from_config(config)?;
            let report = processor.process_docx(&input, &output).await?;
            info!("Template written to {}", output.display());
            if want_pdf {
                let pdf_dir = output.parent().unwrap_or(Path::new("."));
                let pdf = processor.export_pdf(&output, pdf_dir).await?;
                info!("PDF written to {}", pdf.display());
            }
            emit(&report)
        }
        "analyze" => {
            let text = args.join(" ");
            let registry = VariableRegistry::open(config)?;
            emit(&registry.analyze_text(&text)?)
        }
        "map" => {
            let name = required_arg(args, 0, "map <name> [context]");
            let context = args[1..].join(" ");
            let registry = VariableRegistry::open(config)?;
            emit(&registry.map_placeholder_to_variable(name, &context)?)
        }
        "catalog" => {
            let registry = VariableRegistry::open(config)?;
            if args.first().map(String::as_str) == Some("refresh") {
                registry.refresh()?;
            }
            emit(&serde_json::json!({
                "blocks": registry.get_all_variables_grouped_by_block()?,
                "stats": registry.stats(),
            }))
        }
        _ => {
            eprintln!("Unknown command: {}. Use 'docfill help' for usage.", command);
            std::process::exit(1);
        }
    }
}

fn emit<T: Serialize>(value: &T) -> docfill_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        print_help();
        return Ok(());
    };
    if matches!(command, "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = EngineConfig::from_env(&data_dir)?;

    if let Err(e) = run(command, &args[2..], &config).await {
        eprintln!("{}", e.user_message());
        eprintln!("({})", e);
        std::process::exit(if e.is_environment() { 2 } else { 1 });
    }
    Ok(())
}

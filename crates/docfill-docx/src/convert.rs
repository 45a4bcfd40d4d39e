//! DOCX → PDF through a headless office converter.
//!
//! One attempt per call, bounded by the configured timeout. The child is
//! killed when the timeout fires.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{info, warn};

use docfill_core::{ConverterConfig, Error, Result};

/// Convert `input` into `out_dir/<stem>.pdf` and return the PDF path.
pub async fn convert_to_pdf(config: &ConverterConfig, input: &Path, out_dir: &Path) -> Result<PathBuf> {
    if !input.is_file() {
        return Err(Error::NotFound(input.display().to_string()));
    }
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::Conversion(format!("no file name in {}", input.display())))?;
    let mut file_name = stem.to_os_string();
    file_name.push(".pdf");
    let expected = out_dir.join(file_name);
    tokio::fs::create_dir_all(out_dir).await?;

    let mut command = Command::new(&config.soffice);
    command
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(out_dir)
        .arg(input)
        .kill_on_drop(true);

    let output = match tokio::time::timeout(config.timeout(), command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!("Cannot start converter {}: {}", config.soffice.display(), e);
            return Err(Error::ConverterUnavailable(format!("{}: {}", config.soffice.display(), e)));
        }
        Err(_elapsed) => {
            warn!("Conversion of {} timed out after {}s", input.display(), config.timeout_secs);
            return Err(Error::ConversionTimeout(config.timeout_secs));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Conversion(format!("exit {}: {}", output.status, stderr.trim())));
    }
    if !expected.is_file() {
        return Err(Error::Conversion(format!("converter produced no {}", expected.display())));
    }

    info!("Converted {} -> {}", input.display(), expected.display());
    Ok(expected)
}

//! Certificate command - render a certificate of compliance from a record.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use certify_core::certificate::{
    CertificateRenderer, PdfCertificateRenderer, TextCertificateRenderer,
};
use certify_core::models::invoice::InvoiceRecord;

/// Arguments for the certificate command.
#[derive(Args)]
pub struct CertificateArgs {
    /// Invoice record (JSON, as written by `certify process`)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: next to the input; text goes to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Certificate format
    #[arg(short, long, value_enum, default_value = "pdf")]
    format: CertificateFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum CertificateFormat {
    /// PDF document
    Pdf,
    /// Plain text preview
    Text,
}

pub async fn run(args: CertificateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;

    let json = fs::read_to_string(&args.input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.input.display(), e))?;
    let record = InvoiceRecord::from_json(&json)
        .map_err(|e| anyhow::anyhow!("Invalid invoice record {}: {}", args.input.display(), e))?;

    info!(
        "Rendering certificate for invoice {:?} with {} line items",
        record.invoice_number,
        record.line_items.len()
    );

    let renderer: Box<dyn CertificateRenderer> = match args.format {
        CertificateFormat::Pdf => Box::new(PdfCertificateRenderer::new(config.certificate)),
        CertificateFormat::Text => Box::new(TextCertificateRenderer::new(config.certificate)),
    };
    let bytes = renderer.render(&record)?;

    let output_path = match (args.output, args.format) {
        (Some(path), _) => path,
        (None, CertificateFormat::Text) => {
            print!("{}", String::from_utf8_lossy(&bytes));
            return Ok(());
        }
        (None, CertificateFormat::Pdf) => default_output_path(&args.input, renderer.extension()),
    };

    fs::write(&output_path, &bytes)?;
    println!(
        "{} Certificate written to {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

/// `invoice.json` becomes `invoice.certificate.pdf` in the same directory.
fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    input.with_file_name(format!("{}.certificate.{}", stem, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("out/1042.json"), "pdf"),
            PathBuf::from("out/1042.certificate.pdf")
        );
    }
}

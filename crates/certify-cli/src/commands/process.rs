//! Process command - extract data from a single invoice file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use certify_core::invoice::{InvoiceParser, LayoutInvoiceParser, ParseOutcome};
use certify_core::models::config::CertifyConfig;
use certify_core::models::invoice::InvoiceRecord;
use certify_core::ocr::create_backend;
use certify_core::source::{AutoTextSource, SourceDocument, TextSource};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, image or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only the PDF text layer
    #[arg(long)]
    text_only: bool,

    /// Print fields that could not be extracted
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON record
    Json,
    /// CSV, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let document = SourceDocument::open(&args.input)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading OCR models...");
    pb.set_position(10);
    let source = build_source(&config, args.model_dir.as_deref(), args.text_only)?;

    pb.set_message("Extracting text...");
    pb.set_position(30);
    let text = source.extract_text(&document)?;

    pb.set_message("Extracting invoice data...");
    pb.set_position(70);
    let outcome = LayoutInvoiceParser::new().parse(&text);

    pb.set_position(100);
    pb.finish_and_clear();

    let output = format_record(&outcome.record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings {
        print_warnings(&outcome);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Build the text source once, with OCR unless disabled or not configured.
pub fn build_source(
    config: &CertifyConfig,
    model_dir: Option<&Path>,
    text_only: bool,
) -> anyhow::Result<AutoTextSource> {
    let backend = if text_only {
        None
    } else {
        create_backend(&config.ocr, model_dir)
            .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))?
    };
    if backend.is_none() {
        debug!("OCR is not available; only text layers will be read");
    }
    Ok(AutoTextSource::new(config, backend))
}

fn print_warnings(outcome: &ParseOutcome) {
    if outcome.warnings.is_empty() {
        eprintln!("{} All fields extracted", style("ℹ").blue());
        return;
    }
    eprintln!("{}", style("Extraction warnings:").yellow());
    for warning in &outcome.warnings {
        eprintln!("  - {}", warning);
    }
}

pub fn format_record(record: &InvoiceRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(record.to_json_pretty()?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// One row per line item, header fields repeated. A record without items
/// still produces one row.
fn format_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "invoice_number",
        "po_number",
        "date",
        "due_date",
        "vendor_name",
        "total_amount",
        "product_code",
        "description",
        "quantity",
        "rate",
        "amount",
    ])?;

    let header = [
        record.invoice_number.as_str(),
        record.po_number.as_str(),
        record.date.as_str(),
        record.due_date.as_str(),
        record.vendor_name.as_str(),
        record.total_amount.as_str(),
    ];

    if record.line_items.is_empty() {
        wtr.write_record(header.iter().copied().chain(["", "", "", "", ""]))?;
    }
    for item in &record.line_items {
        wtr.write_record(header.iter().copied().chain([
            item.product_code.as_str(),
            item.description.as_str(),
            item.quantity.as_str(),
            item.rate.as_str(),
            item.amount.as_str(),
        ]))?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &InvoiceRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", record.invoice_number));
    output.push_str(&format!("PO: {}\n", record.po_number));
    output.push_str(&format!("Date: {}\n", record.date));
    output.push_str(&format!("Due: {}\n", record.due_date));
    output.push_str(&format!("Customer: {}\n", record.vendor_name));
    output.push('\n');

    if record.line_items.is_empty() {
        output.push_str("No line items\n");
    } else {
        output.push_str("Items:\n");
        for item in &record.line_items {
            output.push_str(&format!(
                "  {}  {}  x{} @ {} = {}\n",
                item.product_code, item.description, item.quantity, item.rate, item.amount
            ));
        }
    }
    output.push('\n');

    output.push_str(&format!("Total: {}\n", record.total_amount));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::models::invoice::LineItem;
    use pretty_assertions::assert_eq;

    fn record() -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "1042".to_string(),
            vendor_name: "Orbital Systems, Inc.".to_string(),
            total_amount: "$4,250.00".to_string(),
            line_items: vec![LineItem {
                product_code: "AT-2210".to_string(),
                description: "Harness, shielded".to_string(),
                quantity: "1000".to_string(),
                rate: "4.25".to_string(),
                amount: "4,250.00".to_string(),
            }],
            ..InvoiceRecord::default()
        }
    }

    #[test]
    fn test_csv_one_row_per_item() {
        let csv = format_csv(&record()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1042,,,,\"Orbital Systems, Inc.\",\"$4,250.00\",AT-2210"));
    }

    #[test]
    fn test_csv_without_items() {
        let csv = format_csv(&InvoiceRecord::default()).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert_eq!(csv.lines().nth(1), Some(",,,,,,,,,,"));
    }

    #[test]
    fn test_text_summary() {
        let text = format_text(&record());
        assert!(text.contains("Invoice: 1042"));
        assert!(text.contains("AT-2210  Harness, shielded  x1000 @ 4.25 = 4,250.00"));
        assert!(text.ends_with("Total: $4,250.00\n"));
    }
}

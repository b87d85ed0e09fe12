use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use trafficcmp_core::config::{AnalysisOptions, Config};
use trafficcmp_core::loader::HeaderSkip;
use trafficcmp_core::{run_analysis, AnalysisReport, Dimension};
use trafficcmp_report::{render_charts, render_console_report, write_pdf_report, PdfError};

const DEFAULT_PDF: &str = "Traffic_Comparison_Report.pdf";

#[derive(Parser)]
#[command(name = "trafficcmp")]
#[command(author, version, about = "Compare website traffic between two analytics exports")]
struct Cli {
    /// CSV export for the older period
    file1: PathBuf,

    /// CSV export for the newer period
    file2: PathBuf,

    #[arg(short, long, help = "PDF report path [default: Traffic_Comparison_Report.pdf]")]
    output: Option<PathBuf>,

    #[arg(short, long, default_value = "channel", value_parser = parse_dimension,
          help = "Dimension to tabulate: channel, page, date or device")]
    dimension: Dimension,

    #[arg(long, help = "Skip exactly this many preamble lines instead of detecting the header")]
    skip_rows: Option<usize>,

    #[arg(long, help = "Day count for the older file when its header has no dates")]
    old_days: Option<u32>,

    #[arg(long, help = "Day count for the newer file when its header has no dates")]
    new_days: Option<u32>,

    #[arg(long, help = "Fail when a file has no usable data rows")]
    strict: bool,

    #[arg(long, help = "Output the full report as JSON")]
    json: bool,

    #[arg(long, help = "Do not write the PDF report")]
    no_pdf: bool,

    #[arg(long, help = "Also write one SVG chart per analysed dimension into this directory")]
    charts_dir: Option<PathBuf>,

    #[arg(long, help = "Verbose logging on stderr")]
    debug: bool,
}

fn parse_dimension(raw: &str) -> Result<Dimension, String> {
    Dimension::parse(raw).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "trafficcmp=debug" } else { "trafficcmp=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let options = analysis_options(&cli, &cfg);

    let report = run_analysis(&cli.file1, &cli.file2, &options).with_context(|| {
        format!(
            "comparing {} with {}",
            cli.file1.display(),
            cli.file2.display()
        )
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_console_report(&report, cli.dimension));
    }

    if let Some(dir) = &cli.charts_dir {
        write_charts(&report, dir)?;
    }

    if !cli.no_pdf {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| cfg.output_dir.join(DEFAULT_PDF));
        match write_pdf_report(&report, cli.dimension, &output) {
            Ok(()) if cli.json => info!(path = %output.display(), "PDF report saved"),
            Ok(()) => println!("\nPDF report saved to {}", output.display()),
            Err(PdfError::Empty(reason)) => {
                warn!(%reason, "PDF report skipped");
                eprintln!("PDF report skipped: {reason}");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("writing {}", output.display()));
            }
        }
    }

    Ok(())
}

/// Environment config first, then command-line flags on top. Every dimension
/// is analysed; only the tabulated one must be present.
fn analysis_options(cli: &Cli, cfg: &Config) -> AnalysisOptions {
    let mut options = cfg.analysis_options();
    if let Some(lines) = cli.skip_rows {
        options.header_skip = HeaderSkip::Lines(lines);
    }
    options.strict |= cli.strict;
    options.old_days_override = cli.old_days;
    options.new_days_override = cli.new_days;
    options.required = vec![cli.dimension];
    options
}

fn write_charts(report: &AnalysisReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for chart in render_charts(report) {
        let path = dir.join(format!("{}.svg", chart.dimension.slug()));
        std::fs::write(&path, chart.svg).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), title = %chart.title, "Chart saved");
    }
    Ok(())
}

use std::path::PathBuf;

use tempfile::TempDir;

use trafficcmp_core::config::AnalysisOptions;
use trafficcmp_core::{run_analysis, AnalysisReport, Dimension};
use trafficcmp_report::{build_pdf_report, render_charts, render_console_report, write_pdf_report};

const HEADER: &str = "Date,Session primary channel group (Default Channel Group),\
Page path and screen class,Device category,Sessions";

fn write(dir: &TempDir, name: &str, start: &str, end: &str, rows: &[&str]) -> PathBuf {
    let mut text = format!("# Start date: {start}\n# End date: {end}\n{HEADER}\n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    let path = dir.path().join(name);
    std::fs::write(&path, text).expect("write fixture");
    path
}

fn sample_report(dir: &TempDir) -> AnalysisReport {
    let old = write(
        dir,
        "old.csv",
        "20240101",
        "20241231",
        &[
            "20240101,Organic Search,/pricing,mobile,4000",
            "20240102,Direct,/,desktop,2000",
            "20240108,Referral,/blog (archive),mobile,700",
            "20240109,Email,/pricing,tablet,300",
            "20240115,Paid Search,/,desktop,200",
            "20240116,Display,/,desktop,100",
        ],
    );
    let new = write(
        dir,
        "new.csv",
        "20250101",
        "20251126",
        &[
            "20250101,Organic Search,/pricing,mobile,2500",
            "20250102,Direct,/,desktop,2100",
            "20250107,Referral,/blog (archive),mobile,400",
            "20250108,Email,/pricing,tablet,350",
            "20250114,Paid Search,/,desktop,90",
        ],
    );
    run_analysis(&old, &new, &AnalysisOptions::default()).expect("analysis")
}

// ============================================================
// PDF
// ============================================================
#[test]
fn pdf_has_chart_and_table_pages() {
    let dir = TempDir::new().expect("tempdir");
    let report = sample_report(&dir);

    let doc = build_pdf_report(&report, Dimension::Channel).expect("pdf");
    assert_eq!(doc.page_count(), 2);

    let text = String::from_utf8(doc.to_bytes().expect("bytes")).expect("ascii");
    assert!(text.starts_with("%PDF-1.4"));
    assert!(text.contains("(Top 5 Channel Traffic Comparison) Tj"));
    assert!(text.contains("(2024 \\(Pro-rated\\)) Tj"));
    // Fifth channel by older sessions is Paid Search; Display is cut.
    assert!(text.contains("(Paid Search) Tj"));
    assert!(!text.contains("(Display) Tj"));
    // Table page uses thousands separators and a percent suffix.
    assert!(text.contains("(2,500) Tj"));
    assert!(text.contains("%) Tj"));
}

#[test]
fn pdf_is_written_to_disk() {
    let dir = TempDir::new().expect("tempdir");
    let report = sample_report(&dir);
    let out = dir.path().join("Traffic_Comparison_Report.pdf");

    write_pdf_report(&report, Dimension::Channel, &out).expect("write");
    let bytes = std::fs::read(&out).expect("read back");
    assert!(bytes.starts_with(b"%PDF"));
}

// ============================================================
// Charts and console
// ============================================================
#[test]
fn one_chart_per_analysed_dimension() {
    let dir = TempDir::new().expect("tempdir");
    let report = sample_report(&dir);

    let charts = render_charts(&report);
    let dims: Vec<Dimension> = charts.iter().map(|c| c.dimension).collect();
    assert_eq!(
        dims,
        vec![Dimension::Channel, Dimension::Page, Dimension::Date, Dimension::Device]
    );
    assert!(charts.iter().all(|c| c.svg.contains("<svg")));
}

#[test]
fn console_report_lists_table_and_conclusions() {
    let dir = TempDir::new().expect("tempdir");
    let report = sample_report(&dir);

    let text = render_console_report(&report, Dimension::Channel);
    assert!(text.contains("TOTAL"));
    assert!(text.contains("Organic Search"));
    assert!(text.contains("Not all channels experienced a traffic drop."));
    assert!(text.contains("- Overall traffic changed by"));
}

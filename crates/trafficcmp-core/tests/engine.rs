//! End-to-end pipeline tests over real files on disk.
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use trafficcmp_core::config::AnalysisOptions;
use trafficcmp_core::insights::NO_INSIGHTS;
use trafficcmp_core::{run_analysis, CoreError, Dimension};

const CHANNEL: &str = "Session primary channel group (Default Channel Group)";

fn export(start: &str, end: &str, header: &str, rows: &[&str]) -> String {
    let mut text = format!(
        "# ----------------------------------------\n\
         # Traffic acquisition\n\
         # Account: Example\n\
         # Property: example.com\n\
         # ----------------------------------------\n\
         #\n\
         # Start date: {start}\n\
         # End date: {end}\n\
         #\n\
         {header}\n"
    );
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).expect("write fixture");
    path
}

fn channel_pair(dir: &TempDir, old_rows: &[&str], new_rows: &[&str]) -> (PathBuf, PathBuf) {
    let header = format!("{CHANNEL},Sessions");
    let old = write(dir, "old.csv", &export("20240101", "20241231", &header, old_rows));
    let new = write(dir, "new.csv", &export("20250101", "20251126", &header, new_rows));
    (old, new)
}

fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

// ============================================================
// Worked example: 366-day year vs 330-day partial year
// ============================================================
#[test]
fn pro_rata_comparison_of_uneven_periods() {
    let dir = TempDir::new().expect("tempdir");
    let (old, new) = channel_pair(
        &dir,
        &["Organic Search,100", "Direct,50"],
        &["Organic Search,80", "Direct,60"],
    );

    let report = run_analysis(&old, &new, &AnalysisOptions::default()).expect("analysis");
    assert_eq!(report.old_period.day_count, 366);
    assert_eq!(report.new_period.day_count, 330);
    assert!(approx(report.pro_rata_factor, 0.9016, 1e-4));

    let channel = report.dimension(Dimension::Channel).expect("channel analysed");
    let organic = channel
        .rows
        .iter()
        .find(|r| r.dimension_value == "Organic Search")
        .expect("organic");
    assert!(approx(organic.sessions_old, 90.16, 0.01));
    assert!(approx(organic.change, -10.16, 0.01));
    assert!(approx(organic.percent_change, -11.27, 0.01));

    let direct = channel
        .rows
        .iter()
        .find(|r| r.dimension_value == "Direct")
        .expect("direct");
    assert!(approx(direct.sessions_old, 45.08, 0.01));
    assert!(approx(direct.change, 14.92, 0.01));
    assert!(approx(direct.percent_change, 33.09, 0.02));

    assert!(approx(channel.totals.sessions_old, 135.25, 0.01));
    assert_eq!(channel.totals.sessions_new, 140.0);
    assert!(approx(channel.totals.percent_change, 3.51, 0.01));

    assert_eq!(
        report.insights[0],
        "Overall traffic changed by 3.52%. The largest driver is the 'Organic Search' channel, \
         which dropped by 11.27%."
    );
}

#[test]
fn grand_total_footer_is_excluded() {
    let dir = TempDir::new().expect("tempdir");
    let (old, new) = channel_pair(
        &dir,
        &["Organic Search,100", "Direct,50", "Grand Total,5000"],
        &["Organic Search,80", "Direct,60", "Grand Total,n/a"],
    );

    let report = run_analysis(&old, &new, &AnalysisOptions::default()).expect("analysis");
    let channel = report.dimension(Dimension::Channel).expect("channel");
    assert_eq!(channel.rows.len(), 2);
    assert!(channel.rows.iter().all(|r| r.dimension_value != "Grand Total"));
    assert_eq!(channel.totals.sessions_new, 140.0);
}

#[test]
fn absent_device_column_skips_only_that_dimension() {
    let dir = TempDir::new().expect("tempdir");
    let (old, new) = channel_pair(&dir, &["Direct,10"], &["Direct,5"]);

    let report = run_analysis(&old, &new, &AnalysisOptions::default()).expect("analysis");
    assert!(report.dimensions.contains_key(&Dimension::Device));
    assert!(report.dimension(Dimension::Device).is_none());
    assert!(report.dimension(Dimension::Channel).is_some());
    assert!(report
        .insights
        .iter()
        .all(|i| !i.starts_with("On a device level")));
}

#[test]
fn unrelated_columns_yield_fallback_insight() {
    let dir = TempDir::new().expect("tempdir");
    let old = write(&dir, "old.csv", "Country,Sessions\nFrance,10\n");
    let new = write(&dir, "new.csv", "Country,Sessions\nFrance,12\n");

    let report = run_analysis(&old, &new, &AnalysisOptions::default()).expect("analysis");
    assert_eq!(report.insights, vec![NO_INSIGHTS.to_string()]);
    assert!(report.verdict.is_none());
    // Both files lack period markers, so both fall back to the same length.
    assert_eq!(report.pro_rata_factor, 1.0);
}

#[test]
fn required_dimension_missing_is_malformed() {
    let dir = TempDir::new().expect("tempdir");
    let old = write(&dir, "old.csv", "Country,Sessions\nFrance,10\n");
    let new = write(&dir, "new.csv", "Country,Sessions\nFrance,12\n");
    let options = AnalysisOptions {
        required: vec![Dimension::Channel],
        ..AnalysisOptions::default()
    };

    let err = run_analysis(&old, &new, &options).expect_err("no channel column");
    assert!(matches!(err, CoreError::MalformedData(_)));
}

#[test]
fn required_dimension_present_allows_others_to_be_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let (old, new) = channel_pair(&dir, &["Direct,10"], &["Direct,5"]);
    let options = AnalysisOptions {
        required: vec![Dimension::Channel],
        ..AnalysisOptions::default()
    };

    let report = run_analysis(&old, &new, &options).expect("analysis");
    assert!(report.dimension(Dimension::Channel).is_some());
    assert!(report.dimension(Dimension::Page).is_none());
    assert_eq!(report.dimensions.len(), Dimension::ALL.len());
}

#[test]
fn missing_input_file_aborts() {
    let dir = TempDir::new().expect("tempdir");
    let (_, new) = channel_pair(&dir, &["Direct,1"], &["Direct,1"]);
    let err = run_analysis(Path::new("/nonexistent/old.csv"), &new, &AnalysisOptions::default())
        .expect_err("missing");
    assert!(matches!(err, CoreError::MissingFile(_)));
}

#[test]
fn day_overrides_replace_fallback_period_lengths() {
    let dir = TempDir::new().expect("tempdir");
    let header = format!("{CHANNEL},Sessions\n");
    let old = write(&dir, "old.csv", &format!("{header}Direct,366\n"));
    let new = write(&dir, "new.csv", &format!("{header}Direct,330\n"));
    let options = AnalysisOptions {
        old_days_override: Some(366),
        new_days_override: Some(330),
        ..AnalysisOptions::default()
    };

    let report = run_analysis(&old, &new, &options).expect("analysis");
    let direct = &report.dimension(Dimension::Channel).expect("channel").rows[0];
    assert!(approx(direct.sessions_old, 330.0, 1e-9));
    assert!(approx(direct.change, 0.0, 1e-9));
}

#[test]
fn all_dimensions_in_one_export() {
    let dir = TempDir::new().expect("tempdir");
    let header = format!("Date,{CHANNEL},Page path and screen class,Device category,Sessions");
    let old = write(
        &dir,
        "old.csv",
        &export(
            "20240101",
            "20240114",
            &header,
            &[
                "20240101,Organic Search,/pricing,mobile,40",
                "20240102,Direct,/,desktop,20",
                "20240108,Organic Search,/blog,mobile,30",
                "20240109,Email,/pricing,tablet,10",
            ],
        ),
    );
    let new = write(
        &dir,
        "new.csv",
        &export(
            "20250101",
            "20250114",
            &header,
            &[
                "20250101,Organic Search,/pricing,mobile,10",
                "20250102,Direct,/,desktop,25",
                "20250107,Organic Search,/blog,mobile,28",
                "20250108,Email,/pricing,tablet,10",
            ],
        ),
    );

    let report = run_analysis(&old, &new, &AnalysisOptions::default()).expect("analysis");
    assert_eq!(report.pro_rata_factor, 1.0);
    assert_eq!(report.analysed().count(), 4);

    let device = report.dimension(Dimension::Device).expect("device");
    assert_eq!(device.shares.len(), 3);

    assert_eq!(report.insights.len(), 4);
    assert!(report.insights[1].contains("'/pricing'"));
    assert_eq!(
        report.insights[2],
        "The most significant weekly drop occurred around January 2025."
    );
    assert!(report.insights[3].contains("'mobile'"));
}

#[test]
fn repeated_runs_are_identical() {
    let dir = TempDir::new().expect("tempdir");
    let (old, new) = channel_pair(
        &dir,
        &["Organic Search,100", "Direct,50", "Email,7"],
        &["Organic Search,80", "Direct,60", "Referral,3"],
    );
    let options = AnalysisOptions::default();

    let first = run_analysis(&old, &new, &options).expect("first");
    let second = run_analysis(&old, &new, &options).expect("second");
    assert_eq!(
        first.dimension(Dimension::Channel).map(|a| a.rows.clone()),
        second.dimension(Dimension::Channel).map(|a| a.rows.clone())
    );
    assert_eq!(first.insights, second.insights);
}

//! Renderers for comparison reports: console table, SVG charts and PDF.

pub mod charts;
pub mod format;
pub mod pdf;
pub mod pdf_report;
pub mod table;

pub use charts::{render_charts, Chart, ChartError};
pub use pdf::PdfError;
pub use pdf_report::{build_pdf_report, write_pdf_report};
pub use table::{comparison_table, render_console_report};

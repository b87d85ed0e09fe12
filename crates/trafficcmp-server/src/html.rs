//! Server-rendered pages. All user-derived text goes through [`escape`].

use trafficcmp_core::AnalysisReport;
use trafficcmp_report::Chart;

const STYLE: &str = "body{font-family:sans-serif;max-width:1100px;margin:2rem auto;color:#222}\
h1{font-size:1.6rem}section{margin:2rem 0}svg{max-width:100%;height:auto}\
.error{background:#fdecea;border:1px solid #f5c2c0;padding:1rem}\
ul.insights li{margin:.4rem 0}label{display:block;margin:.8rem 0}";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

pub fn render_index() -> String {
    page(
        "Traffic Comparison",
        "<h1>Traffic Comparison</h1>\n\
         <p>Upload two analytics CSV exports: the older period first, the newer period second.</p>\n\
         <form action=\"/analyze\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label>Older period <input type=\"file\" name=\"file1\" accept=\".csv\" required></label>\n\
         <label>Newer period <input type=\"file\" name=\"file2\" accept=\".csv\" required></label>\n\
         <button type=\"submit\">Compare</button>\n\
         </form>",
    )
}

/// Insight list followed by each chart's inline SVG.
pub fn render_results(report: &AnalysisReport, charts: &[Chart]) -> String {
    let mut body = String::from("<h1>Traffic Comparison Results</h1>\n");
    body.push_str(&format!(
        "<p>Older period: {} days. Newer period: {} days. Pro-rata factor: {:.4}.</p>\n",
        report.old_period.day_count, report.new_period.day_count, report.pro_rata_factor
    ));

    body.push_str("<section>\n<h2>Insights</h2>\n<ul class=\"insights\">\n");
    for insight in &report.insights {
        body.push_str(&format!("<li>{}</li>\n", escape(insight.trim_end())));
    }
    body.push_str("</ul>\n</section>\n");

    for chart in charts {
        body.push_str(&format!(
            "<section id=\"chart-{}\">\n<h2>{}</h2>\n{}\n</section>\n",
            chart.dimension.slug(),
            escape(&chart.title),
            chart.svg
        ));
    }
    body.push_str("<p><a href=\"/\">Compare other files</a></p>");
    page("Traffic Comparison Results", &body)
}

pub fn render_error(message: &str) -> String {
    page(
        "Traffic Comparison Error",
        &format!(
            "<h1>Traffic Comparison</h1>\n<p class=\"error\">{}</p>\n\
             <p><a href=\"/\">Back to upload</a></p>",
            escape(message)
        ),
    )
}

//! Minimal PDF 1.4 writer: filled/stroked rectangles, lines and Helvetica
//! text on landscape A4 pages. Enough for a chart page and a table page.

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to write PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to render: {0}")]
    Empty(String),
}

/// Landscape A4 in points.
pub const PAGE_WIDTH: f64 = 842.0;
pub const PAGE_HEIGHT: f64 = 595.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    fn components(self) -> (f64, f64, f64) {
        (
            f64::from(self.0) / 255.0,
            f64::from(self.1) / 255.0,
            f64::from(self.2) / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Approximate Helvetica advance width; good enough for centring labels.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.28,
            'f' | 't' | 'r' | ' ' | '/' | '(' | ')' | '-' => 0.35,
            'm' | 'w' | 'M' | 'W' | '%' => 0.85,
            c if c.is_ascii_uppercase() => 0.68,
            c if c.is_ascii_digit() => 0.556,
            _ => 0.53,
        })
        .sum::<f64>()
        * size
}

/// Content stream for one page. Coordinates are PDF user space (origin bottom-left).
#[derive(Debug)]
pub struct Page {
    ops: String,
    text_color: Rgb,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            ops: String::new(),
            text_color: Rgb::BLACK,
        }
    }
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        let (r, g, b) = color.components();
        let _ = writeln!(
            self.ops,
            "{r:.3} {g:.3} {b:.3} rg {x:.2} {y:.2} {w:.2} {h:.2} re f"
        );
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, width: f64, color: Rgb) {
        let (r, g, b) = color.components();
        let _ = writeln!(
            self.ops,
            "{width:.2} w {r:.3} {g:.3} {b:.3} RG {x:.2} {y:.2} {w:.2} {h:.2} re S"
        );
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgb) {
        let (r, g, b) = color.components();
        let _ = writeln!(
            self.ops,
            "{width:.2} w {r:.3} {g:.3} {b:.3} RG {:.2} {:.2} m {:.2} {:.2} l S",
            from.0, from.1, to.0, to.1
        );
    }

    pub fn text(&mut self, x: f64, y: f64, size: f64, font: Font, text: &str) {
        self.text_rotated(x, y, size, font, 0.0, text);
    }

    pub fn text_centered(&mut self, cx: f64, y: f64, size: f64, font: Font, text: &str) {
        self.text(cx - text_width(text, size) / 2.0, y, size, font, text);
    }

    pub fn text_right(&mut self, right: f64, y: f64, size: f64, font: Font, text: &str) {
        self.text(right - text_width(text, size), y, size, font, text);
    }

    /// Text whose baseline starts at (x, y) and is rotated counter-clockwise by `degrees`.
    pub fn text_rotated(&mut self, x: f64, y: f64, size: f64, font: Font, degrees: f64, text: &str) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (r, g, b) = self.text_color.components();
        let _ = writeln!(
            self.ops,
            "{r:.3} {g:.3} {b:.3} rg BT /{} {size:.1} Tf {cos:.4} {sin:.4} {:.4} {cos:.4} {x:.2} {y:.2} Tm ({}) Tj ET",
            font.resource(),
            -sin,
            escape_text(text)
        );
    }
}

/// Escapes PDF string delimiters. Latin-1 letters become octal escapes, which
/// `WinAnsiEncoding` maps to the same glyphs; anything else becomes `?`.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(escaped, "\\{:03o}", u32::from(c));
            }
            _ => escaped.push('?'),
        }
    }
    escaped
}

#[derive(Debug)]
pub struct Document {
    title: String,
    pages: Vec<Page>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: Vec::new(),
        }
    }

    pub fn push_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serializes the document.
    ///
    /// Object layout: 1 catalog, 2 page tree, 3-4 fonts, 5 info, then a
    /// page object and its content stream for each page.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PdfError> {
        if self.pages.is_empty() {
            return Err(PdfError::Empty("document has no pages".to_string()));
        }

        let first_page_obj = 6;
        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", first_page_obj + i * 2))
            .collect();

        let mut objects: Vec<String> = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.pages.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!(
                "<< /Title ({}) /Producer (trafficcmp) >>",
                escape_text(&self.title)
            ),
        ];
        for (i, page) in self.pages.iter().enumerate() {
            let content_obj = first_page_obj + i * 2 + 1;
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_obj} 0 R >>"
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}endstream",
                page.ops.len(),
                page.ops
            ));
        }

        let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in &offsets {
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        );
        out.extend_from_slice(xref.as_bytes());
        Ok(out)
    }

    pub fn save(&self, path: &Path) -> Result<(), PdfError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

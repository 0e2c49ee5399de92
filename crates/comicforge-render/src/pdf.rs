//! Minimal PDF 1.4 document writer.
//!
//! Supports centered Helvetica text lines and full-page JPEG images, which
//! is all a comic export needs.

/// A4 page size in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;

/// Average Helvetica glyph width as a fraction of the font size.
const HELVETICA_AVG_WIDTH: f32 = 0.5;

/// One line of centered text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
    /// Baseline, measured from the bottom of the page.
    pub baseline: f32,
}

/// Builds a PDF document page by page.
pub struct PdfWriter {
    width: f32,
    height: f32,
    /// Object bodies; object number is index + 1.
    objects: Vec<Vec<u8>>,
    pages: Vec<usize>,
}

impl PdfWriter {
    pub fn new(width: f32, height: f32) -> Self {
        let font = b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
            /Encoding /WinAnsiEncoding >>"
            .to_vec();
        Self {
            width,
            height,
            objects: vec![Vec::new(), Vec::new(), font],
            pages: Vec::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add a page of horizontally centered text lines.
    pub fn add_text_page(&mut self, lines: &[TextLine]) {
        let mut content = String::new();
        for line in lines {
            let text = pdf_string(&line.text);
            let estimated = line.text.chars().count() as f32 * line.font_size * HELVETICA_AVG_WIDTH;
            let x = ((self.width - estimated) / 2.0).max(0.0);
            content.push_str(&format!(
                "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
                fmt(line.font_size),
                fmt(x),
                fmt(line.baseline),
                text
            ));
        }
        self.push_page(content.as_bytes(), None);
    }

    /// Add a page showing a JPEG image scaled to fit inside the margins,
    /// preserving its aspect ratio and centered.
    pub fn add_jpeg_page(&mut self, jpeg: &[u8], pixel_width: u32, pixel_height: u32, margin: f32) {
        let image_id = self.push_stream(
            &format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                pixel_width, pixel_height
            ),
            jpeg,
        );

        let (x, y, w, h) = fit_rect(
            pixel_width as f32,
            pixel_height as f32,
            self.width,
            self.height,
            margin,
        );
        let content = format!("q {} 0 0 {} {} {} cm /Im1 Do Q\n", fmt(w), fmt(h), fmt(x), fmt(y));
        self.push_page(content.as_bytes(), Some(image_id));
    }

    /// Serialize the document.
    pub fn finish(mut self) -> Vec<u8> {
        let kids: Vec<String> = self.pages.iter().map(|id| format!("{} 0 R", id)).collect();
        self.objects[CATALOG_ID - 1] =
            format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID).into_bytes();
        self.objects[PAGES_ID - 1] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            self.pages.len()
        )
        .into_bytes();

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (index, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", self.objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                self.objects.len() + 1,
                CATALOG_ID,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }

    fn push_object(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn push_stream(&mut self, dict: &str, data: &[u8]) -> usize {
        let mut body = format!("<< {} /Length {} >>\nstream\n", dict, data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.push_object(body)
    }

    fn push_page(&mut self, content: &[u8], image: Option<usize>) {
        let content_id = self.push_stream("", content);
        let xobjects = image
            .map(|id| format!(" /XObject << /Im1 {} 0 R >>", id))
            .unwrap_or_default();
        let page = format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 {} 0 R >>{} >> /Contents {} 0 R >>",
            PAGES_ID,
            fmt(self.width),
            fmt(self.height),
            FONT_ID,
            xobjects,
            content_id
        );
        let page_id = self.push_object(page.into_bytes());
        self.pages.push(page_id);
    }
}

/// Largest rectangle with the image's aspect ratio inside the page margins,
/// centered. Returns `(x, y, width, height)` in points.
pub fn fit_rect(
    image_w: f32,
    image_h: f32,
    page_w: f32,
    page_h: f32,
    margin: f32,
) -> (f32, f32, f32, f32) {
    let box_w = (page_w - 2.0 * margin).max(1.0);
    let box_h = (page_h - 2.0 * margin).max(1.0);
    let scale = (box_w / image_w.max(1.0)).min(box_h / image_h.max(1.0));
    let w = image_w * scale;
    let h = image_h * scale;
    ((page_w - w) / 2.0, (page_h - h) / 2.0, w, h)
}

/// Escape text for a PDF literal string. Characters outside printable
/// ASCII are replaced.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn fmt(value: f32) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_empty_document_structure() {
        let bytes = PdfWriter::a4().finish();
        let s = text(&bytes);
        assert!(s.starts_with("%PDF-1.4"));
        assert!(s.trim_end().ends_with("%%EOF"));
        assert!(s.contains("/Count 0"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut writer = PdfWriter::a4();
        writer.add_text_page(&[TextLine {
            text: "Demo".to_string(),
            font_size: 28.0,
            baseline: 500.0,
        }]);
        writer.add_jpeg_page(&[0xFF, 0xD8, 0xFF, 0xD9], 100, 50, 36.0);
        assert_eq!(writer.page_count(), 2);
        let bytes = writer.finish();

        let marker = b"startxref\n";
        let marker_at = bytes.windows(marker.len()).rposition(|w| w == marker).unwrap();
        let startxref = marker_at + marker.len();
        let tail = std::str::from_utf8(&bytes[startxref..]).unwrap();
        let xref_offset: usize = tail.lines().next().unwrap().parse().unwrap();
        let xref = std::str::from_utf8(&bytes[xref_offset..]).unwrap();
        assert!(xref.starts_with("xref"));

        let entries: Vec<&str> = xref
            .lines()
            .skip(3)
            .take_while(|l| !l.starts_with("trailer"))
            .collect();
        assert_eq!(entries.len(), 8);
        for (index, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(bytes[offset..].starts_with(format!("{} 0 obj", index + 1).as_bytes()));
        }
        let s = text(&bytes);
        assert!(s.contains("/Count 2"));
        assert!(s.contains("/Filter /DCTDecode"));
    }

    #[test]
    fn test_fit_rect_preserves_aspect() {
        let (x, y, w, h) = fit_rect(200.0, 100.0, 600.0, 800.0, 50.0);
        assert!((w - 500.0).abs() < 0.01);
        assert!((h - 250.0).abs() < 0.01);
        assert!((x - 50.0).abs() < 0.01);
        assert!((y - 275.0).abs() < 0.01);

        let (_, _, w, h) = fit_rect(100.0, 400.0, 600.0, 800.0, 50.0);
        assert!((h - 700.0).abs() < 0.01);
        assert!((w - 175.0).abs() < 0.01);
    }

    #[test]
    fn test_pdf_string_escaping() {
        assert_eq!(pdf_string("a (b) \\c"), "a \\(b\\) \\\\c");
        assert_eq!(pdf_string("café"), "caf?");
    }
}

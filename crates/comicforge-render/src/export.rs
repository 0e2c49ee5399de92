//! PNG and PDF export.

use crate::cache::ImageCache;
use crate::pdf::{A4_HEIGHT, PdfWriter, TextLine};
use crate::raster::{GridRasterizer, PageRasterizer, RenderError};
use comicforge_core::model::{ComicSettings, ComicState};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Margin around page images in the PDF, in points.
pub const PDF_MARGIN: f32 = 36.0;

const JPEG_QUALITY: u8 = 90;

/// Export errors. Any failure produces no artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: the comic has no pages")]
    NoPages,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// A finished export, ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its file name.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Produces PNG and PDF artifacts from rendered pages.
pub struct Exporter<R: PageRasterizer = GridRasterizer> {
    rasterizer: R,
}

impl Default for Exporter<GridRasterizer> {
    fn default() -> Self {
        Self::new(GridRasterizer::default())
    }
}

impl<R: PageRasterizer> Exporter<R> {
    pub fn new(rasterizer: R) -> Self {
        Self { rasterizer }
    }

    /// Encode one rendered page as `{title}.png` (`comic.png` when untitled).
    pub fn export_png(
        &self,
        title: &str,
        raster: &RgbaImage,
    ) -> Result<ExportArtifact, ExportError> {
        let bytes = encode_png(raster.as_raw(), raster.width(), raster.height())?;
        log::info!("Exported page as PNG ({} bytes)", bytes.len());
        Ok(ExportArtifact {
            file_name: format!("{}.png", file_stem(title)),
            mime_type: "image/png",
            bytes,
        })
    }

    /// Build an A4 document: a cover page, then one page per raster.
    pub fn export_pdf(
        &self,
        settings: &ComicSettings,
        rasters: &[RgbaImage],
    ) -> Result<ExportArtifact, ExportError> {
        if rasters.is_empty() {
            return Err(ExportError::NoPages);
        }

        let mut writer = PdfWriter::a4();
        writer.add_text_page(&cover_lines(settings));
        for raster in rasters {
            let jpeg = encode_jpeg(raster)?;
            writer.add_jpeg_page(&jpeg, raster.width(), raster.height(), PDF_MARGIN);
        }
        let bytes = writer.finish();

        log::info!("Exported {} pages as PDF ({} bytes)", rasters.len(), bytes.len());
        Ok(ExportArtifact {
            file_name: format!("{}.pdf", file_stem(&settings.title)),
            mime_type: "application/pdf",
            bytes,
        })
    }

    /// Render and export the current page as PNG.
    pub fn export_current_page(
        &self,
        state: &ComicState,
        images: &mut ImageCache,
    ) -> Result<ExportArtifact, ExportError> {
        let page = state.current().ok_or(ExportError::NoPages)?;
        let raster = self.rasterizer.rasterize(page, images)?;
        self.export_png(&state.settings.title, &raster)
    }

    /// Render every page and export the comic as PDF.
    pub fn export_comic(
        &self,
        state: &ComicState,
        images: &mut ImageCache,
    ) -> Result<ExportArtifact, ExportError> {
        let rasters = state
            .pages
            .iter()
            .map(|page| self.rasterizer.rasterize(page, images))
            .collect::<Result<Vec<_>, _>>()?;
        self.export_pdf(&state.settings, &rasters)
    }
}

fn cover_lines(settings: &ComicSettings) -> Vec<TextLine> {
    let title = settings.title.trim();
    let mut lines = vec![TextLine {
        text: if title.is_empty() { "Untitled".to_string() } else { title.to_string() },
        font_size: 32.0,
        baseline: A4_HEIGHT * 0.6,
    }];
    if let Some(author) = settings.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        lines.push(TextLine {
            text: format!("by {}", author),
            font_size: 18.0,
            baseline: A4_HEIGHT * 0.6 - 40.0,
        });
    }
    lines
}

fn file_stem(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return "comic".to_string();
    }
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Encode RGBA pixel data as PNG.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encode(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| ExportError::Encode(format!("PNG data: {}", e)))?;
    }
    Ok(png_data)
}

fn encode_jpeg(raster: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let rgb = DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| ExportError::Encode(format!("JPEG: {}", e)))?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comicforge_core::model::{ComicPage, Panel};
    use image::Rgba;

    fn raster() -> RgbaImage {
        RgbaImage::from_pixel(20, 30, Rgba([10, 20, 30, 255]))
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_export_png() {
        let artifact = Exporter::default().export_png("My Comic", &raster()).unwrap();
        assert_eq!(artifact.file_name, "My Comic.png");
        assert_eq!(artifact.mime_type, "image/png");

        let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (20, 30));
        assert_eq!(decoded.get_pixel(5, 5), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_untitled_file_names() {
        let exporter = Exporter::default();
        assert_eq!(exporter.export_png("  ", &raster()).unwrap().file_name, "comic.png");
        assert_eq!(exporter.export_png("a/b", &raster()).unwrap().file_name, "a_b.png");
    }

    #[test]
    fn test_export_pdf_with_cover_and_author() {
        let mut settings = ComicSettings::new("Heist");
        settings.set_author("Jo");
        let artifact = Exporter::default()
            .export_pdf(&settings, &[raster(), raster()])
            .unwrap();

        assert_eq!(artifact.file_name, "Heist.pdf");
        assert_eq!(artifact.mime_type, "application/pdf");
        assert!(artifact.bytes.starts_with(b"%PDF-1.4"));
        assert!(contains(&artifact.bytes, "/Count 3"));
        assert!(contains(&artifact.bytes, "(Heist) Tj"));
        assert!(contains(&artifact.bytes, "(by Jo) Tj"));
    }

    #[test]
    fn test_export_pdf_without_author() {
        let settings = ComicSettings::new("Heist");
        let artifact = Exporter::default().export_pdf(&settings, &[raster()]).unwrap();
        assert!(!contains(&artifact.bytes, "(by "));
        assert!(contains(&artifact.bytes, "/Count 2"));
    }

    #[test]
    fn test_export_pdf_requires_pages() {
        let result = Exporter::default().export_pdf(&ComicSettings::new("Empty"), &[]);
        assert!(matches!(result, Err(ExportError::NoPages)));
    }

    #[test]
    fn test_export_from_state() {
        let mut state = ComicState::new(ComicSettings::new("Demo"));
        let mut images = ImageCache::new();
        assert!(matches!(
            Exporter::default().export_current_page(&state, &mut images),
            Err(ExportError::NoPages)
        ));

        state.pages.push(ComicPage::new(vec![Panel::with_text("Sky", "Hi", vec![])]));
        state.pages.push(ComicPage::new(vec![Panel::new(vec![])]));

        let png = Exporter::default().export_current_page(&state, &mut images).unwrap();
        assert_eq!(png.file_name, "Demo.png");

        let pdf = Exporter::default().export_comic(&state, &mut images).unwrap();
        assert!(contains(&pdf.bytes, "/Count 3"));
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Exporter::default().export_png("Demo", &raster()).unwrap();
        let path = artifact.write_to(&dir.path().join("out")).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), artifact.bytes);
    }
}

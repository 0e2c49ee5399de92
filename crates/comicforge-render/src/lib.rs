//! ComicForge Render Library
//!
//! Page rasterization and export of comics to PNG and PDF.

pub mod cache;
pub mod export;
pub mod pdf;
mod raster;

pub use cache::ImageCache;
pub use export::{ExportArtifact, ExportError, Exporter, encode_png};
pub use raster::{
    Frame, GridRasterizer, PLACEHOLDER_FILL, PageRasterizer, RenderError, RenderResult,
    dialogue_frame, parse_color, wrap_text,
};

//! Page rasterization.

use crate::cache::ImageCache;
use comicforge_core::model::{ComicPage, DialogueStyle, Panel};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Render errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Image decode failed: {0}")]
    Decode(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Turns a comic page into a bitmap.
pub trait PageRasterizer {
    fn rasterize(&self, page: &ComicPage, images: &mut ImageCache) -> RenderResult<RgbaImage>;
}

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Fill for panels without artwork.
pub const PLACEHOLDER_FILL: Rgba<u8> = Rgba([229, 231, 235, 255]);

/// Lays panels out in a fixed-column grid of square frames.
#[derive(Debug, Clone)]
pub struct GridRasterizer {
    pub page_width: u32,
    pub columns: u32,
    pub margin: u32,
    pub gutter: u32,
    pub border: u32,
}

impl Default for GridRasterizer {
    fn default() -> Self {
        Self {
            page_width: 1200,
            columns: 2,
            margin: 40,
            gutter: 20,
            border: 3,
        }
    }
}

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GridRasterizer {
    fn panel_size(&self) -> u32 {
        let columns = self.columns.max(1);
        let inner = self
            .page_width
            .saturating_sub(2 * self.margin + (columns - 1) * self.gutter);
        (inner / columns).max(1)
    }

    /// Frame of every panel slot, plus the total page height.
    pub fn layout(&self, panel_count: usize) -> (Vec<Frame>, u32) {
        let columns = self.columns.max(1);
        let size = self.panel_size();
        let rows = (panel_count as u32).div_ceil(columns).max(1);
        let height = 2 * self.margin + rows * size + (rows - 1) * self.gutter;

        let frames = (0..panel_count as u32)
            .map(|i| Frame {
                x: self.margin + (i % columns) * (size + self.gutter),
                y: self.margin + (i / columns) * (size + self.gutter),
                width: size,
                height: size,
            })
            .collect();
        (frames, height)
    }

    fn draw_panel(
        &self,
        canvas: &mut RgbaImage,
        frame: Frame,
        panel: &Panel,
        images: &mut ImageCache,
    ) {
        let artwork = panel
            .generated_image
            .as_deref()
            .and_then(|reference| images.resolve(reference));

        match artwork {
            Some(art) => {
                let scaled = imageops::resize(art, frame.width, frame.height, FilterType::Triangle);
                imageops::overlay(canvas, &scaled, frame.x as i64, frame.y as i64);
            }
            None => fill_rect(canvas, frame, PLACEHOLDER_FILL, 1.0),
        }

        stroke_rect(canvas, frame, BLACK, self.border);

        if !panel.dialogue.trim().is_empty() {
            draw_dialogue_box(canvas, frame, panel);
        }
    }
}

impl PageRasterizer for GridRasterizer {
    fn rasterize(&self, page: &ComicPage, images: &mut ImageCache) -> RenderResult<RgbaImage> {
        let (frames, height) = self.layout(page.panels.len());
        if self.page_width == 0 || height == 0 {
            return Err(RenderError::RenderFailed("empty page size".to_string()));
        }

        let mut canvas = RgbaImage::from_pixel(self.page_width, height, WHITE);
        for (panel, frame) in page.panels.iter().zip(frames) {
            self.draw_panel(&mut canvas, frame, panel, images);
        }
        log::debug!(
            "Rasterized page {} ({} panels, {}x{})",
            page.id,
            page.panels.len(),
            self.page_width,
            height
        );
        Ok(canvas)
    }
}

/// Unscaled bitmap glyph cell, in pixels.
const GLYPH_SIZE: u32 = 8;

/// Pixel metrics for dialogue text at a given font size.
#[derive(Debug, Clone, Copy)]
struct TextMetrics {
    scale: u32,
    advance: u32,
    line_height: u32,
    padding: u32,
}

impl TextMetrics {
    fn for_size(font_size: u32) -> Self {
        let scale = (font_size / GLYPH_SIZE).max(1);
        let advance = GLYPH_SIZE * scale;
        Self {
            scale,
            advance,
            line_height: advance + 2 * scale,
            padding: advance / 2,
        }
    }
}

/// Frame of the dialogue box for a panel drawn into `frame`.
///
/// The box starts at the panel's dialogue position (percentages of the
/// frame) and is sized to the wrapped text; it never leaves the frame.
pub fn dialogue_frame(frame: Frame, panel: &Panel, style: &DialogueStyle) -> Frame {
    dialogue_layout(frame, panel, style).0
}

fn dialogue_layout(frame: Frame, panel: &Panel, style: &DialogueStyle) -> (Frame, Vec<String>) {
    let position = panel.resolved_position();
    let x = frame.x + (frame.width as f64 * position.x.clamp(0.0, 100.0) / 100.0) as u32;
    let y = frame.y + (frame.height as f64 * position.y.clamp(0.0, 100.0) / 100.0) as u32;
    let available_w = (frame.x + frame.width).saturating_sub(x);
    let available_h = (frame.y + frame.height).saturating_sub(y);

    let metrics = TextMetrics::for_size(style.font_size);
    let max_width = ((frame.width as f64 * 0.8) as u32).min(available_w);
    let max_chars = (max_width.saturating_sub(2 * metrics.padding) / metrics.advance).max(1);
    let lines = wrap_text(&panel.dialogue, max_chars as usize);

    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
    let width = (longest * metrics.advance + 2 * metrics.padding).min(max_width);
    let text_height = lines.len().max(1) as u32 * metrics.line_height;
    let height = (text_height + 2 * metrics.padding).min(available_h);
    (Frame { x, y, width, height }, lines)
}

/// Greedy word wrap to at most `max_chars` characters per line.
///
/// Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            if line_len > 0 && line_len + 1 + piece.len() > max_chars {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(piece);
            line_len += piece.len();
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn draw_dialogue_box(canvas: &mut RgbaImage, frame: Frame, panel: &Panel) {
    let style = panel.resolved_style();
    let (bubble, lines) = dialogue_layout(frame, panel, &style);
    let background = parse_color(&style.background_color).unwrap_or(WHITE);
    let ink = parse_color(&style.text_color).unwrap_or(BLACK);

    fill_rect(canvas, bubble, background, style.opacity.clamp(0.0, 1.0));
    stroke_rect(canvas, bubble, ink, 1);

    let metrics = TextMetrics::for_size(style.font_size);
    for (row, line) in lines.iter().enumerate() {
        let top = bubble.y + metrics.padding + row as u32 * metrics.line_height;
        for (col, ch) in line.chars().enumerate() {
            let left = bubble.x + metrics.padding + col as u32 * metrics.advance;
            draw_glyph(canvas, bubble, left, top, ch, metrics.scale, ink);
        }
    }
}

/// Draw one scaled bitmap glyph, clipped to `clip`.
fn draw_glyph(
    canvas: &mut RgbaImage,
    clip: Frame,
    left: u32,
    top: u32,
    ch: char,
    scale: u32,
    ink: Rgba<u8>,
) {
    let Some(glyph) = BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
    else {
        return;
    };
    let right = clip.x + clip.width;
    let bottom = clip.y + clip.height;

    for (gy, bits) in glyph.iter().enumerate() {
        for gx in 0..GLYPH_SIZE {
            if bits & (1 << gx) == 0 {
                continue;
            }
            let x = left + gx * scale;
            let y = top + gy as u32 * scale;
            if x + scale > right || y + scale > bottom {
                continue;
            }
            fill_rect(canvas, Frame { x, y, width: scale, height: scale }, ink, 1.0);
        }
    }
}

/// Blend `color` over a rectangle with the given opacity.
fn fill_rect(canvas: &mut RgbaImage, frame: Frame, color: Rgba<u8>, opacity: f64) {
    let x_end = (frame.x + frame.width).min(canvas.width());
    let y_end = (frame.y + frame.height).min(canvas.height());
    for y in frame.y..y_end {
        for x in frame.x..x_end {
            let pixel = canvas.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended = pixel[c] as f64 * (1.0 - opacity) + color[c] as f64 * opacity;
                pixel[c] = blended.round() as u8;
            }
            pixel[3] = 255;
        }
    }
}

fn stroke_rect(canvas: &mut RgbaImage, frame: Frame, color: Rgba<u8>, thickness: u32) {
    let t = thickness.min(frame.width / 2).min(frame.height / 2);
    if t == 0 {
        return;
    }
    let edges = [
        Frame { height: t, ..frame },
        Frame { y: frame.y + frame.height - t, height: t, ..frame },
        Frame { width: t, ..frame },
        Frame { x: frame.x + frame.width - t, width: t, ..frame },
    ];
    for edge in edges {
        fill_rect(canvas, edge, color, 1.0);
    }
}

/// Parse a CSS color string like "#ff0000", "#f00" or a basic color name.
pub fn parse_color(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        let channel = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
        return match hex.len() {
            6 => Some(Rgba([channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, 255])),
            3 => {
                let expand = |v: u8| v * 17;
                Some(Rgba([
                    expand(channel(0, 1)?),
                    expand(channel(1, 1)?),
                    expand(channel(2, 1)?),
                    255,
                ]))
            }
            _ => None,
        };
    }
    let rgb = match s.to_ascii_lowercase().as_str() {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "gray" | "grey" => [128, 128, 128],
        _ => return None,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use comicforge_core::model::Position;

    fn rasterize(page: &ComicPage, cache: &mut ImageCache) -> RgbaImage {
        GridRasterizer::default().rasterize(page, cache).unwrap()
    }

    #[test]
    fn test_layout_two_columns() {
        let grid = GridRasterizer::default();
        let (frames, height) = grid.layout(3);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], Frame { x: 40, y: 40, width: 550, height: 550 });
        assert_eq!(frames[1].x, 40 + 550 + 20);
        assert_eq!(frames[2].y, 40 + 550 + 20);
        assert_eq!(height, 2 * 40 + 2 * 550 + 20);
    }

    #[test]
    fn test_empty_page_is_blank() {
        let page = ComicPage::new(vec![]);
        let raster = rasterize(&page, &mut ImageCache::new());
        assert_eq!(raster.width(), 1200);
        assert!(raster.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_missing_artwork_uses_placeholder() {
        let mut panel = Panel::new(vec![]);
        panel.generated_image = Some("https://img/not-fetched".to_string());
        let page = ComicPage::new(vec![panel]);

        let raster = rasterize(&page, &mut ImageCache::new());
        assert_eq!(raster.get_pixel(300, 300), &PLACEHOLDER_FILL);
        assert_eq!(raster.get_pixel(41, 300), &BLACK);
    }

    #[test]
    fn test_artwork_is_scaled_into_frame() {
        let mut panel = Panel::new(vec![]);
        panel.generated_image = Some("https://img/red".to_string());
        let page = ComicPage::new(vec![panel]);
        let mut cache = ImageCache::new();
        cache.insert_image("https://img/red", RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));

        let raster = rasterize(&page, &mut cache);
        assert_eq!(raster.get_pixel(300, 300), &Rgba([255, 0, 0, 255]));
        // Second column is empty.
        assert_eq!(raster.get_pixel(900, 300), &WHITE);
    }

    #[test]
    fn test_dialogue_box_uses_resolved_style() {
        let mut panel = Panel::with_text("Sky", "Hello there", vec![]);
        panel.dialogue_position = Some(Position::new(50.0, 50.0));
        panel.dialogue_style = Some(DialogueStyle {
            font_size: 20,
            background_color: "#0000ff".to_string(),
            text_color: "#000".to_string(),
            opacity: 1.0,
        });
        let page = ComicPage::new(vec![panel.clone()]);
        let raster = rasterize(&page, &mut ImageCache::new());

        let frame = GridRasterizer::default().layout(1).0[0];
        let bubble = dialogue_frame(frame, &panel, &panel.resolved_style());
        assert_eq!(bubble.x, 40 + 275);
        assert_eq!(bubble.y, 40 + 275);
        assert_eq!(raster.get_pixel(bubble.x + 3, bubble.y + 3), &Rgba([0, 0, 255, 255]));
        assert_eq!(raster.get_pixel(bubble.x, bubble.y + 3), &BLACK);
    }

    #[test]
    fn test_dialogue_box_stays_inside_frame() {
        let dialogue = "A very long line of dialogue that keeps going and going";
        let mut panel = Panel::with_text("", dialogue, vec![]);
        panel.dialogue_position = Some(Position::new(90.0, 95.0));
        let frame = Frame { x: 0, y: 0, width: 200, height: 200 };
        let bubble = dialogue_frame(frame, &panel, &panel.resolved_style());
        assert!(bubble.x + bubble.width <= 200);
        assert!(bubble.y + bubble.height <= 200);
    }

    #[test]
    fn test_translucent_dialogue_blends() {
        let mut panel = Panel::with_text("", "Hi", vec![]);
        panel.dialogue_style = Some(DialogueStyle {
            background_color: "black".to_string(),
            opacity: 0.5,
            ..DialogueStyle::default()
        });
        let page = ComicPage::new(vec![panel.clone()]);
        let raster = rasterize(&page, &mut ImageCache::new());

        let frame = GridRasterizer::default().layout(1).0[0];
        let bubble = dialogue_frame(frame, &panel, &panel.resolved_style());
        let pixel = raster.get_pixel(bubble.x + 3, bubble.y + 3);
        // Placeholder gray blended half way to black.
        assert_eq!(pixel[0], (229.0f64 * 0.5).round() as u8);
    }

    #[test]
    fn test_dialogue_text_is_drawn_in_text_color() {
        let red = Rgba([255, 0, 0, 255]);
        let mut panel = Panel::with_text("", "Hi there", vec![]);
        panel.dialogue_position = Some(Position::new(0.0, 0.0));
        panel.dialogue_style = Some(DialogueStyle {
            text_color: "#ff0000".to_string(),
            opacity: 1.0,
            ..DialogueStyle::default()
        });
        let page = ComicPage::new(vec![panel.clone()]);
        let raster = rasterize(&page, &mut ImageCache::new());

        let frame = GridRasterizer::default().layout(1).0[0];
        let bubble = dialogue_frame(frame, &panel, &panel.resolved_style());
        // Font size 16 draws 8x8 glyphs at 2x, inset by 8px of padding.
        assert_eq!(raster.get_pixel(bubble.x + 8, bubble.y + 8), &red);

        let inner_red = (bubble.y + 1..bubble.y + bubble.height - 1)
            .flat_map(|y| (bubble.x + 1..bubble.x + bubble.width - 1).map(move |x| (x, y)))
            .filter(|&(x, y)| raster.get_pixel(x, y) == &red)
            .count();
        assert!(inner_red > 20);
        // Padding row between outline and text is background.
        assert_eq!(raster.get_pixel(bubble.x + 8, bubble.y + 3), &WHITE);
    }

    #[test]
    fn test_long_dialogue_wraps_to_more_lines() {
        let frame = Frame { x: 0, y: 0, width: 400, height: 400 };
        let short = Panel::with_text("", "Go!", vec![]);
        let dialogue = "We need to reach the station before the storm closes in";
        let long = Panel::with_text("", dialogue, vec![]);
        let short_box = dialogue_frame(frame, &short, &short.resolved_style());
        let long_box = dialogue_frame(frame, &long, &long.resolved_style());
        assert!(long_box.height > short_box.height);
        assert!(long_box.width <= 320);
        assert_eq!(short_box.width, 3 * 16 + 16);
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("  spaced   out ", 20), vec!["spaced out"]);
        assert_eq!(wrap_text("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
        assert!(wrap_text("", 5).is_empty());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8000"), Some(Rgba([255, 128, 0, 255])));
        assert_eq!(parse_color("#fff"), Some(WHITE));
        assert_eq!(parse_color("White"), Some(WHITE));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("rgb(1,2,3)"), None);
    }
}

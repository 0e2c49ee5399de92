//! Decoded panel artwork keyed by image reference.

use crate::{RenderError, RenderResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use comicforge_core::model::ComicPage;
use image::RgbaImage;
use std::collections::HashMap;

/// Cache of decoded images.
///
/// `data:` URLs are decoded on first lookup. Remote references must be
/// fetched by the caller and added with [`ImageCache::insert_bytes`].
#[derive(Default)]
pub struct ImageCache {
    images: HashMap<String, RgbaImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.images.contains_key(reference)
    }

    /// Decode encoded image bytes (PNG, JPEG or WebP) and cache them.
    pub fn insert_bytes(&mut self, reference: impl Into<String>, bytes: &[u8]) -> RenderResult<()> {
        let reference = reference.into();
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| RenderError::Decode(format!("{}: {}", short(&reference), e)))?;
        self.images.insert(reference, decoded.to_rgba8());
        Ok(())
    }

    pub fn insert_image(&mut self, reference: impl Into<String>, image: RgbaImage) {
        self.images.insert(reference.into(), image);
    }

    /// Look up an image, decoding `data:` URLs on first use.
    ///
    /// Returns `None` for uncached remote references and for data that
    /// fails to decode.
    pub fn resolve(&mut self, reference: &str) -> Option<&RgbaImage> {
        if !self.images.contains_key(reference) && is_data_url(reference) {
            let decoded = decode_data_url(reference).and_then(|bytes| {
                image::load_from_memory(&bytes)
                    .map_err(|e| RenderError::Decode(e.to_string()))
            });
            match decoded {
                Ok(image) => {
                    self.images.insert(reference.to_string(), image.to_rgba8());
                }
                Err(e) => {
                    log::warn!("Failed to decode inline image: {}", e);
                    return None;
                }
            }
        }
        self.images.get(reference)
    }

    /// Remote artwork references on `pages` that are not cached yet.
    pub fn missing_remote<'a>(
        &self,
        pages: impl IntoIterator<Item = &'a ComicPage>,
    ) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for page in pages {
            for reference in page.panels.iter().filter_map(|p| p.generated_image.as_deref()) {
                if !is_data_url(reference)
                    && !self.contains(reference)
                    && !missing.iter().any(|m| m == reference)
                {
                    missing.push(reference.to_string());
                }
            }
        }
        missing
    }
}

pub fn is_data_url(reference: &str) -> bool {
    reference.starts_with("data:")
}

/// Decode the payload of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> RenderResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Decode("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Decode("malformed data URL".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(RenderError::Decode("data URL is not base64 encoded".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| RenderError::Decode(e.to_string()))
}

fn short(reference: &str) -> &str {
    match reference.char_indices().nth(48) {
        Some((end, _)) => &reference[..end],
        None => reference,
    }
}

//! Gateway to the external text/image-to-image synthesis service.
//!
//! A panel or character is turned into a single [`GenerationRequest`]; an
//! [`ImageGenerator`] performs the remote call and reports the image
//! reference together with the seed the service actually used.

mod prompt;
mod runware;

pub use prompt::{STYLE_KEYWORDS, character_prompt, panel_prompt};
pub use runware::{DEFAULT_ENDPOINT, DEFAULT_MODEL, RunwareClient, RunwareConfig};

use crate::model::{Character, Panel};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Guidance scale used for every generation call.
pub const CFG_SCALE: f32 = 7.0;

/// Images requested per call.
pub const NUMBER_RESULTS: u32 = 1;

/// Generation errors.
///
/// Every failed call produces exactly one of these; nothing is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No API key configured for the image generation service")]
    MissingApiKey,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Service returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("Service rejected the request: {0}")]
    Rejected(String),
    #[error("Service returned no image")]
    EmptyResponse,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for generation calls.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// One image generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub positive_prompt: String,
    /// Seed to reproduce an earlier result.
    pub seed: Option<u64>,
    pub cfg_scale: f32,
    pub number_results: u32,
    /// Reference image (data URL) to transform instead of generating from text alone.
    pub seed_image: Option<String>,
}

impl GenerationRequest {
    /// Text-only request with the standard parameters.
    pub fn new(positive_prompt: impl Into<String>) -> Self {
        Self {
            positive_prompt: positive_prompt.into(),
            seed: None,
            cfg_scale: CFG_SCALE,
            number_results: NUMBER_RESULTS,
            seed_image: None,
        }
    }

    /// Request for a panel, describing the characters it features.
    pub fn for_panel(panel: &Panel, characters: &[Character]) -> Self {
        Self::new(panel_prompt(panel, characters))
    }

    /// Request for a character portrait.
    ///
    /// Reuses the character's seed, and sends its reference image when it
    /// has one.
    pub fn for_character(character: &Character) -> Self {
        Self {
            seed: character.seed,
            seed_image: character.reference_image.clone(),
            ..Self::new(character_prompt(character))
        }
    }
}

/// A generated image as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// URL or handle of the image.
    pub image_url: String,
    /// Seed the service used.
    pub seed: u64,
}

/// Trait for image generation backends.
pub trait ImageGenerator {
    /// Perform one generation call.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> BoxFuture<'_, GenerationResult<GeneratedImage>>;
}

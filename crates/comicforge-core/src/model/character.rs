//! Comic characters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque character identifier.
pub type CharacterId = String;

/// A character that can appear in panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Unique identifier, fixed at creation.
    pub id: CharacterId,
    pub name: String,
    pub description: String,
    /// Reference artwork as a `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
    /// Reference to the last generated artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image: Option<String>,
    /// Seed reported by the generation service for `generated_image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Character {
    /// Create a character with a fresh identifier.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            reference_image: None,
            generated_image: None,
            seed: None,
        }
    }

    /// Attach reference artwork, encoded as a base64 data URL.
    pub fn with_reference_image(mut self, data: &[u8], mime_type: &str) -> Self {
        use base64::{Engine, engine::general_purpose::STANDARD};

        self.reference_image = Some(format!("data:{};base64,{}", mime_type, STANDARD.encode(data)));
        self
    }

    /// Whether the character has enough input to drive image generation.
    pub fn has_generation_input(&self) -> bool {
        !self.description.trim().is_empty() || self.reference_image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character_has_unique_id() {
        let a = Character::new("Ada", "pilot");
        let b = Character::new("Ada", "pilot");
        assert_ne!(a.id, b.id);
        assert!(a.generated_image.is_none());
        assert!(a.seed.is_none());
    }

    #[test]
    fn test_reference_image_is_data_url() {
        let c = Character::new("Ada", "").with_reference_image(&[1, 2, 3], "image/png");
        assert_eq!(c.reference_image.as_deref(), Some("data:image/png;base64,AQID"));
        assert!(c.has_generation_input());
    }

    #[test]
    fn test_generation_input_requires_description_or_reference() {
        assert!(!Character::new("Ada", "   ").has_generation_input());
        assert!(Character::new("Ada", "pilot").has_generation_input());
    }

    #[test]
    fn test_serializes_camel_case_and_skips_absent_fields() {
        let mut c = Character::new("Ada", "pilot");
        c.generated_image = Some("https://img/1.webp".to_string());
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"generatedImage\""));
        assert!(!json.contains("referenceImage"));
        assert!(!json.contains("seed"));
    }
}

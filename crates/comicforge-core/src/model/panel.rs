//! Comic panels and dialogue styling.

use super::CharacterId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque panel identifier.
pub type PanelId = String;

/// Dialogue font size used when a panel has none.
pub const DEFAULT_DIALOGUE_SIZE: u32 = 16;

/// Dialogue position used when a panel has none (percent of panel size).
pub const DEFAULT_DIALOGUE_POSITION: Position = Position { x: 10.0, y: 10.0 };

/// Position inside a panel, as percentages of its width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visual style of a dialogue box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueStyle {
    pub font_size: u32,
    /// CSS-style color: `#rrggbb`, `#rgb` or a basic color name.
    pub background_color: String,
    pub text_color: String,
    /// Box opacity (0.0 = transparent, 1.0 = opaque).
    pub opacity: f64,
}

impl Default for DialogueStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_DIALOGUE_SIZE,
            background_color: "white".to_string(),
            text_color: "black".to_string(),
            opacity: 0.9,
        }
    }
}

/// One illustrated frame of a comic page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: PanelId,
    pub scene: String,
    pub dialogue: String,
    /// Characters appearing in the panel, in prompt order. Weak references
    /// into the owning project's character set.
    #[serde(default)]
    pub characters: Vec<CharacterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_style: Option<DialogueStyle>,
}

impl Panel {
    /// Create an empty panel featuring the given characters.
    pub fn new(characters: Vec<CharacterId>) -> Self {
        Self::with_text("", "", characters)
    }

    /// Create a panel with scene and dialogue text.
    pub fn with_text(
        scene: impl Into<String>,
        dialogue: impl Into<String>,
        characters: Vec<CharacterId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scene: scene.into(),
            dialogue: dialogue.into(),
            characters,
            generated_image: None,
            dialogue_size: None,
            dialogue_position: None,
            dialogue_style: None,
        }
    }

    /// Fill in any missing dialogue size, position or style with defaults.
    ///
    /// An explicit `dialogue_size` wins over the style's font size so the
    /// two always agree afterwards.
    pub fn resolve_style(&mut self) {
        let mut style = self.dialogue_style.take().unwrap_or_default();
        let size = self.dialogue_size.unwrap_or(style.font_size);
        style.font_size = size;
        self.dialogue_size = Some(size);
        self.dialogue_style = Some(style);
        if self.dialogue_position.is_none() {
            self.dialogue_position = Some(DEFAULT_DIALOGUE_POSITION);
        }
    }

    /// Style with defaults applied, without mutating the panel.
    pub fn resolved_style(&self) -> DialogueStyle {
        let mut resolved = self.clone();
        resolved.resolve_style();
        resolved.dialogue_style.unwrap_or_default()
    }

    /// Position with defaults applied.
    pub fn resolved_position(&self) -> Position {
        self.dialogue_position.unwrap_or(DEFAULT_DIALOGUE_POSITION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_panel_is_empty() {
        let panel = Panel::new(vec!["c1".to_string()]);
        assert!(panel.scene.is_empty());
        assert!(panel.dialogue.is_empty());
        assert_eq!(panel.characters, vec!["c1".to_string()]);
        assert!(panel.generated_image.is_none());
        assert!(panel.dialogue_style.is_none());
    }

    #[test]
    fn test_resolve_style_backfills_defaults() {
        let mut panel = Panel::new(vec![]);
        panel.resolve_style();
        assert_eq!(panel.dialogue_size, Some(16));
        assert_eq!(panel.dialogue_position, Some(Position::new(10.0, 10.0)));
        let style = panel.dialogue_style.unwrap();
        assert_eq!(style.background_color, "white");
        assert_eq!(style.text_color, "black");
        assert_eq!(style.opacity, 0.9);
    }

    #[test]
    fn test_resolve_style_keeps_explicit_values() {
        let mut panel = Panel::new(vec![]);
        panel.dialogue_size = Some(22);
        panel.dialogue_position = Some(Position::new(40.0, 75.0));
        panel.dialogue_style = Some(DialogueStyle {
            font_size: 12,
            background_color: "#ffee00".to_string(),
            text_color: "#111111".to_string(),
            opacity: 0.5,
        });
        panel.resolve_style();
        assert_eq!(panel.dialogue_size, Some(22));
        assert_eq!(panel.dialogue_position, Some(Position::new(40.0, 75.0)));
        let style = panel.dialogue_style.unwrap();
        assert_eq!(style.font_size, 22);
        assert_eq!(style.background_color, "#ffee00");
        assert_eq!(style.opacity, 0.5);
    }

    #[test]
    fn test_resolved_style_does_not_mutate() {
        let panel = Panel::new(vec![]);
        assert_eq!(panel.resolved_style(), DialogueStyle::default());
        assert!(panel.dialogue_style.is_none());
    }
}

//! Placeholder script generation.
//!
//! Produces a fixed two-panel script from a theme, tone and key elements.
//! The panels reference every selected character.

use crate::model::{
    Character, CharacterId, ComicPage, ComicSettings, ComicState, DEFAULT_DIALOGUE_SIZE,
    DEFAULT_TONE, MAX_PANELS_PER_PAGE, MIN_PANELS_PER_PAGE, Panel, Project,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Script generation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Please enter a theme")]
    MissingTheme,
    #[error("Please enter key elements")]
    MissingKeyElements,
    #[error("Please select at least one character")]
    NoCharactersSelected,
}

/// Input to the script generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRequest {
    pub theme: String,
    pub tone: String,
    pub key_elements: String,
    pub selected_characters: Vec<CharacterId>,
}

impl ScriptRequest {
    pub fn new(
        theme: impl Into<String>,
        key_elements: impl Into<String>,
        selected: Vec<CharacterId>,
    ) -> Self {
        Self {
            theme: theme.into(),
            tone: DEFAULT_TONE.to_string(),
            key_elements: key_elements.into(),
            selected_characters: selected,
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if self.theme.trim().is_empty() {
            return Err(ScriptError::MissingTheme);
        }
        if self.key_elements.trim().is_empty() {
            return Err(ScriptError::MissingKeyElements);
        }
        if self.selected_characters.is_empty() {
            return Err(ScriptError::NoCharactersSelected);
        }
        Ok(())
    }
}

/// A generated script: metadata plus panels in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: String,
    pub theme: String,
    pub tone: String,
    pub key_elements: String,
    pub panels: Vec<Panel>,
}

impl Script {
    /// Generate the placeholder script for a request.
    pub fn generate(request: &ScriptRequest) -> Result<Self, ScriptError> {
        request.validate()?;

        let key_elements = request.key_elements.trim();
        let beats = [
            (format!("Opening scene in {}", key_elements), "Character: \"Our story begins...\""),
            (format!("Action sequence in {}", key_elements), "Character: \"We must hurry!\""),
        ];
        let panels = beats
            .into_iter()
            .map(|(scene, dialogue)| {
                let characters = request.selected_characters.clone();
                let mut panel = Panel::with_text(scene, dialogue, characters);
                panel.dialogue_size = Some(DEFAULT_DIALOGUE_SIZE);
                panel
            })
            .collect();

        log::info!("Generated script for theme '{}'", request.theme.trim());
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            theme: request.theme.clone(),
            tone: request.tone.clone(),
            key_elements: request.key_elements.clone(),
            panels,
        })
    }

    /// Split the panels into pages of at most `panels_per_page` (clamped to 1..=6).
    pub fn into_pages(self, panels_per_page: u32) -> Vec<ComicPage> {
        let per_page = panels_per_page.clamp(MIN_PANELS_PER_PAGE, MAX_PANELS_PER_PAGE) as usize;
        self.panels
            .chunks(per_page)
            .map(|chunk| ComicPage::new(chunk.to_vec()))
            .collect()
    }
}

impl Project {
    /// Build a new project around a generated script.
    ///
    /// The project is titled after the comic settings and starts on page 0.
    pub fn from_script(
        settings: ComicSettings,
        script: Script,
        characters: Vec<Character>,
    ) -> Self {
        let settings = settings.normalized();
        let mut project = Project::new(settings.title.clone());
        project.theme = script.theme.clone();
        project.tone = script.tone.clone();
        project.key_elements = script.key_elements.clone();
        project.characters = characters;

        let pages = script.into_pages(settings.panels_per_page);
        project.comic_state = ComicState {
            settings,
            pages,
            current_page: 0,
        };
        project
    }
}

//! Saved units of work.

use super::{Character, CharacterId, ComicSettings, ComicState, PanelId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque project identifier.
pub type ProjectId = String;

/// Default script tone.
pub const DEFAULT_TONE: &str = "adventure";

/// A project: characters, comic state and script metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Snapshot of the characters used by this project.
    #[serde(default)]
    pub characters: Vec<Character>,
    pub comic_state: ComicState,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub key_elements: String,
}

impl Project {
    /// Create an empty project whose comic title matches the project title.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            comic_state: ComicState::new(ComicSettings::new(title.clone())),
            title,
            created_at: now,
            updated_at: now,
            characters: Vec::new(),
            theme: String::new(),
            tone: DEFAULT_TONE.to_string(),
            key_elements: String::new(),
        }
    }

    /// Record a modification.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Panel character references that don't resolve in this project.
    pub fn dangling_character_refs(&self) -> Vec<(PanelId, CharacterId)> {
        self.comic_state
            .panels()
            .flat_map(|panel| {
                panel
                    .characters
                    .iter()
                    .filter(|id| self.character(id).is_none())
                    .map(|id| (panel.id.clone(), id.clone()))
            })
            .collect()
    }

    /// Serialize the project to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a project from JSON, normalizing its comic state.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::normalized)
    }

    /// Copy with out-of-range settings and page index brought into bounds.
    pub fn normalized(mut self) -> Self {
        self.comic_state = self.comic_state.normalized();
        self
    }
}

//! Entity model: characters, panels, pages, settings and projects.
//!
//! Pure data plus default-value construction. Validation is left to callers.

mod character;
mod comic;
mod panel;
mod project;

pub use character::{Character, CharacterId};
pub use comic::{
    ComicPage, ComicSettings, ComicState, MAX_PANELS_PER_PAGE, MAX_TOTAL_PAGES,
    MIN_PANELS_PER_PAGE, MIN_TOTAL_PAGES,
};
pub use panel::{
    DEFAULT_DIALOGUE_POSITION, DEFAULT_DIALOGUE_SIZE, DialogueStyle, Panel, PanelId, Position,
};
pub use project::{DEFAULT_TONE, Project, ProjectId};

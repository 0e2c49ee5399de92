//! ComicForge Core Library
//!
//! Platform-agnostic data model, persistence, panel workflow and image
//! generation gateway for the ComicForge comic studio.

pub mod generation;
pub mod model;
pub mod script;
pub mod storage;
pub mod store;
pub mod workflow;

pub use generation::{
    GeneratedImage, GenerationError, GenerationRequest, GenerationResult, ImageGenerator,
    RunwareClient, RunwareConfig,
};
pub use model::{
    Character, CharacterId, ComicPage, ComicSettings, ComicState, DialogueStyle, Panel, PanelId,
    Position, Project, ProjectId,
};
pub use script::{Script, ScriptError, ScriptRequest};
pub use storage::{BlobStore, MemoryBlobStore, StorageError, StorageResult};
pub use store::{ProjectStore, StoreError, StoreResult};
pub use workflow::{
    PanelWorkflow, RegenerationOutcome, RegenerationStatus, RegenerationTicket, ReorderRequest,
    ReorderTarget, WorkflowError, WorkflowResult, generate_character_image, validate_project,
};

//! Panel workflow: creation, editing, deletion, reordering and regeneration.
//!
//! The script's panel list is the panel list of the comic's current page.
//! Regeneration is split in two steps so results can be applied after the
//! list has been edited: [`PanelWorkflow::begin_regeneration`] marks the
//! panel as in progress and returns a ticket, and
//! [`PanelWorkflow::complete_regeneration`] applies the outcome to whichever
//! position the panel occupies at that time.

use crate::generation::{
    GeneratedImage, GenerationError, GenerationRequest, GenerationResult, ImageGenerator,
};
use crate::model::{Character, CharacterId, ComicPage, ComicState, Panel, PanelId, Project};
use std::collections::HashMap;
use thiserror::Error;

/// Workflow errors.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No page at index {0}")]
    PageOutOfRange(usize),
    #[error("No panel at index {index} (page has {len})")]
    PanelOutOfRange { index: usize, len: usize },
    #[error("Panel {0} is already being regenerated")]
    AlreadyRegenerating(PanelId),
    #[error("Please provide a character name")]
    MissingCharacterName,
    #[error("Please provide either a description or a reference image")]
    MissingCharacterInput,
    #[error("Panel {panel} references unknown character {character}")]
    UnknownCharacter { panel: PanelId, character: CharacterId },
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Regeneration state of a single panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegenerationStatus {
    #[default]
    Idle,
    InProgress,
    /// Last attempt failed. Does not block a new attempt.
    Failed(String),
}

/// Which panel list a reorder applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderTarget {
    /// Panels of the page at this index.
    PreviewPage(usize),
    /// The script panel list (current page).
    ScriptPanels,
}

/// A drag-and-drop move within one panel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderRequest {
    pub target: ReorderTarget,
    pub source: usize,
    /// `None` when the drag was cancelled.
    pub destination: Option<usize>,
}

/// An in-flight regeneration.
#[derive(Debug, Clone)]
pub struct RegenerationTicket {
    panel_id: PanelId,
    request: GenerationRequest,
}

impl RegenerationTicket {
    pub fn panel_id(&self) -> &str {
        &self.panel_id
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

/// What happened to a successful regeneration result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationOutcome {
    /// The image was stored on the panel.
    Applied,
    /// The panel was deleted while the call was in flight; result discarded.
    PanelRemoved,
}

/// Mutates panel lists and tracks per-panel regeneration status.
#[derive(Debug, Default)]
pub struct PanelWorkflow {
    statuses: HashMap<PanelId, RegenerationStatus>,
}

impl PanelWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty panel to the script, creating the first page if needed.
    pub fn add_panel(
        &mut self,
        state: &mut ComicState,
        default_characters: &[CharacterId],
    ) -> PanelId {
        if state.pages.is_empty() {
            state.pages.push(ComicPage::new(Vec::new()));
            state.current_page = 0;
        }
        state.clamp_current_page();

        let panel = Panel::new(default_characters.to_vec());
        let id = panel.id.clone();
        if let Some(page) = state.current_mut() {
            page.panels.push(panel);
        }
        log::debug!("Added panel {}", id);
        id
    }

    /// Replace the script panel at `index`.
    ///
    /// The panel keeps its identifier, and missing dialogue size, position
    /// and style are back-filled with defaults.
    pub fn update_panel(
        &mut self,
        state: &mut ComicState,
        index: usize,
        updated: Panel,
    ) -> WorkflowResult<()> {
        let current = state.current_page;
        let page = state.current_mut().ok_or(WorkflowError::PageOutOfRange(current))?;
        let len = page.panels.len();
        let slot = page
            .panels
            .get_mut(index)
            .ok_or(WorkflowError::PanelOutOfRange { index, len })?;

        let mut updated = updated;
        if updated.id != slot.id {
            log::warn!("Ignoring id change {} -> {} on panel update", slot.id, updated.id);
            updated.id = slot.id.clone();
        }
        // With the size field untouched, a changed style font size is the resize.
        if updated.dialogue_size == slot.dialogue_size {
            if let (Some(before), Some(after)) = (&slot.dialogue_style, &updated.dialogue_style) {
                if before.font_size != after.font_size {
                    updated.dialogue_size = Some(after.font_size);
                }
            }
        }
        updated.resolve_style();
        *slot = updated;
        Ok(())
    }

    /// Remove the script panel at `index` and forget its regeneration status.
    pub fn delete_panel(&mut self, state: &mut ComicState, index: usize) -> WorkflowResult<Panel> {
        let current = state.current_page;
        let page = state.current_mut().ok_or(WorkflowError::PageOutOfRange(current))?;
        let len = page.panels.len();
        if index >= len {
            return Err(WorkflowError::PanelOutOfRange { index, len });
        }
        let removed = page.panels.remove(index);
        if self.statuses.remove(&removed.id) == Some(RegenerationStatus::InProgress) {
            log::debug!("Panel {} deleted while regenerating", removed.id);
        }
        Ok(removed)
    }

    /// Move one panel within a list. Returns whether anything moved.
    pub fn reorder_panels(
        &mut self,
        state: &mut ComicState,
        request: ReorderRequest,
    ) -> WorkflowResult<bool> {
        let Some(destination) = request.destination else {
            return Ok(false);
        };
        let page_index = match request.target {
            ReorderTarget::PreviewPage(index) => index,
            ReorderTarget::ScriptPanels => state.current_page,
        };
        let page = state
            .pages
            .get_mut(page_index)
            .ok_or(WorkflowError::PageOutOfRange(page_index))?;

        let len = page.panels.len();
        for index in [request.source, destination] {
            if index >= len {
                return Err(WorkflowError::PanelOutOfRange { index, len });
            }
        }
        if request.source == destination {
            return Ok(false);
        }

        let panel = page.panels.remove(request.source);
        page.panels.insert(destination, panel);
        Ok(true)
    }

    /// Regeneration status of a panel.
    pub fn status(&self, panel_id: &str) -> RegenerationStatus {
        self.statuses.get(panel_id).cloned().unwrap_or_default()
    }

    pub fn is_regenerating(&self, panel_id: &str) -> bool {
        self.statuses.get(panel_id) == Some(&RegenerationStatus::InProgress)
    }

    /// Number of regenerations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| **s == RegenerationStatus::InProgress)
            .count()
    }

    /// Drop status entries for panels that no longer exist in `state`.
    pub fn retain_known_panels(&mut self, state: &ComicState) {
        let known = state.panel_ids();
        self.statuses.retain(|id, _| known.contains(id));
    }

    /// Mark a panel as regenerating and build its generation request.
    ///
    /// Fails if a regeneration for the same panel is still in flight.
    pub fn begin_regeneration(
        &mut self,
        state: &ComicState,
        characters: &[Character],
        page_index: usize,
        panel_index: usize,
    ) -> WorkflowResult<RegenerationTicket> {
        let page = state
            .pages
            .get(page_index)
            .ok_or(WorkflowError::PageOutOfRange(page_index))?;
        let panel = page.panels.get(panel_index).ok_or(WorkflowError::PanelOutOfRange {
            index: panel_index,
            len: page.panels.len(),
        })?;

        if self.is_regenerating(&panel.id) {
            log::info!("Ignoring regenerate request for panel {}: already in progress", panel.id);
            return Err(WorkflowError::AlreadyRegenerating(panel.id.clone()));
        }

        self.statuses.insert(panel.id.clone(), RegenerationStatus::InProgress);
        log::info!("Regenerating panel {}", panel.id);
        Ok(RegenerationTicket {
            panel_id: panel.id.clone(),
            request: GenerationRequest::for_panel(panel, characters),
        })
    }

    /// Apply the result of a regeneration started with [`begin_regeneration`].
    ///
    /// On success only the panel's `generated_image` changes. On failure the
    /// panel is untouched, its status becomes `Failed`, and the error is
    /// returned for reporting.
    ///
    /// [`begin_regeneration`]: Self::begin_regeneration
    pub fn complete_regeneration(
        &mut self,
        state: &mut ComicState,
        ticket: RegenerationTicket,
        result: GenerationResult<GeneratedImage>,
    ) -> WorkflowResult<RegenerationOutcome> {
        let RegenerationTicket { panel_id, .. } = ticket;
        let panel = state.panel_mut(&panel_id);

        match (result, panel) {
            (Ok(image), Some(panel)) => {
                panel.generated_image = Some(image.image_url);
                self.statuses.remove(&panel_id);
                log::info!("Panel {} regenerated", panel_id);
                Ok(RegenerationOutcome::Applied)
            }
            (Ok(_), None) => {
                self.statuses.remove(&panel_id);
                log::info!("Discarding regenerated image for deleted panel {}", panel_id);
                Ok(RegenerationOutcome::PanelRemoved)
            }
            (Err(e), Some(_)) => {
                log::error!("Failed to regenerate panel {}: {}", panel_id, e);
                self.statuses
                    .insert(panel_id, RegenerationStatus::Failed(e.to_string()));
                Err(e.into())
            }
            (Err(e), None) => {
                self.statuses.remove(&panel_id);
                log::error!("Failed to regenerate deleted panel {}: {}", panel_id, e);
                Err(e.into())
            }
        }
    }

    /// Regenerate one panel of a project: begin, call the gateway, complete.
    pub async fn regenerate_panel<G: ImageGenerator + ?Sized>(
        &mut self,
        project: &mut Project,
        generator: &G,
        page_index: usize,
        panel_index: usize,
    ) -> WorkflowResult<RegenerationOutcome> {
        let ticket = self.begin_regeneration(
            &project.comic_state,
            &project.characters,
            page_index,
            panel_index,
        )?;
        let result = generator.generate(ticket.request()).await;
        let outcome = self.complete_regeneration(&mut project.comic_state, ticket, result)?;
        if outcome == RegenerationOutcome::Applied {
            project.touch();
        }
        Ok(outcome)
    }
}

/// Generate (or regenerate) a character's artwork.
///
/// The character's previous seed is passed along so an unchanged prompt
/// reproduces the same image. Returns the updated character; the input is
/// left as is on failure.
pub async fn generate_character_image<G: ImageGenerator + ?Sized>(
    generator: &G,
    character: &Character,
) -> WorkflowResult<Character> {
    if character.name.trim().is_empty() {
        return Err(WorkflowError::MissingCharacterName);
    }
    if !character.has_generation_input() {
        return Err(WorkflowError::MissingCharacterInput);
    }

    let request = GenerationRequest::for_character(character);
    let image = generator.generate(&request).await.inspect_err(|e| {
        log::error!("Failed to generate character {}: {}", character.name, e);
    })?;

    log::info!("Generated character {} (seed {})", character.name, image.seed);
    Ok(Character {
        generated_image: Some(image.image_url),
        seed: Some(image.seed),
        ..character.clone()
    })
}

/// Check that every panel's character references resolve in the project.
pub fn validate_project(project: &Project) -> WorkflowResult<()> {
    match project.dangling_character_refs().into_iter().next() {
        Some((panel, character)) => Err(WorkflowError::UnknownCharacter { panel, character }),
        None => Ok(()),
    }
}

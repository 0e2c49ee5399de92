//! Command handlers.
//!
//! Each command loads the open project, applies one store, workflow,
//! gateway or export operation and saves the result.

use crate::cli::{
    CharacterCommand, Command, ExportCommand, PageCommand, PanelCommand, PanelEdit, ProjectCommand,
    ScriptCommand, SettingsArgs, SettingsEdit,
};
use crate::config::{AppConfig, ConfigError};
use comicforge_core::generation::{GenerationError, ImageGenerator, RunwareClient};
use comicforge_core::model::{Character, ComicPage, ComicSettings, Panel, Position, Project};
use comicforge_core::script::{Script, ScriptError, ScriptRequest};
use comicforge_core::storage::{BlobStore, StorageError};
use comicforge_core::store::{ProjectStore, StoreError};
use comicforge_core::workflow::{
    self, PanelWorkflow, RegenerationOutcome, ReorderRequest, ReorderTarget, WorkflowError,
};
use comicforge_render::{ExportError, Exporter, ImageCache};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Blob key holding the id of the open project.
pub const CURRENT_KEY: &str = "current";

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No project is open; use `project new` or `project open`")]
    NoProject,
    #[error("Unknown project: {0}")]
    UnknownProject(String),
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),
    #[error("Numbering starts at 1")]
    ZeroIndex,
    #[error("No page {0}")]
    NoSuchPage(usize),
    #[error("Unsupported image type: {0}")]
    UnsupportedImage(String),
}

/// Result type for command handlers.
pub type AppResult<T> = Result<T, AppError>;

/// The application: configuration, project store, panel workflow and
/// image generation backend.
pub struct App<S: BlobStore> {
    config: AppConfig,
    store: ProjectStore<S>,
    workflow: PanelWorkflow,
    generator: Option<Box<dyn ImageGenerator>>,
    http: reqwest::Client,
}

impl<S: BlobStore> App<S> {
    /// Open the store and restore the previously open project.
    pub fn new(config: AppConfig, blobs: Arc<S>) -> Self {
        let mut store = ProjectStore::open(blobs);
        match store.blobs().load(CURRENT_KEY) {
            Ok(id) => match store.project(id.trim()).cloned() {
                Some(project) => store.set_current_project(Some(project)),
                None => log::warn!("Open project {} no longer exists", id.trim()),
            },
            Err(StorageError::NotFound(_)) => {}
            Err(e) => log::warn!("Failed to read open project: {}", e),
        }

        Self {
            config,
            store,
            workflow: PanelWorkflow::new(),
            generator: None,
            http: reqwest::Client::new(),
        }
    }

    /// Use a specific image generator instead of the configured Runware client.
    pub fn with_generator(mut self, generator: Box<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn store(&self) -> &ProjectStore<S> {
        &self.store
    }

    /// Execute one command and return the text to show the user.
    pub async fn run(&mut self, command: Command) -> AppResult<String> {
        match command {
            Command::Project(command) => self.project(command),
            Command::Character(command) => self.character(command).await,
            Command::Script(command) => self.script(command),
            Command::Panel(command) => self.panel(command).await,
            Command::Page(command) => self.page(command),
            Command::Export(command) => self.export(command).await,
        }
    }

    fn project(&mut self, command: ProjectCommand) -> AppResult<String> {
        match command {
            ProjectCommand::New { title, settings } => {
                let mut project = Project::new(title);
                project.comic_state.settings = comic_settings(&project.title, &settings);
                self.store.add_project(project.clone())?;
                let output = format!("Created project {} ({})", project.title, project.id);
                self.open(project)?;
                Ok(output)
            }
            ProjectCommand::List => {
                if self.store.projects().is_empty() {
                    return Ok("No projects yet".to_string());
                }
                let current = self.store.current_project().map(|p| p.id.as_str());
                let lines: Vec<String> = self
                    .store
                    .projects()
                    .iter()
                    .map(|p| {
                        let marker = if Some(p.id.as_str()) == current { "*" } else { " " };
                        format!(
                            "{} {}  {}  ({} pages, updated {})",
                            marker,
                            p.id,
                            p.title,
                            p.comic_state.page_count(),
                            p.updated_at.format("%Y-%m-%d %H:%M")
                        )
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            ProjectCommand::Open { id } => {
                let project = self
                    .store
                    .project(&id)
                    .cloned()
                    .ok_or_else(|| AppError::UnknownProject(id.clone()))?;
                let output = format!("Opened {}", project.title);
                self.open(project)?;
                Ok(output)
            }
            ProjectCommand::Show => Ok(describe(&self.current()?)),
            ProjectCommand::Settings(edit) => {
                let mut project = self.current()?;
                apply_settings(&mut project, edit);
                let output = describe(&project);
                self.save(project)?;
                Ok(output)
            }
            ProjectCommand::Delete { id } => {
                if !self.store.delete_project(&id)? {
                    return Err(AppError::UnknownProject(id));
                }
                let blobs = self.store.blobs();
                if blobs.load(CURRENT_KEY).is_ok_and(|open| open.trim() == id) {
                    blobs.delete(CURRENT_KEY)?;
                }
                Ok(format!("Deleted project {}", id))
            }
        }
    }

    async fn character(&mut self, command: CharacterCommand) -> AppResult<String> {
        match command {
            CharacterCommand::Add { name, description, reference } => {
                let mut character = Character::new(name, description);
                if let Some(path) = reference {
                    let mime = image_mime(&path)?;
                    let bytes = std::fs::read(&path)?;
                    character = character.with_reference_image(&bytes, mime);
                }
                let output = format!("Added character {} ({})", character.name, character.id);
                self.store.add_character(character)?;
                Ok(output)
            }
            CharacterCommand::List => {
                if self.store.characters().is_empty() {
                    return Ok("No characters yet".to_string());
                }
                let lines: Vec<String> = self
                    .store
                    .characters()
                    .iter()
                    .map(|c| {
                        let art = if c.generated_image.is_some() { "generated" } else { "no art" };
                        format!("{}  {}: {} [{}]", c.id, c.name, c.description, art)
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            CharacterCommand::Generate { id } => {
                let character = self
                    .store
                    .character(&id)
                    .cloned()
                    .ok_or_else(|| AppError::UnknownCharacter(id.clone()))?;
                let generator = self.generator()?;
                let updated = workflow::generate_character_image(generator, &character).await?;
                self.store.update_character(updated.clone())?;

                if let Some(mut project) = self.store.current_project().cloned() {
                    let snapshot = project.characters.iter_mut().find(|c| c.id == updated.id);
                    if let Some(snapshot) = snapshot {
                        *snapshot = updated.clone();
                        self.save(project)?;
                    }
                }
                Ok(format!(
                    "Generated {}: {} (seed {})",
                    updated.name,
                    updated.generated_image.as_deref().unwrap_or_default(),
                    updated.seed.unwrap_or_default()
                ))
            }
            CharacterCommand::Delete { id } => {
                if !self.store.delete_character(&id)? {
                    return Err(AppError::UnknownCharacter(id));
                }
                Ok(format!("Deleted character {}", id))
            }
        }
    }

    fn script(&mut self, command: ScriptCommand) -> AppResult<String> {
        let ScriptCommand::Generate {
            title,
            theme,
            tone,
            key_elements,
            characters,
            settings,
        } = command;

        let request = ScriptRequest::new(theme, key_elements, characters).with_tone(tone);
        let script = Script::generate(&request)?;
        let selected = request
            .selected_characters
            .iter()
            .map(|id| {
                self.store
                    .character(id)
                    .cloned()
                    .ok_or_else(|| AppError::UnknownCharacter(id.clone()))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let project = Project::from_script(comic_settings(&title, &settings), script, selected);
        self.store.add_project(project.clone())?;
        let output = format!(
            "Generated script into project {} ({}), {} panels",
            project.title,
            project.id,
            project.comic_state.panels().count()
        );
        self.open(project)?;
        Ok(output)
    }

    async fn panel(&mut self, command: PanelCommand) -> AppResult<String> {
        let mut project = self.current()?;
        let output = match command {
            PanelCommand::Add { characters } => {
                self.attach_characters(&mut project, &characters)?;
                self.workflow.add_panel(&mut project.comic_state, &characters);
                let count = project.comic_state.current().map_or(0, |p| p.panels.len());
                format!("Added panel {} to page {}", count, project.comic_state.current_page + 1)
            }
            PanelCommand::Edit { panel, edit } => {
                let index = to_index(panel)?;
                let state = &project.comic_state;
                let page = state
                    .current()
                    .ok_or(WorkflowError::PageOutOfRange(state.current_page))?;
                let mut updated = page.panels.get(index).cloned().ok_or(
                    WorkflowError::PanelOutOfRange {
                        index,
                        len: page.panels.len(),
                    },
                )?;
                if let Some(characters) = &edit.characters {
                    self.attach_characters(&mut project, characters)?;
                }
                apply_edit(&mut updated, edit);
                self.workflow.update_panel(&mut project.comic_state, index, updated)?;
                format!("Updated panel {}", panel)
            }
            PanelCommand::Delete { panel } => {
                let removed = self
                    .workflow
                    .delete_panel(&mut project.comic_state, to_index(panel)?)?;
                format!("Deleted panel {} ({})", panel, removed.scene)
            }
            PanelCommand::Move { from, to, page } => {
                let target = match page {
                    Some(page) => ReorderTarget::PreviewPage(to_index(page)?),
                    None => ReorderTarget::ScriptPanels,
                };
                let request = ReorderRequest {
                    target,
                    source: to_index(from)?,
                    destination: Some(to_index(to)?),
                };
                if !self.workflow.reorder_panels(&mut project.comic_state, request)? {
                    return Ok("Nothing to move".to_string());
                }
                format!("Moved panel {} to {}", from, to)
            }
            PanelCommand::Regenerate { panel, page } => {
                let page_index = match page {
                    Some(page) => to_index(page)?,
                    None => project.comic_state.current_page,
                };
                let panel_index = to_index(panel)?;
                self.ensure_generator()?;
                let generator = self
                    .generator
                    .as_deref()
                    .ok_or(GenerationError::MissingApiKey)?;
                let outcome = self
                    .workflow
                    .regenerate_panel(&mut project, generator, page_index, panel_index)
                    .await?;
                if outcome == RegenerationOutcome::PanelRemoved {
                    return Ok("Panel was removed; image discarded".to_string());
                }
                let image = project
                    .comic_state
                    .pages
                    .get(page_index)
                    .and_then(|p| p.panels.get(panel_index))
                    .and_then(|p| p.generated_image.clone())
                    .unwrap_or_default();
                format!("Regenerated panel {}: {}", panel, image)
            }
        };
        self.save(project)?;
        Ok(output)
    }

    fn page(&mut self, command: PageCommand) -> AppResult<String> {
        let mut project = self.current()?;
        let state = &mut project.comic_state;
        let moved = match command {
            PageCommand::Next => state.next_page(),
            PageCommand::Prev => state.previous_page(),
            PageCommand::Goto { page } => {
                if !state.set_current_page(to_index(page)?) {
                    return Err(AppError::NoSuchPage(page));
                }
                true
            }
        };
        let output = format!("Page {} of {}", state.current_page + 1, state.page_count());
        if moved {
            self.save(project)?;
        }
        Ok(output)
    }

    async fn export(&mut self, command: ExportCommand) -> AppResult<String> {
        let project = self.current()?;
        let state = &project.comic_state;
        let exporter = Exporter::default();
        let mut images = ImageCache::new();

        let (artifact, out) = match command {
            ExportCommand::Png { out } => {
                self.fetch_artwork(&mut images, state.current()).await;
                (exporter.export_current_page(state, &mut images), out)
            }
            ExportCommand::Pdf { out } => {
                self.fetch_artwork(&mut images, &state.pages).await;
                (exporter.export_comic(state, &mut images), out)
            }
        };
        let artifact = artifact.inspect_err(|e| log::error!("Export failed: {}", e))?;

        let dir = out.unwrap_or_else(|| self.config.export_dir.clone());
        let path = artifact.write_to(&dir)?;
        log::info!("Exported {}", path.display());
        Ok(format!("Exported {}", path.display()))
    }

    /// Download remote panel artwork into the cache. Failures fall back to
    /// the placeholder fill.
    async fn fetch_artwork<'a>(
        &self,
        images: &mut ImageCache,
        pages: impl IntoIterator<Item = &'a ComicPage>,
    ) {
        for url in images.missing_remote(pages) {
            match self.fetch_bytes(&url).await {
                Ok(bytes) => {
                    if let Err(e) = images.insert_bytes(url.clone(), &bytes) {
                        log::warn!("Skipping artwork {}: {}", url, e);
                    }
                }
                Err(e) => log::warn!("Failed to fetch {}: {}", url, e),
            }
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn ensure_generator(&mut self) -> AppResult<()> {
        if self.generator.is_none() {
            let client = RunwareClient::new(self.config.runware())?;
            self.generator = Some(Box::new(client));
        }
        Ok(())
    }

    fn generator(&mut self) -> AppResult<&dyn ImageGenerator> {
        self.ensure_generator()?;
        Ok(self
            .generator
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?)
    }

    fn current(&self) -> AppResult<Project> {
        self.store.current_project().cloned().ok_or(AppError::NoProject)
    }

    fn open(&mut self, project: Project) -> AppResult<()> {
        self.store.blobs().save(CURRENT_KEY, &project.id)?;
        self.workflow.retain_known_panels(&project.comic_state);
        self.store.set_current_project(Some(project));
        Ok(())
    }

    fn save(&mut self, mut project: Project) -> AppResult<()> {
        project.touch();
        if !self.store.update_project(project.clone())? {
            log::warn!("Open project {} was not in the store; re-adding it", project.id);
            self.store.add_project(project.clone())?;
            self.store.set_current_project(Some(project));
        }
        Ok(())
    }

    /// Copy library characters into the project's snapshot if missing.
    fn attach_characters(&self, project: &mut Project, ids: &[String]) -> AppResult<()> {
        for id in ids {
            if project.character(id).is_none() {
                let character = self
                    .store
                    .character(id)
                    .cloned()
                    .ok_or_else(|| AppError::UnknownCharacter(id.clone()))?;
                project.characters.push(character);
            }
        }
        Ok(())
    }
}

fn comic_settings(title: &str, args: &SettingsArgs) -> ComicSettings {
    let mut settings = ComicSettings::new(title);
    if let Some(author) = &args.author {
        settings.set_author(author.clone());
    }
    settings.set_total_pages(args.pages);
    settings.set_panels_per_page(args.panels_per_page);
    settings
}

fn apply_settings(project: &mut Project, edit: SettingsEdit) {
    let settings = &mut project.comic_state.settings;
    if let Some(title) = edit.title {
        settings.title = title.clone();
        project.title = title;
    }
    if let Some(author) = edit.author {
        settings.set_author(author);
    }
    if let Some(pages) = edit.pages {
        settings.set_total_pages(pages);
    }
    if let Some(panels) = edit.panels_per_page {
        settings.set_panels_per_page(panels);
    }
}

fn to_index(number: usize) -> AppResult<usize> {
    number.checked_sub(1).ok_or(AppError::ZeroIndex)
}

fn image_mime(path: &Path) -> AppResult<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        _ => Err(AppError::UnsupportedImage(path.display().to_string())),
    }
}

fn apply_edit(panel: &mut Panel, edit: PanelEdit) {
    if let Some(scene) = edit.scene {
        panel.scene = scene;
    }
    if let Some(dialogue) = edit.dialogue {
        panel.dialogue = dialogue;
    }
    if let Some(characters) = edit.characters {
        panel.characters = characters;
    }
    if let Some(size) = edit.dialogue_size {
        panel.dialogue_size = Some(size);
    }
    if edit.x.is_some() || edit.y.is_some() {
        let current = panel.resolved_position();
        panel.dialogue_position = Some(Position::new(
            edit.x.unwrap_or(current.x),
            edit.y.unwrap_or(current.y),
        ));
    }
    if edit.background.is_some() || edit.text_color.is_some() || edit.opacity.is_some() {
        let mut style = panel.resolved_style();
        if let Some(background) = edit.background {
            style.background_color = background;
        }
        if let Some(text_color) = edit.text_color {
            style.text_color = text_color;
        }
        if let Some(opacity) = edit.opacity {
            style.opacity = opacity.clamp(0.0, 1.0);
        }
        panel.dialogue_style = Some(style);
    }
    if edit.clear_image {
        panel.generated_image = None;
    }
}

fn describe(project: &Project) -> String {
    let state = &project.comic_state;
    let settings = &state.settings;
    let mut lines = vec![format!("{} ({})", project.title, project.id)];
    if let Some(author) = &settings.author {
        lines.push(format!("by {}", author));
    }
    lines.push(format!(
        "Target: {} pages x {} panels",
        settings.total_pages, settings.panels_per_page
    ));

    match state.current() {
        None => lines.push("No pages yet".to_string()),
        Some(page) => {
            lines.push(format!("Page {} of {}", state.current_page + 1, state.page_count()));
            for (i, panel) in page.panels.iter().enumerate() {
                let names: Vec<&str> = panel
                    .characters
                    .iter()
                    .map(|id| project.character(id).map_or("?", |c| c.name.as_str()))
                    .collect();
                lines.push(format!(
                    "  {}. {} | {} | [{}] | {}",
                    i + 1,
                    panel.scene,
                    panel.dialogue,
                    names.join(", "),
                    if panel.generated_image.is_some() { "image" } else { "no image" }
                ));
            }
        }
    }
    lines.join("\n")
}

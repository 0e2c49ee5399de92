//! Registry of projects and characters, persisted to a blob store.
//!
//! Every mutation of a collection rewrites that whole collection under its
//! fixed key. Loading never fails: a missing or corrupt blob yields an empty
//! collection, and loaded projects are normalized.

use crate::model::{Character, Project};
use crate::storage::{BlobStore, StorageError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

/// Blob key holding the serialized project list.
pub const PROJECTS_KEY: &str = "projects";

/// Blob key holding the serialized character list.
pub const CHARACTERS_KEY: &str = "characters";

/// Project store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("An entry with id {0} already exists")]
    DuplicateId(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for project store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// In-memory registry of projects and characters backed by a [`BlobStore`].
pub struct ProjectStore<S: BlobStore> {
    blobs: Arc<S>,
    projects: Vec<Project>,
    characters: Vec<Character>,
    /// Project open for editing. Not persisted.
    current_project: Option<Project>,
}

impl<S: BlobStore> ProjectStore<S> {
    /// Open the store, loading both collections once.
    pub fn open(blobs: Arc<S>) -> Self {
        let projects: Vec<Project> = load_collection(blobs.as_ref(), PROJECTS_KEY)
            .into_iter()
            .map(Project::normalized)
            .collect();
        let characters = load_collection(blobs.as_ref(), CHARACTERS_KEY);
        log::info!(
            "Project store opened: {} projects, {} characters",
            projects.len(),
            characters.len()
        );
        Self {
            blobs,
            projects,
            characters,
            current_project: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Add a project and persist the project list.
    ///
    /// A project whose identifier is already present is rejected.
    pub fn add_project(&mut self, project: Project) -> StoreResult<()> {
        if self.project(&project.id).is_some() {
            return Err(StoreError::DuplicateId(project.id));
        }
        log::debug!("Adding project {} ({})", project.id, project.title);
        self.projects.push(project);
        self.persist_projects()
    }

    /// Replace the project with the same identifier.
    ///
    /// Returns `false` without touching storage when no such project exists.
    pub fn update_project(&mut self, project: Project) -> StoreResult<bool> {
        let Some(slot) = self.projects.iter_mut().find(|p| p.id == project.id) else {
            return Ok(false);
        };
        if let Some(current) = self.current_project.as_mut() {
            if current.id == project.id {
                *current = project.clone();
            }
        }
        *slot = project;
        self.persist_projects()?;
        Ok(true)
    }

    /// Remove a project by identifier. Returns whether anything was removed.
    pub fn delete_project(&mut self, id: &str) -> StoreResult<bool> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return Ok(false);
        }
        if self.current_project.as_ref().is_some_and(|p| p.id == id) {
            self.current_project = None;
        }
        self.persist_projects()?;
        Ok(true)
    }

    /// Add a character and persist the character list.
    pub fn add_character(&mut self, character: Character) -> StoreResult<()> {
        if self.character(&character.id).is_some() {
            return Err(StoreError::DuplicateId(character.id));
        }
        self.characters.push(character);
        self.persist_characters()
    }

    /// Replace the character with the same identifier.
    pub fn update_character(&mut self, character: Character) -> StoreResult<bool> {
        let Some(slot) = self.characters.iter_mut().find(|c| c.id == character.id) else {
            return Ok(false);
        };
        *slot = character;
        self.persist_characters()?;
        Ok(true)
    }

    /// Remove a character by identifier.
    ///
    /// Panels that reference the character keep their (now dangling) reference.
    pub fn delete_character(&mut self, id: &str) -> StoreResult<bool> {
        let before = self.characters.len();
        self.characters.retain(|c| c.id != id);
        if self.characters.len() == before {
            return Ok(false);
        }
        self.persist_characters()?;
        Ok(true)
    }

    /// Record which project is open for editing. Does not touch storage.
    pub fn set_current_project(&mut self, project: Option<Project>) {
        self.current_project = project;
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current_project.as_ref()
    }

    /// Get a reference to the blob store.
    pub fn blobs(&self) -> &Arc<S> {
        &self.blobs
    }

    fn persist_projects(&self) -> StoreResult<()> {
        persist_collection(self.blobs.as_ref(), PROJECTS_KEY, &self.projects)
    }

    fn persist_characters(&self) -> StoreResult<()> {
        persist_collection(self.blobs.as_ref(), CHARACTERS_KEY, &self.characters)
    }
}

fn load_collection<S: BlobStore, T: DeserializeOwned>(blobs: &S, key: &str) -> Vec<T> {
    let blob = match blobs.load(key) {
        Ok(blob) => blob,
        Err(StorageError::NotFound(_)) => {
            log::debug!("No saved {} found", key);
            return Vec::new();
        }
        Err(e) => {
            log::warn!("Failed to read saved {}: {}", key, e);
            return Vec::new();
        }
    };
    match serde_json::from_str(&blob) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Discarding unreadable saved {}: {}", key, e);
            Vec::new()
        }
    }
}

fn persist_collection<S: BlobStore, T: Serialize>(
    blobs: &S,
    key: &str,
    items: &[T],
) -> StoreResult<()> {
    let json = serde_json::to_string(items)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    blobs.save(key, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComicPage;
    use crate::storage::MemoryBlobStore;

    fn open_empty() -> ProjectStore<MemoryBlobStore> {
        ProjectStore::open(Arc::new(MemoryBlobStore::new()))
    }

    #[test]
    fn test_open_empty_store() {
        let store = open_empty();
        assert!(store.projects().is_empty());
        assert!(store.characters().is_empty());
        assert!(store.current_project().is_none());
    }

    #[test]
    fn test_corrupt_blobs_load_as_empty() {
        let blobs = MemoryBlobStore::with_blobs([
            (PROJECTS_KEY, "{not json"),
            (CHARACTERS_KEY, "[{\"id\": 3}]"),
        ]);
        let store = ProjectStore::open(Arc::new(blobs));
        assert!(store.projects().is_empty());
        assert!(store.characters().is_empty());
    }

    #[test]
    fn test_add_project_persists_immediately() {
        let mut store = open_empty();
        let project = Project::new("Demo");
        store.add_project(project.clone()).unwrap();

        let reopened = ProjectStore::open(store.blobs().clone());
        assert_eq!(reopened.projects(), &[project]);
    }

    #[test]
    fn test_add_project_rejects_duplicate_id() {
        let mut store = open_empty();
        let project = Project::new("Demo");
        store.add_project(project.clone()).unwrap();

        let result = store.add_project(project);
        assert!(matches!(result, Err(StoreError::DuplicateId(_))));
        assert_eq!(store.projects().len(), 1);
    }

    #[test]
    fn test_update_project_replaces_by_id() {
        let mut store = open_empty();
        let mut project = Project::new("Demo");
        store.add_project(project.clone()).unwrap();
        store.add_project(Project::new("Other")).unwrap();

        project.title = "Renamed".to_string();
        assert!(store.update_project(project.clone()).unwrap());
        assert_eq!(store.projects()[0].title, "Renamed");
        assert_eq!(store.projects()[1].title, "Other");

        let reopened = ProjectStore::open(store.blobs().clone());
        assert_eq!(reopened.project(&project.id).unwrap().title, "Renamed");
    }

    #[test]
    fn test_update_missing_project_is_noop() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut store = ProjectStore::open(blobs.clone());
        assert!(!store.update_project(Project::new("Ghost")).unwrap());
        assert!(!blobs.exists(PROJECTS_KEY).unwrap());
    }

    #[test]
    fn test_delete_project() {
        let mut store = open_empty();
        let project = Project::new("Demo");
        store.add_project(project.clone()).unwrap();
        store.set_current_project(Some(project.clone()));

        assert!(store.delete_project(&project.id).unwrap());
        assert!(store.projects().is_empty());
        assert!(store.current_project().is_none());
        assert!(!store.delete_project(&project.id).unwrap());
    }

    #[test]
    fn test_update_refreshes_current_project() {
        let mut store = open_empty();
        let mut project = Project::new("Demo");
        store.add_project(project.clone()).unwrap();
        store.set_current_project(Some(project.clone()));

        project.theme = "space".to_string();
        store.update_project(project).unwrap();
        assert_eq!(store.current_project().unwrap().theme, "space");
    }

    #[test]
    fn test_current_project_is_not_persisted() {
        let mut store = open_empty();
        store.set_current_project(Some(Project::new("Draft")));
        assert!(!store.blobs().exists(PROJECTS_KEY).unwrap());
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_character_crud() {
        let mut store = open_empty();
        let mut character = Character::new("Ada", "pilot");
        store.add_character(character.clone()).unwrap();
        assert!(matches!(
            store.add_character(character.clone()),
            Err(StoreError::DuplicateId(_))
        ));

        character.seed = Some(7);
        assert!(store.update_character(character.clone()).unwrap());
        assert_eq!(store.character(&character.id).unwrap().seed, Some(7));

        let reopened = ProjectStore::open(store.blobs().clone());
        assert_eq!(reopened.characters(), &[character.clone()]);

        assert!(store.delete_character(&character.id).unwrap());
        assert!(!store.delete_character(&character.id).unwrap());
        assert!(store.characters().is_empty());
    }

    #[test]
    fn test_collections_persist_independently() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut store = ProjectStore::open(blobs.clone());
        store.add_character(Character::new("Ada", "pilot")).unwrap();
        assert!(blobs.exists(CHARACTERS_KEY).unwrap());
        assert!(!blobs.exists(PROJECTS_KEY).unwrap());
    }

    #[test]
    fn test_loaded_projects_are_normalized() {
        let mut project = Project::new("Demo");
        project.comic_state.settings.total_pages = 99;
        project.comic_state.settings.panels_per_page = 0;
        project.comic_state.pages.push(ComicPage::new(vec![]));
        project.comic_state.current_page = 7;
        let json = serde_json::to_string(&vec![project]).unwrap();

        let blobs = MemoryBlobStore::with_blobs([(PROJECTS_KEY, json)]);
        let store = ProjectStore::open(Arc::new(blobs));
        let state = &store.projects()[0].comic_state;
        assert_eq!(state.settings.total_pages, 20);
        assert_eq!(state.settings.panels_per_page, 1);
        assert_eq!(state.current_page, 0);
    }

    #[test]
    fn test_loaded_huge_page_index_navigates_safely() {
        let mut project = Project::new("Demo");
        project.comic_state.pages.push(ComicPage::new(vec![]));
        project.comic_state.current_page = usize::MAX;
        let json = serde_json::to_string(&vec![project]).unwrap();

        let blobs = MemoryBlobStore::with_blobs([(PROJECTS_KEY, json)]);
        let store = ProjectStore::open(Arc::new(blobs));
        let mut state = store.projects()[0].comic_state.clone();
        assert_eq!(state.current_page, 0);
        assert!(!state.next_page());
    }
}

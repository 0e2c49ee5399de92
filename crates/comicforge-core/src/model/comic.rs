//! Pages, settings and the overall comic state.

use super::{Panel, PanelId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bounds for [`ComicSettings::total_pages`].
pub const MIN_TOTAL_PAGES: u32 = 1;
pub const MAX_TOTAL_PAGES: u32 = 20;

/// Bounds for [`ComicSettings::panels_per_page`].
pub const MIN_PANELS_PER_PAGE: u32 = 1;
pub const MAX_PANELS_PER_PAGE: u32 = 6;

/// An ordered collection of panels displayed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComicPage {
    pub id: String,
    /// Panels in reading order.
    pub panels: Vec<Panel>,
}

impl ComicPage {
    pub fn new(panels: Vec<Panel>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            panels,
        }
    }

    /// Index of the panel with the given identifier.
    pub fn position_of(&self, panel_id: &str) -> Option<usize> {
        self.panels.iter().position(|p| p.id == panel_id)
    }
}

/// Comic-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicSettings {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Target page count, 1..=20.
    pub total_pages: u32,
    /// Target panels per page, 1..=6.
    pub panels_per_page: u32,
}

impl Default for ComicSettings {
    fn default() -> Self {
        Self::new("")
    }
}

impl ComicSettings {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            total_pages: 1,
            panels_per_page: 4,
        }
    }

    pub fn set_total_pages(&mut self, pages: u32) {
        self.total_pages = pages.clamp(MIN_TOTAL_PAGES, MAX_TOTAL_PAGES);
    }

    pub fn set_panels_per_page(&mut self, panels: u32) {
        self.panels_per_page = panels.clamp(MIN_PANELS_PER_PAGE, MAX_PANELS_PER_PAGE);
    }

    /// Set the author; blank input clears it.
    pub fn set_author(&mut self, author: impl Into<String>) {
        let author = author.into();
        self.author = if author.trim().is_empty() { None } else { Some(author) };
    }

    /// Copy with out-of-range targets clamped into bounds.
    pub fn normalized(mut self) -> Self {
        self.set_total_pages(self.total_pages);
        self.set_panels_per_page(self.panels_per_page);
        self
    }
}

/// Settings, pages and the page being viewed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicState {
    pub settings: ComicSettings,
    pub pages: Vec<ComicPage>,
    /// 0-based index into `pages`; meaningful only while pages exist.
    pub current_page: usize,
}

impl ComicState {
    pub fn new(settings: ComicSettings) -> Self {
        Self {
            settings,
            pages: Vec::new(),
            current_page: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The page currently being viewed.
    pub fn current(&self) -> Option<&ComicPage> {
        self.pages.get(self.current_page)
    }

    pub fn current_mut(&mut self) -> Option<&mut ComicPage> {
        self.pages.get_mut(self.current_page)
    }

    /// Jump to a page. Returns false if the index is out of range.
    pub fn set_current_page(&mut self, index: usize) -> bool {
        if index < self.pages.len() {
            self.current_page = index;
            true
        } else {
            false
        }
    }

    /// Advance one page; no-op on the last page.
    pub fn next_page(&mut self) -> bool {
        match self.current_page.checked_add(1) {
            Some(index) => self.set_current_page(index),
            None => false,
        }
    }

    /// Go back one page; no-op on the first page.
    pub fn previous_page(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(index) => self.set_current_page(index),
            None => false,
        }
    }

    /// Pull `current_page` back into range after pages were removed.
    pub fn clamp_current_page(&mut self) {
        if self.current_page >= self.pages.len() {
            self.current_page = self.pages.len().saturating_sub(1);
        }
    }

    /// Copy with settings clamped and `current_page` pulled into range.
    pub fn normalized(mut self) -> Self {
        self.settings = self.settings.normalized();
        self.clamp_current_page();
        self
    }

    /// Locate a panel by identifier as `(page index, panel index)`.
    pub fn find_panel(&self, panel_id: &str) -> Option<(usize, usize)> {
        self.pages
            .iter()
            .enumerate()
            .find_map(|(page, p)| p.position_of(panel_id).map(|index| (page, index)))
    }

    pub fn panel_mut(&mut self, panel_id: &str) -> Option<&mut Panel> {
        let (page, index) = self.find_panel(panel_id)?;
        self.pages.get_mut(page)?.panels.get_mut(index)
    }

    /// All panels in reading order.
    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.pages.iter().flat_map(|p| p.panels.iter())
    }

    /// Identifiers of every panel in the comic.
    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.panels().map(|p| p.id.clone()).collect()
    }
}

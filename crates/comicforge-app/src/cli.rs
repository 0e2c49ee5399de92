//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "comicforge")]
#[command(about = "Create comics from characters and scripts with AI-generated panels")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to <config dir>/comicforge/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage the character library
    #[command(subcommand)]
    Character(CharacterCommand),

    /// Generate a script into a new project
    #[command(subcommand)]
    Script(ScriptCommand),

    /// Edit panels of the open project (numbered from 1)
    #[command(subcommand)]
    Panel(PanelCommand),

    /// Navigate pages of the open project
    #[command(subcommand)]
    Page(PageCommand),

    /// Export the open project
    #[command(subcommand)]
    Export(ExportCommand),
}

/// Comic settings shared by project creation commands.
#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// Comic author
    #[arg(long)]
    pub author: Option<String>,

    /// Target page count (1-20)
    #[arg(long, default_value = "1")]
    pub pages: u32,

    /// Target panels per page (1-6)
    #[arg(long, default_value = "4")]
    pub panels_per_page: u32,
}

/// Comic settings to change; omitted fields are kept.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsEdit {
    #[arg(long)]
    pub title: Option<String>,
    /// Comic author (blank clears it)
    #[arg(long)]
    pub author: Option<String>,
    /// Target page count (1-20)
    #[arg(long)]
    pub pages: Option<u32>,
    /// Target panels per page (1-6)
    #[arg(long)]
    pub panels_per_page: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create an empty project and open it
    New {
        title: String,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// List saved projects
    List,
    /// Open a project for editing
    Open { id: String },
    /// Show the open project
    Show,
    /// Change the open project's comic settings
    Settings(SettingsEdit),
    /// Delete a project
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum CharacterCommand {
    /// Add a character to the library
    Add {
        name: String,
        /// Free-text description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Reference image to transform (PNG, JPEG or WebP)
        #[arg(short, long)]
        reference: Option<PathBuf>,
    },
    /// List library characters
    List,
    /// Generate (or regenerate) a character's artwork
    Generate { id: String },
    /// Delete a character from the library
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ScriptCommand {
    /// Generate a placeholder script and open it as a new project
    Generate {
        /// Comic title
        #[arg(long)]
        title: String,
        #[arg(long)]
        theme: String,
        #[arg(long, default_value = "adventure")]
        tone: String,
        #[arg(long)]
        key_elements: String,
        /// Character ids to feature
        #[arg(long = "character", required = true)]
        characters: Vec<String>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum PanelCommand {
    /// Append an empty panel to the current page
    Add {
        /// Character ids to feature
        #[arg(long = "character")]
        characters: Vec<String>,
    },
    /// Edit a panel of the current page
    Edit {
        panel: usize,
        #[command(flatten)]
        edit: PanelEdit,
    },
    /// Delete a panel of the current page
    Delete { panel: usize },
    /// Move a panel within a page
    Move {
        from: usize,
        to: usize,
        /// Page to reorder (defaults to the current page's script)
        #[arg(long)]
        page: Option<usize>,
    },
    /// Regenerate a panel's artwork
    Regenerate {
        panel: usize,
        /// Page holding the panel (defaults to the current page)
        #[arg(long)]
        page: Option<usize>,
    },
}

/// Panel fields to change; omitted fields are kept.
#[derive(Debug, Clone, Default, Args)]
pub struct PanelEdit {
    #[arg(long)]
    pub scene: Option<String>,
    #[arg(long)]
    pub dialogue: Option<String>,
    /// Replace the panel's characters
    #[arg(long = "character")]
    pub characters: Option<Vec<String>>,
    #[arg(long)]
    pub dialogue_size: Option<u32>,
    /// Dialogue position, percent of panel width
    #[arg(long)]
    pub x: Option<f64>,
    /// Dialogue position, percent of panel height
    #[arg(long)]
    pub y: Option<f64>,
    #[arg(long)]
    pub background: Option<String>,
    #[arg(long)]
    pub text_color: Option<String>,
    #[arg(long)]
    pub opacity: Option<f64>,
    /// Remove the generated artwork
    #[arg(long)]
    pub clear_image: bool,
}

#[derive(Debug, Subcommand)]
pub enum PageCommand {
    Next,
    Prev,
    /// Jump to a page (numbered from 1)
    Goto { page: usize },
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Export the current page as PNG
    Png {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Export the whole comic as PDF
    Pdf {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

//! ComicForge Application
//!
//! The application shell: configuration, command-line surface and the
//! handlers wiring the project store, panel workflow, image generation
//! and export together.

mod app;
pub mod cli;
pub mod config;

pub use app::{App, AppError, AppResult, CURRENT_KEY};
pub use cli::Cli;
pub use config::{AppConfig, ConfigError};

use comicforge_core::storage::{self, FileBlobStore};
use std::sync::Arc;

/// Load configuration, open the file-backed store and run one command.
pub async fn run(cli: Cli) -> AppResult<String> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let blobs = match &config.data_dir {
        Some(dir) => FileBlobStore::new(dir.clone())?,
        None => storage::create_default_store()?,
    };
    log::debug!("Using data directory {}", blobs.base_path().display());

    let mut app = App::new(config, Arc::new(blobs));
    app.run(cli.command).await
}

//! # Persistence Module
//!
//! Stores the panel state (the [`PanelConfig`] handed to `save_state`) as TOML in the
//! user's config directory and loads it back at startup.
//!
//! ## Error Handling Strategy
//! Uses `color_eyre` for file operations. A missing state file is not an error: the
//! panel then starts from defaults. A file that cannot be parsed is reported and also
//! treated as missing, so a broken file never prevents startup.

pub mod persistence_worker;

use crate::panel::PanelConfig;
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use persistence_worker::PersistenceWorker;

/// Directory name below the platform config dir
pub const APP_DIR: &str = "virtual-joystick";
pub const PANEL_STATE_FILE: &str = "panel_state.toml";

/// `<config_dir>/virtual-joystick`, falling back to the working directory
pub fn config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(mut dir) => {
            dir.push(APP_DIR);
            dir
        }
        None => {
            warn!("No config directory available, using working directory");
            PathBuf::from(".")
        }
    }
}

pub fn default_state_path() -> PathBuf {
    config_dir().join(PANEL_STATE_FILE)
}

/// Reads the persisted panel state. `Ok(None)` when no state was saved yet.
pub async fn load_panel_state(path: &Path) -> Result<Option<PanelConfig>> {
    if !tokio::fs::try_exists(path)
        .await
        .map_err(|e| eyre!("Failed to check if panel state file exists: {}", e))?
    {
        debug!("No panel state at {}", path.display());
        return Ok(None);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| eyre!("Failed to read panel state file: {}", e))?;
    let config = toml::from_str(&content)
        .map_err(|e| eyre!("Failed to parse panel state file: {}", e))?;

    info!("Panel state loaded from {}", path.display());
    Ok(Some(config))
}

/// Same as [`load_panel_state`], but errors are logged and mapped to `None`.
pub async fn load_panel_state_or_default(path: &Path) -> Option<PanelConfig> {
    match load_panel_state(path).await {
        Ok(state) => state,
        Err(e) => {
            warn!("Ignoring panel state: {}", e);
            None
        }
    }
}

pub async fn write_panel_state(path: &Path, config: &PanelConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create state directory: {}", e))?;
        }
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| eyre!("Failed to serialize panel state: {}", e))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| eyre!("Failed to write panel state file: {}", e))?;

    debug!("Panel state written to {}", path.display());
    Ok(())
}

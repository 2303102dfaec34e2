//! Application settings
//!
//! Read once at startup from `settings.toml` in the config directory (or the file
//! named by `VIRTUAL_JOYSTICK_CONFIG`). A missing file is created with defaults.

use crate::mapping::messages::{TWIST_SCHEMA, TWIST_STAMPED_SCHEMA};
use crate::mqtt::MqttConfig;
use crate::panel::Topic;
use crate::persistence;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "VIRTUAL_JOYSTICK_CONFIG";
pub const SETTINGS_FILE: &str = "settings.toml";

fn default_topics() -> Vec<Topic> {
    vec![
        Topic {
            name: "/cmd_vel".to_string(),
            schema_name: TWIST_SCHEMA.to_string(),
        },
        Topic {
            name: "/cmd_vel_stamped".to_string(),
            schema_name: TWIST_STAMPED_SCHEMA.to_string(),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub dark_mode: bool,

    /// Where the panel state lives; defaults to the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Topics offered to the panel. Entries with other schemas are filtered out
    /// by the panel itself.
    #[serde(default = "default_topics")]
    pub topics: Vec<Topic>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            state_file: None,
            mqtt: MqttConfig::default(),
            topics: default_topics(),
        }
    }
}

impl AppSettings {
    /// `$VIRTUAL_JOYSTICK_CONFIG` if set, else `<config_dir>/virtual-joystick/settings.toml`
    pub fn default_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => persistence::config_dir().join(SETTINGS_FILE),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(persistence::default_state_path)
    }

    /// Loads the settings file, writing the defaults first if it does not exist.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if settings file exists: {}", e))?
        {
            warn!(
                "Settings file {} does not exist, writing defaults",
                path.display()
            );
            let settings = Self::default();
            settings.save(path).await?;
            return Ok(settings);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read settings file: {}", e))?;
        let settings: Self =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse settings file: {}", e))?;

        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| eyre!("Failed to create settings directory: {}", e))?;
            }
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write settings file: {}", e))?;
        Ok(())
    }
}

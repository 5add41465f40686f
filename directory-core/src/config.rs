use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::{AuthToken, Role, Session};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Top-level configuration stored on disk.
///
/// Besides the API endpoint it holds the viewer's role and auth token, which
/// the rest of the crate only ever reads through [`Config::session`].
///
/// Example TOML:
/// api_base_url = "http://localhost:8080"
/// role = "admin"
/// token = "..."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Stored role string; unknown values read as a visitor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self { api_base_url: default_api_base_url(), role: None, token: None }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "doctor-directory", "directory-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.api_base_url = url.into();
    }

    /// Snapshot of the stored role and token. Read once per render.
    pub fn session(&self) -> Session {
        Session::new(
            Role::from_stored(self.role.as_deref()),
            self.token.as_deref().and_then(AuthToken::new),
        )
    }

    pub fn set_session(&mut self, role: Role, token: Option<&AuthToken>) {
        self.role = Some(role.as_str().to_string());
        self.token = token.map(|t| t.as_str().to_string());
    }

    pub fn clear_session(&mut self) {
        self.role = None;
        self.token = None;
    }
}

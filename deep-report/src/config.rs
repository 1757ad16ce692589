//! deep-report application configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::text::DEFAULT_MAX_CHUNK_LENGTH;

const DEFAULT_LANGUAGE: &str = "it-IT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// BCP 47 tag used for speech and as the report language
    #[serde(default = "default_language")]
    pub language: String,

    /// Maximum characters per spoken chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Speech program to use. None means detect one on PATH.
    #[serde(default)]
    pub speech_command: Option<PathBuf>,

    /// Extra arguments passed to the speech program before the text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speech_args: Vec<String>,

    /// Directory for exported files. None means the current directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_LENGTH
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            chunk_size: default_chunk_size(),
            speech_command: None,
            speech_args: Vec::new(),
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Get the config file path: ~/.config/deep-report/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("deep-report").join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a file, returning defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Directory exports are written to
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

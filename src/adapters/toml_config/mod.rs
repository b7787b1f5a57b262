// TOML config adapter - Configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::usecases::EncodingOptions;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "ts2mp4.toml";

/// Accepted `log_level` values
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Application settings after all layers are merged
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub crf: u8,
    pub preset: String,
    /// ffmpeg executable name or path
    pub ffmpeg: PathBuf,
    /// ffprobe executable name or path
    pub ffprobe: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let encoding = EncodingOptions::default();
        Self {
            crf: encoding.crf,
            preset: encoding.preset,
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Validated encoder settings
    pub fn encoding_options(&self) -> Result<EncodingOptions, DomainError> {
        EncodingOptions::new(self.crf, &self.preset)
    }

    /// Reject values no tool invocation could use
    pub fn validate(&self) -> Result<(), DomainError> {
        self.encoding_options()?;
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse a config document; absent keys keep their defaults
    pub fn parse(content: &str) -> Result<AppConfig, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::BadArgs(format!("Failed to parse TOML config: {}", e)))
    }

    /// Load an explicit config file, which must exist
    pub fn load_file(path: &Path) -> Result<AppConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::FsFail(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::parse(&content)
    }

    /// Load `explicit` if given, else the default file if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig, DomainError> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load_file(default_path)
                } else {
                    Ok(AppConfig::default())
                }
            }
        }
    }
}

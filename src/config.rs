//! Configuration loading
//!
//! `defaults/rubyle.default.toml` is embedded into the crate so the documented
//! defaults and the runtime behaviour never drift apart. Hosts layer their own files
//! and overrides on top with [`Loader`] before deserializing into [`RubyleConfig`].

use crate::error::SessionError;
use crate::hints::HintSettings;
use crate::parser::ParseOptions;
use crate::session::Settings;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TOML: &str = include_str!("../defaults/rubyle.default.toml");

/// Everything a Rubyle host reads from configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RubyleConfig {
    pub game: GameConfig,
    pub hints: HintSettings,
    pub parser: ParseOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub reference: String,
    #[serde(default)]
    pub reference_file: Option<PathBuf>,
    pub alert_timeout_ms: u64,
}

impl GameConfig {
    /// The reference snippet, read from `reference_file` when one is configured
    pub fn reference_source(&self) -> Result<String, SessionError> {
        match &self.reference_file {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|source| SessionError::ReferenceFile {
                    path: path.display().to_string(),
                    source,
                })
            }
            None => Ok(self.reference.clone()),
        }
    }

    pub fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }
}

impl RubyleConfig {
    /// Session settings described by this configuration
    pub fn settings(&self) -> Settings {
        Settings {
            alert_timeout: self.game.alert_timeout(),
            hints: self.hints,
            parse: self.parser,
        }
    }
}

/// Layers user configuration over the built-in defaults
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start from the embedded defaults
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file that must exist
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a configuration file, skipped when absent
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one key, e.g. from a command-line flag
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<RubyleConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<RubyleConfig, ConfigError> {
    Loader::new().build()
}

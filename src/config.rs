//! Engine configuration loaded from TOML.
//!
//! ```toml
//! ko_rule = "positional-superko"
//! default_board_size = 19
//! log_filter = "goban_engine=debug"
//! ```
//!
//! Every key is optional.

use std::path::Path;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::constants::{DEFAULT_SIZE, SUPPORTED_SIZES, is_supported_size};
use crate::rules::KoRule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Repetition rule enforced by every game.
    pub ko_rule: KoRule,
    /// Board size used when none is requested.
    pub default_board_size: usize,
    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ko_rule: KoRule::default(),
            default_board_size: DEFAULT_SIZE,
            log_filter: "warn".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {e}")))?;
        let config = Self::from_toml(&content)?;
        info!(ko_rule = ?config.ko_rule, size = config.default_board_size, "Config loaded");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_supported_size(self.default_board_size) {
            return Err(ConfigError::new(format!(
                "default_board_size {} is not one of {SUPPORTED_SIZES:?}",
                self.default_board_size
            )));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    pub message: String,
    pub line: u32,
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error recording the caller's location.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

//! Configuration management.
//!
//! Settings come from a TOML file, then environment overrides:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `MECHSTORE_FORMAT` | Format for save paths without an extension |
//! | `MECHSTORE_OVERWRITE` | Replace existing files by default (`true`/`1`) |
//! | `MECHSTORE_LOG` | Log filter directive, see [`crate::observability`] |

use crate::io::Format;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default save format.
pub const ENV_FORMAT: &str = "MECHSTORE_FORMAT";
/// Environment variable overriding the default overwrite policy.
pub const ENV_OVERWRITE: &str = "MECHSTORE_OVERWRITE";

/// Main configuration for mechstore.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Format for save paths without an extension (binary when unset).
    pub default_format: Option<Format>,
    /// Whether saves replace existing files unless told otherwise.
    pub overwrite: bool,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging section of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, e.g. `mechstore=debug`.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Default save format.
    pub default_format: Option<String>,
    /// Default overwrite policy.
    pub overwrite: Option<bool>,
    /// Logging configuration.
    pub logging: Option<LoggingSettings>,
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or names an
    /// unknown format.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::failed("read_config_file", format!("{}: {e}", path.display())))?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| Error::failed("parse_config_file", e))?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Looks for `mechstore/config.toml` in the platform config directory
    /// (`~/.config` on Linux, `~/Library/Application Support` on macOS).
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs.config_dir().join("mechstore").join("config.toml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Applies `MECHSTORE_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an override holds an invalid value.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if an override holds an invalid value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(format) = lookup(ENV_FORMAT) {
            self.default_format = Some(format.parse()?);
        }
        if let Some(overwrite) = lookup(ENV_OVERWRITE) {
            self.overwrite = parse_bool(&overwrite).ok_or_else(|| {
                Error::InvalidInput(format!("{ENV_OVERWRITE} must be a boolean, got '{overwrite}'"))
            })?;
        }
        Ok(self)
    }

    /// Converts a `ConfigFile` to `StoreConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(format) = file.default_format {
            config.default_format = Some(format.parse()?);
        }
        if let Some(overwrite) = file.overwrite {
            config.overwrite = overwrite;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Sets the default save format.
    #[must_use]
    pub const fn with_default_format(mut self, format: Format) -> Self {
        self.default_format = Some(format);
        self
    }

    /// Sets the default overwrite policy.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

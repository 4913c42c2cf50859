//! Configuration management for mergeguard.
//!
//! Configuration is loaded with figment from defaults, a TOML file and
//! environment variables.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::report::ReportFormat;
use crate::scan::{validate_marker_size, ScanOptions, DEFAULT_MARKER_SIZE};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the user config dir.
const APP_DIR_NAME: &str = "mergeguard";

/// Prefix for environment overrides.
///
/// Nested keys use a double underscore, e.g. `MERGEGUARD_SCAN__MAX_FILE_SIZE`.
const ENV_PREFIX: &str = "MERGEGUARD_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MERGEGUARD_`)
/// 2. TOML config file at `~/.config/mergeguard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File discovery configuration.
    pub scan: ScanConfig,
    /// Marker recognition configuration.
    pub markers: MarkerConfig,
    /// Report output configuration.
    pub report: ReportConfig,
}

/// File discovery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns for paths to skip during directory walks.
    pub exclude: Vec<String>,
    /// Only walk files with these extensions. Empty means all files.
    pub extensions: Vec<String>,
    /// Descend into hidden files and directories.
    pub include_hidden: bool,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Maximum number of files read concurrently.
    pub jobs: usize,
}

/// Marker recognition configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Marker run length, as git's `conflict-marker-size`.
    pub marker_size: usize,
    /// Report `=======` lines outside a conflict block.
    pub strict_separators: bool,
}

/// Report output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Default output format for `check`.
    pub format: ReportFormat,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude_patterns(),
            extensions: Vec::new(),
            include_hidden: false,
            follow_symlinks: false,
            max_file_size: 10 * 1024 * 1024, // 10MB
            jobs: default_jobs(),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            marker_size: DEFAULT_MARKER_SIZE,
            strict_separators: false,
        }
    }
}

/// Directories that never hold tracked sources worth checking.
fn default_exclude_patterns() -> Vec<String> {
    vec![
        ".git".to_string(),
        "target".to_string(),
        "node_modules".to_string(),
    ]
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        tracing::debug!(path = %config_file.display(), "configuration loaded");
        Ok(config)
    }

    /// Load configuration from a file that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathNotFound`] if `path` does not exist, otherwise as
    /// [`Config::load_from`].
    pub fn load_file(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::PathNotFound { path });
        }
        Self::load_from(Some(path))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        validate_marker_size(self.markers.marker_size)?;

        if self.scan.jobs == 0 {
            return Err(Error::config("jobs must be greater than 0"));
        }

        if self.scan.max_file_size == 0 {
            return Err(Error::config("max_file_size must be greater than 0"));
        }

        for pattern in &self.scan.exclude {
            glob::Pattern::new(pattern).map_err(|source| Error::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
        }

        if let Some(ext) = self
            .scan
            .extensions
            .iter()
            .find(|e| e.trim_start_matches('.').is_empty())
        {
            return Err(Error::config(format!("invalid extension: '{ext}'")));
        }

        Ok(())
    }

    /// Scanner options derived from the marker configuration.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            marker_size: self.markers.marker_size,
            strict_separators: self.markers.strict_separators,
        }
    }
}

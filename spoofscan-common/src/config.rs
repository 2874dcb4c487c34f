//! Configuration file resolution, loading, and logging setup
//!
//! Bootstrap configuration for every spoofscan service is a single TOML file.
//! The file is located following this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`~/.config/spoofscan/<file>`)
//! 4. System config directory (`/etc/spoofscan/<file>`, Unix only)
//!
//! A missing file is not fatal: services log a warning and run on built-in defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directory name used under the platform config directory
pub const CONFIG_DIR_NAME: &str = "spoofscan";

/// Locates a service's TOML configuration file
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env_var_name: String,
    file_name: String,
}

impl ConfigResolver {
    /// Create resolver for a service
    ///
    /// `env_var_name` names the variable that may point at the file,
    /// `file_name` is the bare file name searched in the config directories.
    pub fn new(env_var_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            env_var_name: env_var_name.into(),
            file_name: file_name.into(),
        }
    }

    /// Resolve the configuration file path
    ///
    /// Explicit sources (CLI, ENV) are returned even if the file does not exist so
    /// that the loader can report the mistake. Directory candidates are only
    /// returned when present on disk.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3 and 4: well-known locations
        self.default_locations().into_iter().find(|p| p.exists())
    }

    /// Candidate locations searched when nothing explicit was given
    pub fn default_locations(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join(CONFIG_DIR_NAME).join(&self.file_name));
        }
        if cfg!(unix) {
            candidates.push(
                PathBuf::from("/etc")
                    .join(CONFIG_DIR_NAME)
                    .join(&self.file_name),
            );
        }
        candidates
    }
}

/// Load and parse a TOML configuration file
///
/// Returns `T::default()` when `path` is `None` (no file found anywhere).
/// A path that was given but cannot be read or parsed is an error.
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        warn!("No configuration file found, using built-in defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read config file {} failed: {}", path.display(), e))
    })?;

    let config = toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Parse config file {} failed: {}", path.display(), e))
    })?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Build filter directives for the given crate targets
    ///
    /// `RUST_LOG` overrides the result entirely when set.
    pub fn directives(&self, targets: &[&str]) -> String {
        let level = self.level.trim().to_lowercase();
        targets
            .iter()
            .map(|t| format!("{}={}", t, level))
            .chain(std::iter::once(format!("tower_http={}", level)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initialize the global tracing subscriber
///
/// Writes to `logging.file` (appending, no ANSI colors) when configured,
/// otherwise to stderr.
pub fn init_logging(logging: &LoggingConfig, targets: &[&str]) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(logging.directives(targets))
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", logging.level, e)))?,
    };

    let (file_layer, stderr_layer) = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file));
            (Some(layer), None)
        }
        None => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::Internal(format!("Logging already initialized: {}", e)))
}

//! Application settings and paths.
//!
//! Settings live at `<XDG config dir>/portsweep/settings.json`. Every field is
//! optional in the file; whatever is missing falls back to the built-in value.

use crate::error::{ConfigError, ConfigResult};
use crate::services::DEFAULT_CACHE_DAYS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portsweep)
    pub config_dir: PathBuf,
    /// Cache directory (~/.cache/portsweep)
    pub cache_dir: PathBuf,
}

impl Paths {
    /// Locate the per-user configuration directory. Nothing is created on disk.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "portsweep", "portsweep")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
            cache_dir: project.cache_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the path to the cached service-name database.
    pub fn service_cache_file(&self) -> PathBuf {
        self.cache_dir.join("services.json")
    }
}

/// Application-wide defaults. Command-line flags override these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Port specification used when `-p` is not given.
    pub default_ports: String,
    /// Default concurrency level.
    pub default_concurrency: usize,
    /// Default connect timeout in seconds.
    pub default_timeout_secs: f64,
    /// Default banner timeout in seconds; `None` reuses the connect timeout.
    pub default_banner_timeout_secs: Option<f64>,
    /// Default output format.
    pub default_output_format: String,
    /// Extra port to service-name entries.
    pub services: HashMap<u16, String>,
    /// IANA service-names CSV export used to refresh the service cache.
    pub service_csv: Option<PathBuf>,
    /// Days before the service cache is considered stale.
    pub service_cache_days: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_ports: "1-1000".to_string(),
            default_concurrency: 100,
            default_timeout_secs: 1.0,
            default_banner_timeout_secs: None,
            default_output_format: "plain".to_string(),
            services: HashMap::new(),
            service_csv: None,
            service_cache_days: DEFAULT_CACHE_DAYS,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    ///
    /// A missing file (or no resolvable home directory) yields the defaults;
    /// a file that exists but cannot be read or parsed is an error.
    pub fn load() -> ConfigResult<Self> {
        let file = match Paths::new() {
            Ok(paths) => paths.settings_file(),
            Err(e) => {
                tracing::warn!(error = %e, "using built-in settings");
                return Ok(Self::default());
            }
        };

        if !file.exists() {
            tracing::debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings = serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

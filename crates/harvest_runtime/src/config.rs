//! Harvest settings
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variable: `HARVEST_CONFIG=/path/to/harvest.toml`
//! 2. Config file: `harvest.toml` in the working directory
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! [search]
//! interval_secs = 1.0
//! allowed = true
//!
//! [ui]
//! ping_timeout_secs = 5.0
//!
//! [collections]
//! enabled = true
//! directory = "Data/SKSE/Plugins"
//! file_pattern = "-collections.json"
//! reconcile_interval_secs = 5.0
//!
//! [value_weight]
//! default_threshold = 5.0
//! ammo_threshold = 10.0
//! valuable_threshold = 500.0
//!
//! [value_weight.thresholds]
//! clutter = 10.0
//!
//! [exceptions]
//! path = "harvest-exceptions.toml"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use harvest_data::{ExceptionTable, ValueWeightSettings};
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

/// Environment variable naming the settings file
pub const CONFIG_ENV: &str = "HARVEST_CONFIG";
/// Settings file looked up when the environment names none
pub const DEFAULT_CONFIG_FILE: &str = "harvest.toml";

/// Background search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Seconds between scan passes
    pub interval_secs: f64,
    /// Scanning enabled at startup
    pub allowed: bool,
    /// Recorded collection members still count as collectible
    pub record_dups: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1.0,
            allowed: true,
            record_dups: false,
        }
    }
}

/// Host UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How long to wait for the UI readiness answer
    pub ping_timeout_secs: f64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { ping_timeout_secs: 5.0 }
    }
}

/// Collection loading settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    pub enabled: bool,
    /// Directory holding definition files
    pub directory: PathBuf,
    /// File name suffix of definition files
    pub file_pattern: String,
    /// Minimum seconds between inventory sweeps
    pub reconcile_interval_secs: f64,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("Data/SKSE/Plugins"),
            file_pattern: ".json".to_string(),
            reconcile_interval_secs: 5.0,
        }
    }
}

/// Known exception table settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionsConfig {
    /// Optional TOML file of extra exceptions
    pub path: Option<PathBuf>,
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub search: SearchConfig,
    pub ui: UiConfig,
    pub collections: CollectionsConfig,
    pub value_weight: ValueWeightSettings,
    pub exceptions: ExceptionsConfig,
    pub logging: LoggingConfig,
    /// File the settings came from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl HarvestConfig {
    /// Load settings from the environment, the default file or defaults
    pub fn load() -> Self {
        let explicit = std::env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty()).map(PathBuf::from);
        Self::load_with(explicit.as_deref(), Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from `explicit` if given, else `fallback` if present, else
    /// defaults. A file that fails to parse is logged and skipped.
    pub fn load_with(explicit: Option<&Path>, fallback: &Path) -> Self {
        let candidates = explicit.into_iter().chain(std::iter::once(fallback));
        for path in candidates {
            if !path.exists() {
                if Some(path) == explicit {
                    log::warn!("{} names {}, which does not exist", CONFIG_ENV, path.display());
                }
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => {
                    log::info!("Loaded settings from {}", path.display());
                    return config;
                }
                Err(e) => log::error!("{}", e),
            }
        }
        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn load_from_file(path: &Path) -> RuntimeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RuntimeError::config(path, e))?;
        let mut config = Self::from_toml_str(&content).map_err(|e| RuntimeError::config(path, e))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn search_interval(&self) -> Duration {
        secs(self.search.interval_secs, 1.0)
    }

    pub fn ping_timeout(&self) -> Duration {
        secs(self.ui.ping_timeout_secs, 5.0)
    }

    pub fn reconcile_interval(&self) -> Duration {
        secs(self.collections.reconcile_interval_secs, 5.0)
    }

    /// Exception table from the configured file, empty when none is set.
    /// A relative path is resolved against the settings file's directory.
    pub fn load_exceptions(&self) -> RuntimeResult<ExceptionTable> {
        let Some(path) = &self.exceptions.path else {
            return Ok(ExceptionTable::new());
        };
        let path = match (&self.config_path, path.is_relative()) {
            (Some(config), true) => config.parent().map(|dir| dir.join(path)).unwrap_or_else(|| path.clone()),
            _ => path.clone(),
        };
        Ok(ExceptionTable::load(path)?)
    }

    /// Log the effective settings
    pub fn print_summary(&self) {
        log::info!("Harvest settings:");
        log::info!(
            "  Search: every {:.2}s, allowed={}",
            self.search.interval_secs,
            self.search.allowed
        );
        log::info!(
            "  Collections: enabled={} dir={} pattern={}",
            self.collections.enabled,
            self.collections.directory.display(),
            self.collections.file_pattern
        );
        log::info!(
            "  Value/weight: default={} ammo={} valuable={}",
            self.value_weight.default_threshold,
            self.value_weight.ammo_threshold,
            self.value_weight.valuable_threshold
        );
        if let Some(path) = &self.config_path {
            log::info!("  Config file: {}", path.display());
        }
    }
}

fn secs(value: f64, fallback: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::from_secs_f64(fallback)
    }
}

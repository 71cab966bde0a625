//! Configuration loading and root folder resolution
//!
//! Two tiers:
//! 1. **TOML bootstrap**: database path, port, logging, XP tuning. Read once
//!    at startup; a missing file is not an error.
//! 2. **Compiled defaults**: used for anything the TOML file leaves out.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LEVELUP_ROOT_FOLDER`, then `LEVELUP_ROOT`)
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port for the XP coordinator service
pub const DEFAULT_PORT: u16 = 5780;

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "levelup.db";

/// Compiled-in fallbacks for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
            log_file: None,
            port: DEFAULT_PORT,
        }
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file; defaults to `<root>/levelup.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root folder for the database and assets
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// XP rates and multiplier tuning
    #[serde(default)]
    pub xp: XpConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            port: default_port(),
            root_folder: None,
            logging: LoggingConfig::default(),
            xp: XpConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML configuration: {}", e)))?;
        config.xp.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration if the file exists, otherwise fall back to defaults
    ///
    /// A missing file only logs a warning; a file that fails to parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Base XP granted per trigger source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpSources {
    #[serde(default = "default_audio_drop")]
    pub audio_drop: u64,
    #[serde(default = "default_audio_build_up")]
    pub audio_build_up: u64,
    #[serde(default = "default_manual_trigger")]
    pub manual_trigger: u64,
}

impl Default for XpSources {
    fn default() -> Self {
        Self {
            audio_drop: default_audio_drop(),
            audio_build_up: default_audio_build_up(),
            manual_trigger: default_manual_trigger(),
        }
    }
}

/// Combo and time-bonus tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpMultipliers {
    /// Ceiling for the combo multiplier
    #[serde(default = "default_combo_max")]
    pub combo_max: f64,
    /// Inactivity window after which the combo resets
    #[serde(default = "default_combo_decay_ms")]
    pub combo_decay_ms: u64,
    /// Added to the multiplier per minute since session start
    #[serde(default = "default_time_bonus_per_minute")]
    pub time_bonus_per_minute: f64,
}

impl Default for XpMultipliers {
    fn default() -> Self {
        Self {
            combo_max: default_combo_max(),
            combo_decay_ms: default_combo_decay_ms(),
            time_bonus_per_minute: default_time_bonus_per_minute(),
        }
    }
}

/// XP configuration, immutable for the life of the process
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct XpConfig {
    #[serde(default)]
    pub sources: XpSources,
    #[serde(default)]
    pub multipliers: XpMultipliers,
}

impl XpConfig {
    pub fn validate(&self) -> Result<()> {
        let m = &self.multipliers;
        if !m.combo_max.is_finite() || m.combo_max < 1.0 {
            return Err(Error::Config(format!(
                "xp.multipliers.combo_max must be >= 1.0 (got {})",
                m.combo_max
            )));
        }
        if m.combo_decay_ms == 0 {
            return Err(Error::Config(
                "xp.multipliers.combo_decay_ms must be greater than 0".to_string(),
            ));
        }
        if !m.time_bonus_per_minute.is_finite() || m.time_bonus_per_minute < 0.0 {
            return Err(Error::Config(format!(
                "xp.multipliers.time_bonus_per_minute must be >= 0 (got {})",
                m.time_bonus_per_minute
            )));
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_audio_drop() -> u64 {
    2
}

fn default_audio_build_up() -> u64 {
    1
}

fn default_manual_trigger() -> u64 {
    10
}

fn default_combo_max() -> f64 {
    2.0
}

fn default_combo_decay_ms() -> u64 {
    5000
}

fn default_time_bonus_per_minute() -> f64 {
    0.1
}

/// Resolves the root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_toml_root(mut self, toml_root: Option<PathBuf>) -> Self {
        self.toml_root = toml_root;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in ["LEVELUP_ROOT_FOLDER", "LEVELUP_ROOT"] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        let default = CompiledDefaults::for_current_platform().root_folder;
        info!(
            "{}: no root folder configured, using default {}",
            self.module_name,
            default.display()
        );
        default
    }
}

/// Prepares the resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Create the root folder if needed (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            info!("Creating root folder {}", self.root_folder.display());
        }
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }
}

/// Default configuration file path for a module
///
/// `<config dir>/levelup/<module>.toml`, e.g. `~/.config/levelup/levelup-xp.toml`.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("levelup").join(format!("{}.toml", module_name)))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("levelup"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\levelup"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("levelup"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/levelup"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join("levelup"))
            .unwrap_or_else(|| PathBuf::from("./levelup_data"))
    }
}

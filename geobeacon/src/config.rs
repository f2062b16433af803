//! Configuration file handling for ~/.geobeacon/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Missing files
//! and missing keys fall back to defaults; malformed values are errors.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Default collector endpoint (a self-hosted collector on this machine).
pub const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:8080/points";

/// Default collector request timeout in seconds.
pub const DEFAULT_COLLECTOR_TIMEOUT_SECS: u64 = 10;

/// Default sampling interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 2000;

/// Default UDP port for GPS forwarder datagrams.
pub const DEFAULT_UDP_PORT: u16 = 10110;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write the config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create the config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Collector settings (`[collector]` section).
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    /// Collector endpoint URL.
    pub url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Position source settings (`[position]` section).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSettings {
    /// Sampling interval in milliseconds.
    pub interval_ms: u64,

    /// UDP port for GPS forwarder datagrams.
    pub udp_port: u16,
}

/// Logging settings (`[logging]` section).
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path.
    pub file: PathBuf,
}

/// The full configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub collector: CollectorSettings,
    pub position: PositionSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            collector: CollectorSettings {
                url: DEFAULT_COLLECTOR_URL.to_string(),
                timeout_secs: DEFAULT_COLLECTOR_TIMEOUT_SECS,
            },
            position: PositionSettings {
                interval_ms: DEFAULT_INTERVAL_MS,
                udp_port: DEFAULT_UDP_PORT,
            },
            logging: LoggingSettings {
                file: config_directory().join("logs").join("geobeacon.log"),
            },
        }
    }
}

impl ConfigFile {
    /// Load configuration from the default path (~/.geobeacon/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_config_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Serialize to INI text.
    fn to_config_string(&self) -> String {
        format!(
            "[collector]\n\
             url = {}\n\
             timeout_secs = {}\n\
             \n\
             [position]\n\
             interval_ms = {}\n\
             udp_port = {}\n\
             \n\
             [logging]\n\
             file = {}\n",
            self.collector.url,
            self.collector.timeout_secs,
            self.position.interval_ms,
            self.position.udp_port,
            self.logging.file.display(),
        )
    }
}

/// Parse a loaded INI document, falling back to defaults for missing keys.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let defaults = ConfigFile::default();

    let url = ini
        .get_from(Some("collector"), "url")
        .map(str::to_string)
        .unwrap_or(defaults.collector.url);
    let timeout_secs = parse_value(
        ini,
        "collector",
        "timeout_secs",
        defaults.collector.timeout_secs,
    )?;
    let interval_ms = parse_value(
        ini,
        "position",
        "interval_ms",
        defaults.position.interval_ms,
    )?;
    let udp_port = parse_value(ini, "position", "udp_port", defaults.position.udp_port)?;
    let file = ini
        .get_from(Some("logging"), "file")
        .map(PathBuf::from)
        .unwrap_or(defaults.logging.file);

    Ok(ConfigFile {
        collector: CollectorSettings { url, timeout_secs },
        position: PositionSettings {
            interval_ms,
            udp_port,
        },
        logging: LoggingSettings { file },
    })
}

/// Parse one numeric key, defaulting when absent and erroring when malformed.
fn parse_value<T: std::str::FromStr>(
    ini: &Ini,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, ConfigFileError> {
    match ini.get_from(Some(section), key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigFileError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                value: raw.to_string(),
                reason: "expected a number".to_string(),
            }),
    }
}

/// Get the path to the config directory (~/.geobeacon).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geobeacon")
}

/// Get the path to the config file (~/.geobeacon/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

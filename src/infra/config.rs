//! Configuration management infrastructure.
//!
//! Verification preferences (record positions, certificate handling, report
//! format) are stored as TOML in the user's configuration directory.

use crate::infra::error::{VerifyError, VerifyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Report formats understood by the CLI.
pub const OUTPUT_FORMATS: [&str; 2] = ["text", "json"];

/// Application configuration with all verification preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfiguration {
    /// Where the bulletin and log records sit in the file-signature list
    pub record_positions: RecordPositions,

    /// Whether a PEM armoured embedded certificate is accepted
    pub accept_pem_certificates: bool,

    /// Characters of the Common Name that precede the terminal id
    pub terminal_id_prefix_len: usize,

    /// Report format: "text" or "json"
    pub output_format: String,

    /// Whether to show verbose output
    pub verbose: bool,
}

/// Fixed positions of the checked records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPositions {
    pub bulletin_index: usize,
    pub log_index: usize,
}

impl Default for VerifierConfiguration {
    fn default() -> Self {
        Self {
            record_positions: RecordPositions::default(),
            accept_pem_certificates: true,
            terminal_id_prefix_len: 4,
            output_format: "text".to_string(),
            verbose: false,
        }
    }
}

impl Default for RecordPositions {
    fn default() -> Self {
        Self {
            bulletin_index: 0,
            log_index: 10,
        }
    }
}

impl VerifierConfiguration {
    #[must_use]
    pub fn wants_json(&self) -> bool {
        self.output_format.eq_ignore_ascii_case("json")
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> VerifyResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> VerifyResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("urna-verifier").join("config.toml"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("urna-verifier-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> VerifyResult<VerifierConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = VerifierConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file, falling back to defaults when the file
    /// does not exist. Nothing is written.
    pub fn load_or_default(&self) -> VerifyResult<VerifierConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::debug!(
                "No configuration at {}, using defaults",
                self.config_path.display()
            );
            Ok(VerifierConfiguration::default())
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> VerifyResult<VerifierConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            VerifyError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: VerifierConfiguration = toml::from_str(&content).map_err(|e| {
            VerifyError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &VerifierConfiguration) -> VerifyResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VerifyError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            VerifyError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            VerifyError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved successfully");
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(config: &VerifierConfiguration) -> VerifyResult<()> {
        let positions = config.record_positions;
        if positions.bulletin_index == positions.log_index {
            return Err(VerifyError::ConfigurationError(format!(
                "Bulletin and log records cannot share position {}",
                positions.bulletin_index
            )));
        }

        if !OUTPUT_FORMATS
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&config.output_format))
        {
            return Err(VerifyError::ConfigurationError(format!(
                "Invalid output format: {} (expected one of {})",
                config.output_format,
                OUTPUT_FORMATS.join(", ")
            )));
        }

        Ok(())
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> VerifyResult<()> {
        let mut config = self.load_or_create_default()?;

        match key {
            "bulletin_index" | "record_positions.bulletin_index" => {
                config.record_positions.bulletin_index = parse_index(value)?;
            }
            "log_index" | "record_positions.log_index" => {
                config.record_positions.log_index = parse_index(value)?;
            }
            "accept_pem_certificates" => {
                config.accept_pem_certificates = parse_bool(value)?;
            }
            "terminal_id_prefix_len" => {
                config.terminal_id_prefix_len = parse_index(value)?;
            }
            "output_format" => {
                config.output_format = value.to_ascii_lowercase();
            }
            "verbose" => {
                config.verbose = parse_bool(value)?;
            }
            _ => {
                return Err(VerifyError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        Self::validate(&config)?;
        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    pub fn export_config(&self, format: ExportFormat) -> VerifyResult<String> {
        let config = self.load_or_default()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| VerifyError::ConfigurationError(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| VerifyError::ConfigurationError(format!("JSON export failed: {e}"))),
            ExportFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| VerifyError::ConfigurationError(format!("YAML export failed: {e}"))),
        }
    }

    /// Import configuration from a string
    pub fn import_config(&self, content: &str, format: ExportFormat) -> VerifyResult<()> {
        let config: VerifierConfiguration = match format {
            ExportFormat::Toml => toml::from_str(content).map_err(|e| {
                VerifyError::ConfigurationError(format!("TOML import failed: {e}"))
            })?,
            ExportFormat::Json => serde_json::from_str(content).map_err(|e| {
                VerifyError::ConfigurationError(format!("JSON import failed: {e}"))
            })?,
            ExportFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                VerifyError::ConfigurationError(format!("YAML import failed: {e}"))
            })?,
        };

        Self::validate(&config)?;
        self.save(&config)
    }
}

/// Configuration export/import formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Toml,
    Json,
    Yaml,
}

fn parse_index(value: &str) -> VerifyResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| VerifyError::ConfigurationError(format!("Invalid number: {value}")))
}

fn parse_bool(value: &str) -> VerifyResult<bool> {
    value
        .trim()
        .parse()
        .map_err(|_| VerifyError::ConfigurationError(format!("Invalid boolean value: {value}")))
}

//! Probe configuration management
//!
//! Every setting has a built-in default, so running without a config file
//! probes the GIMIC with libusb at info verbosity.

use crate::probe::{GIMIC_PRODUCT_ID, GIMIC_VENDOR_ID};
use crate::usb::backend::parse_libusb_level;
use anyhow::{Context, Result, anyhow};
use rusb::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub target: TargetSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// tracing filter level (trace, debug, info, warn, error)
    #[serde(default = "LoggingSettings::default_level")]
    pub level: String,
    /// libusb debug verbosity (none, error, warning, info, debug)
    #[serde(default = "LoggingSettings::default_libusb_level")]
    pub libusb_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            libusb_level: Self::default_libusb_level(),
        }
    }
}

impl LoggingSettings {
    fn default_level() -> String {
        "warn".to_string()
    }

    fn default_libusb_level() -> String {
        "info".to_string()
    }
}

/// Device to probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSettings {
    #[serde(default = "TargetSettings::default_vendor_id")]
    pub vendor_id: u16,
    #[serde(default = "TargetSettings::default_product_id")]
    pub product_id: u16,
}

impl Default for TargetSettings {
    fn default() -> Self {
        Self {
            vendor_id: GIMIC_VENDOR_ID,
            product_id: GIMIC_PRODUCT_ID,
        }
    }
}

impl TargetSettings {
    fn default_vendor_id() -> u16 {
        GIMIC_VENDOR_ID
    }

    fn default_product_id() -> u16 {
        GIMIC_PRODUCT_ID
    }
}

impl ProbeConfig {
    /// Load configuration from file
    ///
    /// Without an explicit path the default location is tried.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => {
                let p = Self::default_path();
                if !p.exists() {
                    return Err(anyhow!("No configuration file found, using defaults"));
                }
                p
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: ProbeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or fall back to defaults
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("gimic-usb-test").join("probe.toml")
        } else {
            PathBuf::from(".config/gimic-usb-test/probe.toml")
        }
    }

    /// libusb verbosity for the session
    pub fn libusb_log_level(&self) -> LogLevel {
        parse_libusb_level(&self.logging.libusb_level).unwrap_or(LogLevel::Info)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        if parse_libusb_level(&self.logging.libusb_level).is_none() {
            return Err(anyhow!(
                "Invalid libusb log level '{}', must be one of: none, error, warning, info, debug",
                self.logging.libusb_level
            ));
        }

        if self.target.vendor_id == 0 {
            return Err(anyhow!("Target vendor_id must not be 0"));
        }

        Ok(())
    }
}

/// Load configuration from a path that may start with `~`
pub fn load_config(path: &str) -> Result<ProbeConfig> {
    let path_buf = PathBuf::from(shellexpand::tilde(path).as_ref());
    ProbeConfig::load(Some(path_buf))
}

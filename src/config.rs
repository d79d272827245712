//! Configuration management for shellypv
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. The file location can be overridden with the
//! `SHELLYPV_CONFIG` environment variable.

use crate::error::{Result, ShellyPvError};
use crate::mapper::{EnergyDirection, Line, PhaseConfig, SourcePhase};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

mod defaults;

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device instance for D-Bus service naming
    pub device_instance: u32,

    /// Name shown on the GX device and in VRM
    pub custom_name: String,

    /// Require D-Bus to be available; fail fast on startup if unavailable
    #[serde(default = "default_true")]
    pub require_dbus: bool,

    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,

    /// Period of the "sign of life" summary log in seconds (0 disables it)
    pub sign_of_life_interval_s: u64,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Shelly HTTP connection
    pub shelly: ShellyConfig,

    /// How the meter reading is presented as a PV inverter
    pub pvinverter: PvInverterConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub level: String,

    /// Optional console-specific level; falls back to `level`
    pub console_level: Option<String>,

    /// Optional file-specific level; falls back to `level`
    pub file_level: Option<String>,

    /// Log file path; rotated daily as `<stem>.<date>.log` next to it
    pub file: String,

    /// Number of rotated daily files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Shelly Pro 3EM connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellyConfig {
    /// Host name or IP address, optionally with `:port`
    pub host: String,

    /// HTTP basic auth user (empty for none)
    pub username: String,

    /// HTTP basic auth password (empty for none)
    pub password: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

/// PV inverter presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PvInverterConfig {
    /// AC position: 0 = AC input 1, 1 = AC output, 2 = AC input 2
    pub position: u8,

    /// Meter phase to read: A, B, C or OFF
    pub phase: String,

    /// Inverter line the reading is published on: L1, L2 or L3
    pub phase_destination: String,

    /// Negate power and current before publishing
    #[serde(deserialize_with = "bool_or_flag")]
    pub invert_power_sign: bool,

    /// Energy counter mapping: "direct" or "return"
    pub energy_type: String,

    /// Value of /Ac/MaxPower in watts
    pub max_power_w: f64,
}

/// Accept `true`/`false` as well as the `0`/`1` flags of older configs
fn bool_or_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Text(s) if s.trim() == "0" || s.trim().eq_ignore_ascii_case("false") => Ok(false),
        Flag::Text(s) if s.trim() == "1" || s.trim().eq_ignore_ascii_case("true") => Ok(true),
        _ => Err(serde::de::Error::custom(
            "invert_power_sign must be one of 0, 1, true, false",
        )),
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `SHELLYPV_CONFIG` or the default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os("SHELLYPV_CONFIG") {
            return Self::from_file(path);
        }

        let default_paths = [
            "shellypv_config.yaml",
            "/data/shellypv/config.yaml",
            "/etc/shellypv/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.shelly.host.trim().is_empty() {
            return Err(ShellyPvError::validation(
                "shelly.host",
                "Host cannot be empty",
            ));
        }

        if self.shelly.timeout_ms == 0 {
            return Err(ShellyPvError::validation(
                "shelly.timeout_ms",
                "Must be greater than 0",
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(ShellyPvError::validation(
                "poll_interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.pvinverter.position > 2 {
            return Err(ShellyPvError::validation(
                "pvinverter.position",
                "Must be 0 (AC input 1), 1 (AC output) or 2 (AC input 2)",
            ));
        }

        let base_level = crate::logging::parse_log_level(&self.logging.level)?;
        crate::logging::layer_level(self.logging.console_level.as_deref(), base_level)?;
        crate::logging::layer_level(self.logging.file_level.as_deref(), base_level)?;
        self.phase_config()?;

        Ok(())
    }

    /// Resolve the typed phase mapping
    ///
    /// An invalid source phase or destination line is fatal. An unknown
    /// energy type falls back to `direct` with a warning.
    pub fn phase_config(&self) -> Result<PhaseConfig> {
        let source: SourcePhase = self.pvinverter.phase.parse()?;
        let destination: Line = self.pvinverter.phase_destination.parse()?;
        let energy_direction = match self.pvinverter.energy_type.parse::<EnergyDirection>() {
            Ok(direction) => direction,
            Err(e) => {
                tracing::warn!("{}; using 'direct'", e);
                EnergyDirection::Direct
            }
        };

        Ok(PhaseConfig {
            source,
            destination,
            invert_sign: self.pvinverter.invert_power_sign,
            energy_direction,
        })
    }

    /// Well-known D-Bus name of the service
    pub fn service_name(&self) -> String {
        format!("com.victronenergy.pvinverter.http_{:02}", self.device_instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.shelly.timeout_ms, 5000);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.pvinverter.phase, "A");
        assert!(config.require_dbus);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.shelly.host = String::new();
        assert!(config.validate().is_err());

        config = Config::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.pvinverter.position = 3;
        assert!(config.validate().is_err());

        config = Config::default();
        config.pvinverter.phase = "D".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.pvinverter.phase_destination = "L4".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "LOUD".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.console_level = Some("DEBUG".to_string());
        config.logging.file_level = Some("warning".to_string());
        assert!(config.validate().is_ok());
        config.logging.file_level = Some("chatty".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn phase_config_parses_case_insensitively() {
        let mut config = Config::default();
        config.pvinverter.phase = "b".to_string();
        config.pvinverter.phase_destination = "l3".to_string();
        config.pvinverter.energy_type = "RETURN".to_string();
        config.pvinverter.invert_power_sign = true;

        let pc = config.phase_config().unwrap();
        assert_eq!(pc.source, SourcePhase::B);
        assert_eq!(pc.destination, Line::L3);
        assert_eq!(pc.energy_direction, EnergyDirection::Return);
        assert!(pc.invert_sign);
    }

    #[test]
    fn unknown_energy_type_falls_back_to_direct() {
        let mut config = Config::default();
        config.pvinverter.energy_type = "sideways".to_string();
        let pc = config.phase_config().unwrap();
        assert_eq!(pc.energy_direction, EnergyDirection::Direct);
    }

    #[test]
    fn off_source_is_valid() {
        let mut config = Config::default();
        config.pvinverter.phase = "OFF".to_string();
        assert_eq!(config.phase_config().unwrap().source, SourcePhase::Off);
    }

    #[test]
    fn invert_flag_accepts_legacy_integers() {
        let yaml = "pvinverter:\n  invert_power_sign: 1\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.pvinverter.invert_power_sign);

        let yaml = "pvinverter:\n  invert_power_sign: \"0\"\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.pvinverter.invert_power_sign);

        let yaml = "pvinverter:\n  invert_power_sign: 2\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn service_name_pads_instance() {
        let mut config = Config::default();
        config.device_instance = 7;
        assert_eq!(config.service_name(), "com.victronenergy.pvinverter.http_07");
    }
}

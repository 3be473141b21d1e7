//! Configuration loading — TOML site file with environment variable overrides.
//!
//! Looks for `roomjoin.toml` in the working directory, or at the path given
//! by `ROOMJOIN_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::collections::HashSet;

use serde::Deserialize;

use roomjoin_domain::partition::PartitionFeedback;

const DEFAULT_PATH: &str = "roomjoin.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Composite room settings.
    pub combine: CombineConfig,
    /// Simple rooms and their grid positions.
    pub rooms: Vec<RoomConfig>,
    /// Virtual partition controls.
    pub controls: Vec<ControlConfig>,
    /// Partitions between rooms.
    pub partitions: Vec<PartitionConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Name given to composite rooms.
    pub room_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RoomConfig {
    pub name: String,
    pub column: i32,
    pub row: i32,
    /// Lower values are preferred as master room.
    #[serde(default)]
    pub combine_priority: i32,
}

#[derive(Debug, Deserialize)]
pub struct ControlConfig {
    pub name: String,
    /// Initial physical state.
    #[serde(default)]
    pub open: bool,
}

#[derive(Debug, Deserialize)]
pub struct PartitionConfig {
    pub name: String,
    /// Names of the one or two rooms the partition separates.
    #[serde(default)]
    pub rooms: Vec<String>,
    #[serde(default)]
    pub controls: Vec<PartitionControlConfig>,
}

#[derive(Debug, Deserialize)]
pub struct PartitionControlConfig {
    /// Name of a `[[controls]]` entry.
    pub control: String,
    #[serde(default = "default_feedback")]
    pub feedback: PartitionFeedback,
}

fn default_feedback() -> PartitionFeedback {
    PartitionFeedback::GET_SET
}

impl Config {
    /// Load configuration from `roomjoin.toml` (or `ROOMJOIN_CONFIG`) if
    /// present, then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// site it describes is inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ROOMJOIN_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ROOMJOIN_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.combine.room_name.trim().is_empty() {
            return invalid("combine.room_name must not be empty");
        }

        let mut room_names = HashSet::new();
        let mut positions = HashSet::new();
        for room in &self.rooms {
            if room.name.trim().is_empty() {
                return invalid("room names must not be empty");
            }
            if !room_names.insert(room.name.as_str()) {
                return invalid(format!("room {:?} is declared twice", room.name));
            }
            if !positions.insert((room.column, room.row)) {
                return invalid(format!(
                    "position ({}, {}) holds more than one room",
                    room.column, room.row
                ));
            }
        }

        let mut control_names = HashSet::new();
        for control in &self.controls {
            if !control_names.insert(control.name.as_str()) {
                return invalid(format!("control {:?} is declared twice", control.name));
            }
        }

        let mut partition_names = HashSet::new();
        for partition in &self.partitions {
            if !partition_names.insert(partition.name.as_str()) {
                return invalid(format!("partition {:?} is declared twice", partition.name));
            }
            if partition.rooms.len() > 2 {
                return invalid(format!(
                    "partition {:?} separates more than two rooms",
                    partition.name
                ));
            }
            if let Some(room) = partition
                .rooms
                .iter()
                .find(|room| !room_names.contains(room.as_str()))
            {
                return invalid(format!(
                    "partition {:?} references unknown room {room:?}",
                    partition.name
                ));
            }
            if let Some(control) = partition
                .controls
                .iter()
                .find(|c| !control_names.contains(c.control.as_str()))
            {
                return invalid(format!(
                    "partition {:?} references unknown control {:?}",
                    partition.name, control.control
                ));
            }
        }
        Ok(())
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T, ConfigError> {
    Err(ConfigError::Validation(message.into()))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "roomjoind=info,roomjoin_app=info".to_string(),
        }
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            room_name: "Combined Room".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

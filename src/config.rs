//! Engine configuration.
//!
//! Every tunable the engine consults is carried here and passed in
//! explicitly; the engine keeps no ambient settings.
//!
//! # Example
//!
//! ```
//! use exam_schedule::config::{CapacityPolicy, EngineConfig};
//! use std::time::Duration;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     max_students_per_room = 25
//!     capacity_policy = "uniform"
//!     balance_invigilator_load = true
//!
//!     [batch]
//!     max_nodes = 5000
//!     time_limit_ms = 2000
//! "#).unwrap();
//!
//! assert_eq!(config.capacity_policy, CapacityPolicy::Uniform);
//! assert_eq!(config.batch.time_limit(), Some(Duration::from_millis(2000)));
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Room, STANDARD_ROOM_CAPACITY};

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where a room's seat limit comes from when splitting students.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// The room's own capacity; `default_room_capacity` when it has none.
    #[default]
    RoomCapacity,
    /// `max_students_per_room` for every room, ignoring room capacities.
    Uniform,
}

/// Main engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Per-room cap under [`CapacityPolicy::Uniform`].
    pub max_students_per_room: u32,
    /// Fallback for rooms without a capacity under
    /// [`CapacityPolicy::RoomCapacity`].
    pub default_room_capacity: u32,
    /// Source of per-room seat limits.
    pub capacity_policy: CapacityPolicy,
    /// Prefer eligible invigilators with the fewest existing assignments.
    pub balance_invigilator_load: bool,
    /// Batch solver limits.
    pub batch: BatchConfig,
}

/// Batch solver search limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BatchConfig {
    /// Maximum search nodes (value trials) before giving up.
    pub max_nodes: u64,
    /// Optional wall-clock limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_students_per_room: STANDARD_ROOM_CAPACITY,
            default_room_capacity: STANDARD_ROOM_CAPACITY,
            capacity_policy: CapacityPolicy::RoomCapacity,
            balance_invigilator_load: false,
            batch: BatchConfig::default(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_nodes: 100_000,
            time_limit_ms: None,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no search could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_students_per_room == 0 {
            return Err(ConfigError::Invalid(
                "max_students_per_room must be positive".into(),
            ));
        }
        if self.default_room_capacity == 0 {
            return Err(ConfigError::Invalid(
                "default_room_capacity must be positive".into(),
            ));
        }
        if self.batch.max_nodes == 0 {
            return Err(ConfigError::Invalid("batch.max_nodes must be positive".into()));
        }
        Ok(())
    }

    /// Sets a uniform per-room cap.
    pub fn with_uniform_capacity(mut self, max_students_per_room: u32) -> Self {
        self.capacity_policy = CapacityPolicy::Uniform;
        self.max_students_per_room = max_students_per_room;
        self
    }

    /// Enables or disables invigilator load balancing.
    pub fn with_load_balancing(mut self, enabled: bool) -> Self {
        self.balance_invigilator_load = enabled;
        self
    }

    /// Sets the batch node budget.
    pub fn with_max_nodes(mut self, max_nodes: u64) -> Self {
        self.batch.max_nodes = max_nodes;
        self
    }

    /// Sets the batch time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.batch.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    /// Seat limit for a room under the configured policy.
    pub fn room_capacity(&self, room: &Room) -> u32 {
        match self.capacity_policy {
            CapacityPolicy::RoomCapacity => room.capacity_or(self.default_room_capacity),
            CapacityPolicy::Uniform => self.max_students_per_room,
        }
    }
}

impl BatchConfig {
    /// Wall-clock limit, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

//! Agent configuration with documented constants
//!
//! All magic numbers of the control loop are collected here. The file
//! format is TOML; every field is optional and falls back to the
//! defaults below.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{AgentError, Result};
use crate::sensory::detector::DetectorSpec;
use crate::world::sim::SimWorldConfig;

/// Configuration for the control loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    // === PERCEPTION ===
    /// Radius (world units) within which a thing counts as "ahead"
    ///
    /// The first thing found inside this radius preempts all further
    /// classification for the tick, and is the only candidate for COLLECT.
    pub proximity_threshold: f64,

    /// Fuel level at or below which food becomes salient
    pub low_fuel_threshold: f64,

    /// Fuel level that maps to a health of 1.0
    pub max_fuel: f64,

    // === EFFECTORS ===
    /// Wheel speed used while rotating in place
    pub rotate_speed: f64,

    /// Speed used when moving towards food or a jewel
    pub move_speed: f64,

    // === TIMING ===
    /// Period of the control loop in milliseconds
    pub tick_period_ms: u64,

    /// Upper bound for one snapshot fetch in milliseconds
    ///
    /// A fetch exceeding this bound is treated as "no update this tick".
    /// Together with `dispatch_timeout_ms` it must fit in one tick period.
    pub fetch_timeout_ms: u64,

    /// Upper bound for dispatching one tick's effector calls in milliseconds
    pub dispatch_timeout_ms: u64,

    // === DETECTORS ===
    /// Feature detectors evaluated against the sensory cache
    pub detectors: Vec<DetectorSpec>,

    /// Parameters of the built-in simulated world
    pub sim: SimWorldConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 50.0,
            low_fuel_threshold: 300.0,
            max_fuel: 1000.0,

            rotate_speed: 1.0,
            move_speed: 3.0,

            tick_period_ms: 100,
            fetch_timeout_ms: 45,
            dispatch_timeout_ms: 45,

            detectors: DetectorSpec::defaults(),
            sim: SimWorldConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.proximity_threshold < 0.0 {
            return Err(format!(
                "proximity_threshold ({}) must not be negative",
                self.proximity_threshold
            ));
        }

        if self.max_fuel <= 0.0 {
            return Err(format!("max_fuel ({}) must be positive", self.max_fuel));
        }

        if self.low_fuel_threshold < 0.0 || self.low_fuel_threshold > self.max_fuel {
            return Err(format!(
                "low_fuel_threshold ({}) must lie within 0..={}",
                self.low_fuel_threshold, self.max_fuel
            ));
        }

        if self.tick_period_ms == 0 {
            return Err("tick_period_ms must be positive".into());
        }

        // Fetch and dispatch together must fit inside one period
        let boundary_ms = self.fetch_timeout_ms + self.dispatch_timeout_ms;
        if boundary_ms > self.tick_period_ms {
            return Err(format!(
                "fetch_timeout_ms + dispatch_timeout_ms ({}) should be <= tick_period_ms ({})",
                boundary_ms, self.tick_period_ms
            ));
        }

        for spec in &self.detectors {
            spec.validate()?;
        }

        Ok(())
    }
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate config text
pub fn parse_config(contents: &str) -> Result<AgentConfig> {
    let config: AgentConfig = toml::from_str(contents)?;
    config.validate().map_err(AgentError::InvalidConfig)?;
    Ok(config)
}

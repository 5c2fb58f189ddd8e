//! Configuration loading. Every section and field has a default, so an empty file is a
//! valid configuration.

use crate::error::{NavError, Result};
use crate::executor::ExecutorConfig;
use crate::heading::Heading;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub grid: GridSection,
    pub executor: ExecutorSection,
    pub simulation: SimulationSection,
    pub interchange: InterchangeSection,
    pub navigator: NavigatorSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GridSection {
    /// Edge length N of the N×N grid (default: 3)
    #[serde(default = "default_grid_size")]
    pub size: usize,

    /// Physical edge length of one cell in millimetres (default: 300)
    #[serde(default = "default_cell_mm")]
    pub cell_mm: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ExecutorSection {
    /// Facing of the agent at the start of the first run (default: north)
    #[serde(default)]
    pub initial_heading: Heading,

    /// Sum of both obstacle sensors above which an obstacle is reported (default: 0)
    #[serde(default)]
    pub obstacle_threshold: u32,

    /// Drive speed setting (default: 100)
    #[serde(default = "default_speed")]
    pub speed: u8,

    /// Maximum time to wait for one motion to finish in milliseconds (default: 10000)
    #[serde(default = "default_motion_timeout")]
    pub motion_timeout_ms: u64,

    /// Interval between motion-finished polls in milliseconds (default: 10)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimulationSection {
    /// Polls a simulated motion takes before it reports completion (default: 0)
    #[serde(default)]
    pub motion_polls: u32,

    /// Polls a simulated sensor read takes before a reading is available (default: 0)
    #[serde(default)]
    pub sensor_polls: u32,

    /// Reading each simulated sensor reports when an obstacle is ahead (default: 100)
    #[serde(default = "default_sensor_value")]
    pub sensor_value: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InterchangeSection {
    /// Directory holding the interchange files (default: ".")
    #[serde(default = "default_interchange_dir")]
    pub dir: String,

    #[serde(default = "default_grid_file")]
    pub grid_file: String,

    #[serde(default = "default_path_file")]
    pub path_file: String,

    #[serde(default = "default_replan_file")]
    pub replan_file: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NavigatorSection {
    /// Replans allowed per navigation before giving up (default: 3)
    #[serde(default = "default_max_replans")]
    pub max_replans: usize,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
            cell_mm: default_cell_mm(),
        }
    }
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            initial_heading: Heading::default(),
            obstacle_threshold: 0,
            speed: default_speed(),
            motion_timeout_ms: default_motion_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            motion_polls: 0,
            sensor_polls: 0,
            sensor_value: default_sensor_value(),
        }
    }
}

impl Default for InterchangeSection {
    fn default() -> Self {
        Self {
            dir: default_interchange_dir(),
            grid_file: default_grid_file(),
            path_file: default_path_file(),
            replan_file: default_replan_file(),
        }
    }
}

impl Default for NavigatorSection {
    fn default() -> Self {
        Self {
            max_replans: default_max_replans(),
        }
    }
}

// Default value functions
fn default_grid_size() -> usize {
    3
}
fn default_cell_mm() -> f64 {
    300.0
}
fn default_speed() -> u8 {
    100
}
fn default_motion_timeout() -> u64 {
    10_000
}
fn default_poll_interval() -> u64 {
    10
}
fn default_sensor_value() -> u32 {
    100
}
fn default_interchange_dir() -> String {
    ".".to_string()
}
fn default_grid_file() -> String {
    "grid.json".to_string()
}
fn default_path_file() -> String {
    "path.json".to_string()
}
fn default_replan_file() -> String {
    "replan_request.json".to_string()
}
fn default_max_replans() -> usize {
    3
}

impl NavConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: NavConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.size == 0 {
            return Err(NavError::Config("grid.size must be positive".into()));
        }
        if !(self.grid.cell_mm.is_finite() && self.grid.cell_mm > 0.0) {
            return Err(NavError::Config("grid.cell_mm must be positive".into()));
        }
        if self.executor.motion_timeout_ms == 0 {
            return Err(NavError::Config(
                "executor.motion_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            initial_heading: self.executor.initial_heading,
            obstacle_threshold: self.executor.obstacle_threshold,
            speed: self.executor.speed,
            motion_timeout: Duration::from_millis(self.executor.motion_timeout_ms),
            poll_interval: Duration::from_millis(self.executor.poll_interval_ms),
        }
    }
}

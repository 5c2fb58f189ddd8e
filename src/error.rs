//! Error types for planning, interchange and path execution.

use std::time::Duration;

use crate::cell::Cell;

/// Errors produced anywhere in the planning/execution pipeline.
///
/// Planning errors ([InvalidGrid](NavError::InvalidGrid),
/// [InvalidQuery](NavError::InvalidQuery)) are raised before any drive resource is acquired.
/// Drive errors ([Connection](NavError::Connection), [DriveTimeout](NavError::DriveTimeout),
/// [Sensor](NavError::Sensor)) abort the current run after the drive has been stopped and
/// disconnected.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum NavError {
    /// Malformed grid specification: wrong value count or values outside {0,1}.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Start or goal is out of bounds or on a blocked cell.
    #[error("invalid query: {endpoint} {cell} {reason}")]
    InvalidQuery {
        endpoint: &'static str,
        cell: Cell,
        reason: &'static str,
    },

    /// The query was valid but no route connects start and goal.
    #[error("no path found from {start} to {goal}")]
    NoPathFound { start: Cell, goal: Cell },

    /// The drive collaborator could not be reached.
    #[error("drive connection failed: {0}")]
    Connection(String),

    /// A motion command did not report completion in time.
    #[error("drive did not finish {command} within {timeout:?}")]
    DriveTimeout {
        command: String,
        timeout: Duration,
    },

    /// The obstacle sensors could not be read.
    #[error("sensor read failed: {0}")]
    Sensor(String),

    /// A replan request was published before the previous one was consumed.
    #[error("replan request for {current} -> {blocked} is still pending")]
    ReplanPending { current: Cell, blocked: Cell },

    /// An interchange record failed validation.
    #[error("invalid interchange record: {0}")]
    Interchange(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NavError {
    /// Whether the error should abort the caller. [NoPathFound](NavError::NoPathFound) is a
    /// normal planning outcome and is the only non-fatal variant.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, NavError::NoPathFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

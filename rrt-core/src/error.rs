//! Error types for the planner core.

use thiserror::Error;

/// Failures of the geometry kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("shape is degenerate (area {area}), centroid is undefined")]
    Degenerate { area: f64 },
}

/// The in-bounds sampling loop ran out of retries.
///
/// Recoverable: the growth engine drops the branch attempt for this step.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no in-bounds branch point found after {retries} retries")]
pub struct SamplingExhausted {
    pub retries: usize,
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by [`crate::planner::Planner`].
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("time {t} does not advance past the last processed time {last}")]
    NonIncreasingTime { t: f64, last: f64 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

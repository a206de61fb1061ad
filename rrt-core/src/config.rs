use std::path::Path;

use glam::DVec2;
use serde::Deserialize;

use crate::error::ConfigError;

/// Tunable parameters of the planner.
///
/// Deserializes from TOML; any field that is left out takes its value from
/// [`Config::default`].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Workspace units travelled per unit of simulated time.
    pub traversal_rate: f64,
    pub branch_len_min: f64,
    pub branch_len_max: f64,
    /// Damps the fan-out probability; the smaller, the fewer branches.
    pub branch_weight: f64,
    /// Distance from a new node to the goal that counts as arrival.
    pub success_radius: f64,
    /// Exclusive upper bounds of the workspace. Lower bounds are `0`.
    pub workspace: DVec2,
    pub max_sampling_retries: usize,
    /// Seed for the planner's RNG; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            traversal_rate: 50.0,
            branch_len_min: 20.0,
            branch_len_max: 180.0,
            branch_weight: 10.0,
            success_radius: 50.0,
            workspace: DVec2::new(400.0, 400.0),
            max_sampling_retries: 64,
            seed: None,
        }
    }
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that the parameters describe a usable planner.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.traversal_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "traversal_rate must be positive, got {}",
                self.traversal_rate
            )));
        }
        if !(self.branch_weight > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "branch_weight must be positive, got {}",
                self.branch_weight
            )));
        }
        if !(self.branch_len_min >= 0.0) || !(self.branch_len_min <= self.branch_len_max) {
            return Err(ConfigError::Invalid(format!(
                "branch lengths must satisfy 0 <= min <= max, got [{}, {}]",
                self.branch_len_min, self.branch_len_max
            )));
        }
        if !(self.success_radius >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "success_radius must be non-negative, got {}",
                self.success_radius
            )));
        }
        if !(self.workspace.x > 0.0 && self.workspace.y > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "workspace extents must be positive, got {:?}",
                self.workspace
            )));
        }
        if self.max_sampling_retries == 0 {
            return Err(ConfigError::Invalid(
                "max_sampling_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns `true` if `p` lies strictly inside the workspace.
    pub fn in_bounds(&self, p: DVec2) -> bool {
        p.x > 0.0 && p.x < self.workspace.x && p.y > 0.0 && p.y < self.workspace.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.traversal_rate, 50.0);
        assert_eq!(cfg.workspace, DVec2::new(400.0, 400.0));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg = Config::from_toml_str("branch_weight = 4.0\nseed = 7\n").unwrap();
        assert_eq!(cfg.branch_weight, 4.0);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.branch_len_max, 180.0);
    }

    #[test]
    fn workspace_parses_from_array() {
        let cfg = Config::from_toml_str("workspace = [800.0, 600.0]").unwrap();
        assert_eq!(cfg.workspace, DVec2::new(800.0, 600.0));
    }

    #[test]
    fn inverted_branch_lengths_are_rejected() {
        let err = Config::from_toml_str("branch_len_min = 200.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = Config::from_toml_str("speed = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn bounds_are_exclusive() {
        let cfg = Config::default();
        assert!(cfg.in_bounds(DVec2::new(1.0, 399.0)));
        assert!(!cfg.in_bounds(DVec2::new(0.0, 10.0)));
        assert!(!cfg.in_bounds(DVec2::new(10.0, 400.0)));
    }
}

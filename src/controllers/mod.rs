//! External control policies and the contract they satisfy.
//!
//! Controllers observe the normalized plant state and emit a scalar valve
//! command; the environment clamps it to [0, 1]. Variants are selected by a
//! factory keyed by name (`"pid"`, `"fuzzy"`) or by a `.toml` path holding a
//! learned linear policy.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{ConfigError, PlantConfig};

/// Fuzzy-logic incremental valve controller.
pub mod fuzzy;
/// PID speed governor.
pub mod pid;
/// Learned-policy wrapper (linear policy loaded from TOML).
pub mod policy;

pub use fuzzy::FuzzyController;
pub use pid::PidController;
pub use policy::PolicyController;

/// Contract every external controller satisfies.
///
/// Construction requires a validated configuration section and a positive
/// time step; invalid construction is a fatal error surfaced before any
/// episode runs.
pub trait Controller: std::fmt::Debug {
    /// Computes the scalar valve action for the given observation.
    fn step(&mut self, observation: &[f64]) -> f64;

    /// Clears all internal state between episodes.
    fn reset(&mut self);

    /// Applies new parameter values by name; unknown names are ignored.
    fn update_parameters(&mut self, params: &BTreeMap<String, f64>);

    /// Returns the current tunable parameters by name.
    fn get_parameters(&self) -> BTreeMap<String, f64>;
}

/// Builds a controller from a selector string.
///
/// `"pid"` and `"fuzzy"` resolve to the built-in variants configured from
/// `[controllers.*]`; any other value ending in `.toml` is loaded as a
/// learned linear policy file.
///
/// # Errors
///
/// Returns a `ConfigError` for an unknown selector or an invalid
/// controller configuration.
pub fn build(selector: &str, config: &PlantConfig) -> Result<Box<dyn Controller>, ConfigError> {
    let dt = config.simulation.dt_s;
    match selector {
        "pid" => Ok(Box::new(PidController::new(&config.controllers.pid, dt)?)),
        "fuzzy" => Ok(Box::new(FuzzyController::new(
            &config.controllers.fuzzy,
            dt,
        )?)),
        path if path.ends_with(".toml") => {
            Ok(Box::new(PolicyController::from_toml_file(Path::new(path))?))
        }
        other => Err(ConfigError::new(
            "controller",
            format!("unknown controller \"{other}\" (expected pid, fuzzy, or a .toml policy path)"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_named_variants() {
        let cfg = PlantConfig::pwr_3000();
        assert!(build("pid", &cfg).is_ok());
        assert!(build("fuzzy", &cfg).is_ok());
    }

    #[test]
    fn factory_rejects_unknown_selector() {
        let cfg = PlantConfig::pwr_3000();
        let err = build("lqr", &cfg).unwrap_err();
        assert_eq!(err.field, "controller");
    }

    #[test]
    fn factory_surfaces_invalid_pid_bounds() {
        let mut cfg = PlantConfig::pwr_3000();
        cfg.controllers.pid.output_min = 2.0;
        assert!(build("pid", &cfg).is_err());
    }
}

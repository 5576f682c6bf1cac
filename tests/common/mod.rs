//! Shared test fixtures for integration tests.

use pwr_sim::config::PlantConfig;
use pwr_sim::controllers::{Controller, PidController};
use pwr_sim::scenario::{self, ScenarioSpec};
use pwr_sim::sim::environment::PlantEnvironment;

/// Reference 3000 MWth plant configuration (seed 42).
pub fn reference_config() -> PlantConfig {
    PlantConfig::pwr_3000()
}

/// Catalog scenario looked up by name; panics on an unknown name so test
/// failures point at the lookup rather than a later unwrap.
pub fn catalog_scenario(cfg: &PlantConfig, name: &str) -> ScenarioSpec {
    scenario::by_name(cfg, name)
        .unwrap_or_else(|| panic!("scenario \"{name}\" missing from catalog"))
}

/// Catalog scenario shortened to `max_steps` so long drills finish quickly.
pub fn short_scenario(cfg: &PlantConfig, name: &str, max_steps: usize) -> ScenarioSpec {
    let mut spec = catalog_scenario(cfg, name);
    spec.max_steps = max_steps;
    spec
}

/// Environment for the given scenario under the reference plant.
pub fn build_env(cfg: &PlantConfig, spec: ScenarioSpec) -> PlantEnvironment {
    PlantEnvironment::new(cfg.clone(), spec).expect("reference config should validate")
}

/// Default PID speed governor from the reference `[controllers.pid]` section.
pub fn default_pid(cfg: &PlantConfig) -> impl Controller {
    PidController::new(&cfg.controllers.pid, cfg.simulation.dt_s)
        .expect("reference PID config should validate")
}

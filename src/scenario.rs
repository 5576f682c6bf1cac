//! Scenario catalog: load profiles, perturbation schedules, noise schedules,
//! and episode reset options.
//!
//! A [`ScenarioSpec`] is an immutable description of one episode: the load
//! demand as a function of time, the episode length, optional environment
//! modifications (parameter ramps, power-imbalance injections), an optional
//! adversarial observation-noise schedule, and drill flags that downstream
//! consumers key off of. Specs are reusable across episodes and controllers.

use crate::config::PlantConfig;

/// Electrical load demand as a function of simulation time.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadProfile {
    /// Constant demand.
    Constant(f64),
    /// Linear ramp from `initial_mw` to `final_mw` across a time window.
    Ramp {
        initial_mw: f64,
        final_mw: f64,
        start_s: f64,
        duration_s: f64,
    },
    /// Instantaneous step from `initial_mw` to `final_mw` at `at_s`.
    Step {
        initial_mw: f64,
        final_mw: f64,
        at_s: f64,
    },
    /// Ordered sequence of `(demand_mw, start_s)` entries; the last entry
    /// whose start time has been reached is in effect.
    MultiStep(Vec<(f64, f64)>),
}

impl LoadProfile {
    /// Returns the demand in MW at the given simulation time and step index.
    pub fn demand_mw(&self, time_s: f64, _step_idx: usize) -> f64 {
        match self {
            LoadProfile::Constant(mw) => *mw,
            LoadProfile::Ramp {
                initial_mw,
                final_mw,
                start_s,
                duration_s,
            } => {
                let duration = duration_s.max(1e-6);
                if time_s < *start_s {
                    *initial_mw
                } else if time_s < start_s + duration {
                    let fraction = (time_s - start_s) / duration;
                    initial_mw + (final_mw - initial_mw) * fraction
                } else {
                    *final_mw
                }
            }
            LoadProfile::Step {
                initial_mw,
                final_mw,
                at_s,
            } => {
                if time_s >= *at_s {
                    *final_mw
                } else {
                    *initial_mw
                }
            }
            LoadProfile::MultiStep(steps) => {
                let mut current = steps.first().map(|(mw, _)| *mw).unwrap_or(0.0);
                for (mw, start) in steps {
                    if time_s >= *start {
                        current = *mw;
                    } else {
                        break;
                    }
                }
                current
            }
        }
    }
}

/// Plant parameter targeted by a scenario parameter ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampedParameter {
    /// `coupling.eta_transfer` — thermal-to-steam transfer efficiency.
    CouplingEtaTransfer,
}

/// Timed modification of the environment while an episode runs.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvModification {
    /// Linearly interpolates a plant parameter between two values over a
    /// time window; holds the end value afterwards.
    ParameterRamp {
        target: RampedParameter,
        start_value: f64,
        end_value: f64,
        start_s: f64,
        duration_s: f64,
    },
    /// Adds a fixed offset to electrical demand for the duration of the
    /// window `[start_s, end_s)`.
    GridPowerImbalance {
        imbalance_mw: f64,
        start_s: f64,
        end_s: f64,
    },
}

impl EnvModification {
    /// Returns the ramped value of a parameter ramp at the given time, or
    /// `None` for other modification kinds.
    pub fn ramp_value(&self, time_s: f64) -> Option<f64> {
        match self {
            EnvModification::ParameterRamp {
                start_value,
                end_value,
                start_s,
                duration_s,
                ..
            } => {
                let duration = duration_s.max(1e-6);
                let value = if time_s < *start_s {
                    *start_value
                } else if time_s < start_s + duration {
                    let fraction = (time_s - start_s) / duration;
                    start_value + (end_value - start_value) * fraction
                } else {
                    *end_value
                };
                Some(value)
            }
            EnvModification::GridPowerImbalance { .. } => None,
        }
    }

    /// Returns the demand offset of a power-imbalance injection at the given
    /// time (zero outside its window or for other modification kinds).
    pub fn imbalance_mw(&self, time_s: f64) -> f64 {
        match self {
            EnvModification::GridPowerImbalance {
                imbalance_mw,
                start_s,
                end_s,
            } if time_s >= *start_s && time_s < *end_s => *imbalance_mw,
            _ => 0.0,
        }
    }
}

/// Adversarial observation-noise schedule.
///
/// Per-component Gaussian noise whose magnitude interpolates linearly from
/// `initial_magnitude` to `final_magnitude` across the episode, plus a
/// constant moderator-temperature sensor bias in °C.
#[derive(Debug, Clone, PartialEq)]
pub struct AdversarialNoise {
    pub initial_magnitude: f64,
    pub final_magnitude: f64,
    pub bias_magnitude: f64,
}

impl AdversarialNoise {
    /// Returns the noise magnitude at the given episode progress ∈ [0, 1].
    pub fn magnitude_at(&self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        self.initial_magnitude + (self.final_magnitude - self.initial_magnitude) * p
    }
}

/// Options applied when an environment resets for an episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetOptions {
    /// Initial reactor power as a fraction of nominal (default 1.0).
    pub initial_power_level: Option<f64>,
}

/// Immutable description of one episode.
#[derive(Debug, Clone)]
pub struct ScenarioSpec {
    pub name: String,
    /// Free-text description; some metrics key off of it (e.g. "sudden").
    pub description: String,
    pub load_profile: LoadProfile,
    pub max_steps: usize,
    pub reset_options: ResetOptions,
    pub env_modifications: Vec<EnvModification>,
    pub adversarial_noise: Option<AdversarialNoise>,
    /// Robustness drill: noise/fault injection is expected.
    pub is_adversarial_drill: bool,
    /// Physics parameters are randomized at reset.
    pub is_domain_randomization_drill: bool,
    /// Long quiet hold used to score control efficiency.
    pub is_efficiency_probe: bool,
}

impl ScenarioSpec {
    fn new(name: &str, description: &str, load_profile: LoadProfile, max_steps: usize) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            load_profile,
            max_steps,
            reset_options: ResetOptions::default(),
            env_modifications: Vec::new(),
            adversarial_noise: None,
            is_adversarial_drill: false,
            is_domain_randomization_drill: false,
            is_efficiency_probe: false,
        }
    }
}

/// Builds the full scenario catalog for the given plant configuration.
///
/// Every returned spec carries a `reset_options` value (the default when the
/// scenario does not override it), so consumers never branch on absence.
pub fn catalog(cfg: &PlantConfig) -> Vec<ScenarioSpec> {
    let dt = cfg.simulation.dt_s;
    let load = cfg.grid.initial_load_mw;
    let eta = cfg.coupling.eta_transfer;
    let steps_for = |seconds: f64| (seconds / dt) as usize;

    let mut scenarios = Vec::new();

    // Standard validation scenarios
    let mut baseline = ScenarioSpec::new(
        "baseline_steady_state",
        "Baseline steady-state operation at 90% power.",
        LoadProfile::Constant(load),
        steps_for(500.0),
    );
    baseline.reset_options.initial_power_level = Some(0.9);
    scenarios.push(baseline);

    let mut gradual = ScenarioSpec::new(
        "gradual_load_increase_10pct",
        "Gradual load ramp from 90% to 100%.",
        LoadProfile::Ramp {
            initial_mw: load * 0.9,
            final_mw: load,
            start_s: 20.0,
            duration_s: 300.0,
        },
        steps_for(400.0),
    );
    gradual.reset_options.initial_power_level = Some(0.9);
    scenarios.push(gradual);

    scenarios.push(ScenarioSpec::new(
        "sudden_load_increase_5pct",
        "Sudden +5% load increase from nominal.",
        LoadProfile::Step {
            initial_mw: load,
            final_mw: load * 1.05,
            at_s: 20.0,
        },
        steps_for(300.0),
    ));

    // Efficiency and actuator-preservation probe
    let mut probe = ScenarioSpec::new(
        "steady_state_efficiency_probe",
        "A long, quiet hold to enforce control efficiency.",
        LoadProfile::Constant(load),
        steps_for(1800.0),
    );
    probe.is_efficiency_probe = true;
    scenarios.push(probe);

    // Robustness and adversarial drills
    let mut deceptive = ScenarioSpec::new(
        "deceptive_sensor_noise",
        "Adversarial test: high, dynamic sensor noise during a load ramp.",
        LoadProfile::Ramp {
            initial_mw: load * 0.9,
            final_mw: load,
            start_s: 20.0,
            duration_s: 300.0,
        },
        steps_for(400.0),
    );
    deceptive.reset_options.initial_power_level = Some(0.9);
    deceptive.adversarial_noise = Some(AdversarialNoise {
        initial_magnitude: 0.05,
        final_magnitude: 0.15,
        bias_magnitude: 8.0,
    });
    deceptive.is_adversarial_drill = true;
    scenarios.push(deceptive);

    let mut randomized = ScenarioSpec::new(
        "parameter_randomization_drills",
        "Drill: randomized physics parameters for generalization.",
        LoadProfile::Constant(load),
        steps_for(400.0),
    );
    randomized.is_domain_randomization_drill = true;
    randomized.is_adversarial_drill = true;
    scenarios.push(randomized);

    let mut cascading = ScenarioSpec::new(
        "cascading_grid_fault_and_recovery",
        "Adversarial drill: a cascading grid fault followed by recovery demand.",
        LoadProfile::MultiStep(vec![
            (load, 0.0),
            (load * 0.8, 20.0),
            (load * 0.85, 120.0),
            (load * 1.05, 150.0),
        ]),
        steps_for(500.0),
    );
    cascading.env_modifications.push(EnvModification::GridPowerImbalance {
        imbalance_mw: 50.0,
        start_s: 20.0,
        end_s: 25.0,
    });
    cascading.is_adversarial_drill = true;
    scenarios.push(cascading);

    // Final exam: compound failure
    let mut exam = ScenarioSpec::new(
        "combined_challenge_final_exam",
        "Final exam: compound failure with grid fault, degradation, and noise.",
        LoadProfile::Step {
            initial_mw: load,
            final_mw: load * 1.1,
            at_s: 20.0,
        },
        steps_for(400.0),
    );
    exam.env_modifications.push(EnvModification::ParameterRamp {
        target: RampedParameter::CouplingEtaTransfer,
        start_value: eta,
        end_value: eta * 0.90,
        start_s: 50.0,
        duration_s: 150.0,
    });
    exam.adversarial_noise = Some(AdversarialNoise {
        initial_magnitude: 0.02,
        final_magnitude: 0.05,
        bias_magnitude: 2.0,
    });
    exam.is_adversarial_drill = true;
    scenarios.push(exam);

    scenarios
}

/// Looks up a scenario by name in the catalog.
pub fn by_name(cfg: &PlantConfig, name: &str) -> Option<ScenarioSpec> {
    catalog(cfg).into_iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_profile_is_flat() {
        let p = LoadProfile::Constant(2500.0);
        for i in 0..100 {
            assert_eq!(p.demand_mw(i as f64 * 7.3, i), 2500.0);
        }
    }

    #[test]
    fn ramp_interpolates_between_endpoints() {
        let p = LoadProfile::Ramp {
            initial_mw: 2250.0,
            final_mw: 2500.0,
            start_s: 20.0,
            duration_s: 300.0,
        };
        assert_eq!(p.demand_mw(0.0, 0), 2250.0);
        assert_eq!(p.demand_mw(19.99, 999), 2250.0);
        assert!((p.demand_mw(170.0, 0) - 2375.0).abs() < 1e-9);
        assert_eq!(p.demand_mw(320.0, 0), 2500.0);
        assert_eq!(p.demand_mw(1000.0, 0), 2500.0);
    }

    #[test]
    fn ramp_with_zero_duration_behaves_as_step() {
        let p = LoadProfile::Ramp {
            initial_mw: 100.0,
            final_mw: 200.0,
            start_s: 10.0,
            duration_s: 0.0,
        };
        assert_eq!(p.demand_mw(9.9, 0), 100.0);
        assert_eq!(p.demand_mw(10.1, 0), 200.0);
    }

    #[test]
    fn step_profile_switches_at_step_time() {
        let p = LoadProfile::Step {
            initial_mw: 2500.0,
            final_mw: 2625.0,
            at_s: 20.0,
        };
        assert_eq!(p.demand_mw(19.999, 0), 2500.0);
        assert_eq!(p.demand_mw(20.0, 0), 2625.0);
        assert_eq!(p.demand_mw(300.0, 0), 2625.0);
    }

    #[test]
    fn multi_step_keeps_last_applicable_entry() {
        let p = LoadProfile::MultiStep(vec![
            (2500.0, 0.0),
            (2000.0, 20.0),
            (2125.0, 120.0),
            (2625.0, 150.0),
        ]);
        assert_eq!(p.demand_mw(10.0, 0), 2500.0);
        assert_eq!(p.demand_mw(20.0, 0), 2000.0);
        assert_eq!(p.demand_mw(119.9, 0), 2000.0);
        assert_eq!(p.demand_mw(140.0, 0), 2125.0);
        assert_eq!(p.demand_mw(400.0, 0), 2625.0);
    }

    #[test]
    fn parameter_ramp_interpolates_and_holds() {
        let m = EnvModification::ParameterRamp {
            target: RampedParameter::CouplingEtaTransfer,
            start_value: 0.98,
            end_value: 0.882,
            start_s: 50.0,
            duration_s: 150.0,
        };
        assert_eq!(m.ramp_value(0.0), Some(0.98));
        let mid = m.ramp_value(125.0).unwrap();
        assert!((mid - (0.98 + (0.882 - 0.98) * 0.5)).abs() < 1e-12);
        assert_eq!(m.ramp_value(500.0), Some(0.882));
    }

    #[test]
    fn imbalance_active_only_inside_window() {
        let m = EnvModification::GridPowerImbalance {
            imbalance_mw: 50.0,
            start_s: 20.0,
            end_s: 25.0,
        };
        assert_eq!(m.imbalance_mw(19.9), 0.0);
        assert_eq!(m.imbalance_mw(20.0), 50.0);
        assert_eq!(m.imbalance_mw(24.99), 50.0);
        assert_eq!(m.imbalance_mw(25.0), 0.0);
    }

    #[test]
    fn noise_magnitude_interpolates_across_episode() {
        let n = AdversarialNoise {
            initial_magnitude: 0.05,
            final_magnitude: 0.15,
            bias_magnitude: 8.0,
        };
        assert_eq!(n.magnitude_at(0.0), 0.05);
        assert!((n.magnitude_at(0.5) - 0.10).abs() < 1e-12);
        assert_eq!(n.magnitude_at(1.0), 0.15);
        // Progress is clamped
        assert_eq!(n.magnitude_at(2.0), 0.15);
    }

    #[test]
    fn catalog_has_expected_scenarios() {
        let cfg = PlantConfig::pwr_3000();
        let all = catalog(&cfg);
        assert_eq!(all.len(), 8);
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"baseline_steady_state"));
        assert!(names.contains(&"sudden_load_increase_5pct"));
        assert!(names.contains(&"combined_challenge_final_exam"));
        // Names are unique
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
    }

    #[test]
    fn baseline_is_constant_at_initial_load() {
        let cfg = PlantConfig::pwr_3000();
        let baseline = by_name(&cfg, "baseline_steady_state").unwrap();
        for i in 0..50 {
            assert_eq!(
                baseline.load_profile.demand_mw(i as f64 * 11.0, i),
                cfg.grid.initial_load_mw
            );
        }
        assert_eq!(baseline.reset_options.initial_power_level, Some(0.9));
        assert_eq!(baseline.max_steps, 25_000);
    }

    #[test]
    fn sudden_scenario_steps_five_percent_at_twenty_seconds() {
        let cfg = PlantConfig::pwr_3000();
        let sudden = by_name(&cfg, "sudden_load_increase_5pct").unwrap();
        let load = cfg.grid.initial_load_mw;
        assert_eq!(sudden.load_profile.demand_mw(19.99, 0), load);
        assert_eq!(sudden.load_profile.demand_mw(20.0, 1000), load * 1.05);
        assert_eq!(sudden.load_profile.demand_mw(250.0, 12_500), load * 1.05);
    }

    #[test]
    fn unknown_scenario_name_returns_none() {
        let cfg = PlantConfig::pwr_3000();
        assert!(by_name(&cfg, "no_such_scenario").is_none());
    }
}

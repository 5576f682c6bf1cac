//! The plant orchestrator: owns the physics models and the inner regulator,
//! applies scenario perturbations and measurement noise, runs the safety
//! monitor, and exposes the episodic reset/step/close contract.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{ConfigError, PlantConfig};
use crate::models::{GridModel, ReactorModel, TurbineModel};
use crate::scenario::{EnvModification, RampedParameter, ResetOptions, ScenarioSpec};
use crate::sim::inner_control::InnerReactorController;
use crate::sim::noise;
use crate::sim::safety::SafetyMonitor;
use crate::sim::types::{EnvError, EnvPhase, Observation, StepOutcome, StepRecord};

/// Coupled plant simulation driven one fixed step at a time.
///
/// One `PlantEnvironment` is exclusively owned by one episode driver;
/// everything is synchronous and single-threaded. All pseudo-randomness
/// (adversarial noise, domain randomization) flows from a single `StdRng`
/// reseeded from the configured seed at every `reset`, so identical
/// (config, scenario, action sequence, seed) inputs produce bit-identical
/// `StepRecord` sequences.
#[derive(Debug)]
pub struct PlantEnvironment {
    base_config: PlantConfig,
    /// Active configuration for the current episode (randomized copies for
    /// domain-randomization drills).
    config: PlantConfig,
    scenario: ScenarioSpec,

    reactor: ReactorModel,
    turbine: TurbineModel,
    grid: GridModel,
    inner: InnerReactorController,
    safety: SafetyMonitor,

    phase: EnvPhase,
    step_count: usize,
    time_s: f64,
    rng: StdRng,
}

impl PlantEnvironment {
    /// Creates an environment for one scenario.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if the configuration is invalid.
    pub fn new(config: PlantConfig, scenario: ScenarioSpec) -> Result<Self, ConfigError> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err);
        }

        let reactor = ReactorModel::new(&config.reactor);
        let turbine = TurbineModel::new(&config.turbine, &config.coupling);
        let grid = GridModel::new(&config.grid);
        let inner =
            InnerReactorController::new(config.simulation.dt_s, config.reactor.t_coolant0_c);
        let safety = SafetyMonitor::new(config.safety_limits.clone());
        let rng = StdRng::seed_from_u64(config.simulation.seed);

        Ok(Self {
            base_config: config.clone(),
            config,
            scenario,
            reactor,
            turbine,
            grid,
            inner,
            safety,
            phase: EnvPhase::Uninitialized,
            step_count: 0,
            time_s: 0.0,
            rng,
        })
    }

    pub fn scenario(&self) -> &ScenarioSpec {
        &self.scenario
    }

    pub fn phase(&self) -> EnvPhase {
        self.phase
    }

    /// Starts a new episode and returns the initial observation together
    /// with an initial record (`step == -1`) of the raw physical state.
    ///
    /// Rebuilds every model from a fresh copy of the configuration; for
    /// domain-randomization drills the copy is perturbed first (seeded, so
    /// repeat resets see identical physics).
    ///
    /// # Errors
    ///
    /// Returns `EnvError::Closed` after `close`.
    pub fn reset(&mut self, options: &ResetOptions) -> Result<(Observation, StepRecord), EnvError> {
        if self.phase == EnvPhase::Closed {
            return Err(EnvError::Closed);
        }

        self.config = self.base_config.clone();
        self.rng = StdRng::seed_from_u64(self.config.simulation.seed);
        if self.scenario.is_domain_randomization_drill {
            noise::randomize_physics(&mut self.config, &mut self.rng);
        }

        let dt = self.config.simulation.dt_s;
        self.reactor = ReactorModel::new(&self.config.reactor);
        self.turbine = TurbineModel::new(&self.config.turbine, &self.config.coupling);
        self.grid = GridModel::new(&self.config.grid);
        self.inner = InnerReactorController::new(dt, self.config.reactor.t_coolant0_c);
        self.safety = SafetyMonitor::new(self.config.safety_limits.clone());

        let pf = options.initial_power_level.unwrap_or(1.0);
        self.reactor.reset(pf);
        self.turbine
            .reset(self.config.turbine.nominal_mech_power_mw * pf, 0.8);
        let initial_load = self.scenario.load_profile.demand_mw(0.0, 0);
        self.grid.reset(initial_load);
        self.grid.set_load_profile(self.scenario.load_profile.clone());
        self.inner.reset(self.config.reactor.t_coolant0_c);

        self.step_count = 0;
        self.time_s = 0.0;
        self.phase = EnvPhase::Ready;

        let record = self.make_record(-1, self.turbine.valve_position, 0.0, false, false);
        Ok((self.observe(), record))
    }

    /// Advances the plant by one step under the given valve action.
    ///
    /// The action is clamped to [0, 1]. The inner regulator computes rod
    /// reactivity from the previous step's moderator temperature; the
    /// reactor, turbine, and grid then advance in order, with scenario
    /// parameter ramps and power-imbalance injections applied for the
    /// current time. Safety is evaluated on the updated state: a fuel
    /// temperature breach terminates, reaching `max_steps` truncates.
    ///
    /// # Errors
    ///
    /// Returns an `EnvError` when called before `reset`, after the episode
    /// finished, or after `close`.
    pub fn step(&mut self, action: f64) -> Result<StepOutcome, EnvError> {
        match self.phase {
            EnvPhase::Uninitialized => return Err(EnvError::NotReset),
            EnvPhase::Terminated | EnvPhase::Truncated => return Err(EnvError::EpisodeOver),
            EnvPhase::Closed => return Err(EnvError::Closed),
            EnvPhase::Ready | EnvPhase::Stepping => {}
        }

        let dt = self.config.simulation.dt_s;
        let valve_command = action.clamp(0.0, 1.0);
        let t = self.time_s;

        // Active scenario modifications for this step
        let mut eta = self.config.coupling.eta_transfer;
        let mut imbalance_mw = 0.0;
        for m in &self.scenario.env_modifications {
            match m {
                EnvModification::ParameterRamp {
                    target: RampedParameter::CouplingEtaTransfer,
                    ..
                } => {
                    if let Some(value) = m.ramp_value(t) {
                        eta = value;
                    }
                }
                EnvModification::GridPowerImbalance { .. } => {
                    imbalance_mw += m.imbalance_mw(t);
                }
            }
        }
        self.turbine.set_eta_transfer(eta);

        // Rod reactivity from the previous step's moderator temperature
        let rod_reactivity = self.inner.step(self.reactor.t_moderator);
        let thermal_mw = self.reactor.step(dt, rod_reactivity);
        let mech_mw = self.turbine.step(dt, thermal_mw, valve_command);
        self.grid.step(dt, mech_mw, t, self.step_count, imbalance_mw);

        self.step_count += 1;
        self.time_s = self.step_count as f64 * dt;

        let speed_rpm = self.grid.omega_pu * self.config.turbine.omega_nominal_rpm;
        let status = self
            .safety
            .check(self.reactor.t_fuel, speed_rpm, self.grid.frequency);
        let terminated = status.is_scram();
        let truncated = !terminated && self.step_count >= self.scenario.max_steps;

        self.phase = if terminated {
            EnvPhase::Terminated
        } else if truncated {
            EnvPhase::Truncated
        } else {
            EnvPhase::Stepping
        };

        let record = self.make_record(
            (self.step_count - 1) as i64,
            valve_command,
            rod_reactivity,
            terminated,
            truncated,
        );

        Ok(StepOutcome {
            observation: self.observe(),
            reward: 0.0,
            terminated,
            truncated,
            record,
        })
    }

    /// Closes the environment; subsequent calls are no-ops.
    pub fn close(&mut self) {
        self.phase = EnvPhase::Closed;
    }

    /// Builds the normalized observation, applying the scenario's
    /// adversarial noise schedule when one is active.
    ///
    /// The noise perturbs only the observation; step records always carry
    /// the raw physical truth. `bias_magnitude` acts as a moderator
    /// temperature sensor bias in °C, applied before normalization.
    fn observe(&mut self) -> Observation {
        let n = &self.config.normalization;
        let bias_c = self
            .scenario
            .adversarial_noise
            .as_ref()
            .map_or(0.0, |s| s.bias_magnitude);

        let speed_rpm = self.grid.omega_pu * self.config.turbine.omega_nominal_rpm;
        let mut obs: Observation = [
            self.reactor.power_fraction,
            self.reactor.t_fuel / n.fuel_temp_c,
            (self.reactor.t_moderator + bias_c) / n.moderator_temp_c,
            self.turbine.mechanical_power / n.power_mw,
            speed_rpm / n.speed_rpm,
            self.grid.frequency / n.frequency_hz,
            self.turbine.valve_position,
            self.grid.current_demand / n.load_mw,
        ];

        if let Some(noise_spec) = &self.scenario.adversarial_noise {
            let progress = self.step_count as f64 / self.scenario.max_steps.max(1) as f64;
            noise::perturb_observation(noise_spec, &mut self.rng, &mut obs, progress);
        }

        obs
    }

    fn make_record(
        &self,
        step: i64,
        valve_command: f64,
        rod_reactivity: f64,
        terminated: bool,
        truncated: bool,
    ) -> StepRecord {
        StepRecord {
            step,
            time_s: self.time_s,
            power_fraction: self.reactor.power_fraction,
            reactor_power_mw: self.reactor.power_fraction * self.config.reactor.nominal_power_mw,
            t_fuel_c: self.reactor.t_fuel,
            t_moderator_c: self.reactor.t_moderator,
            valve_command,
            valve_position: self.turbine.valve_position,
            mech_power_mw: self.turbine.mechanical_power,
            speed_rpm: self.grid.omega_pu * self.config.turbine.omega_nominal_rpm,
            frequency_hz: self.grid.frequency,
            rotor_angle_rad: self.grid.rotor_angle,
            load_demand_mw: self.grid.current_demand,
            rod_reactivity,
            terminated,
            truncated,
        }
    }
}

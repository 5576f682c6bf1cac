//! TOML-based plant configuration: physics constants, safety limits, and
//! controller parameter groups.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level plant configuration parsed from TOML.
///
/// Physics sections (`reactor`, `turbine`, `coupling`, `grid`) have no field
/// defaults: a missing physical constant fails the parse. Only the ambient
/// sections (`simulation`, `safety_limits`, `normalization`, `controllers`)
/// fall back to the reference values. Use [`PlantConfig::pwr_3000`] for the
/// built-in 3000 MWth reference plant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    /// Simulation timing and seeding.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Point-kinetics and thermal-hydraulic constants.
    pub reactor: ReactorConfig,
    /// Governor valve and turbine lag constants.
    pub turbine: TurbineConfig,
    /// Reactor-to-turbine thermal coupling.
    pub coupling: CouplingConfig,
    /// Swing-equation and system-base constants.
    pub grid: GridConfig,
    /// Hard safety limits and severity weights.
    #[serde(default)]
    pub safety_limits: SafetyLimits,
    /// Per-variable observation normalization divisors.
    #[serde(default)]
    pub normalization: NormalizationConfig,
    /// External controller parameter groups.
    #[serde(default)]
    pub controllers: ControllersConfig,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Fixed integration step (seconds, must be > 0).
    pub dt_s: f64,
    /// Default episode length when a scenario does not set one.
    pub max_steps: usize,
    /// Master random seed for noise and randomization drills.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt_s: 0.02,
            max_steps: 25_000,
            seed: 42,
        }
    }
}

/// Point-kinetics and lumped thermal-hydraulic constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactorConfig {
    /// Delayed-neutron group fractions.
    pub beta_i: Vec<f64>,
    /// Delayed-neutron group decay constants (1/s).
    pub lambda_i: Vec<f64>,
    /// Total delayed-neutron fraction.
    pub beta_total: f64,
    /// Prompt neutron generation time (s).
    pub generation_time_s: f64,
    /// Fuel temperature reactivity coefficient (1/°C).
    pub alpha_f: f64,
    /// Coolant temperature reactivity coefficient (1/°C).
    pub alpha_c: f64,
    /// Lumped fuel heat capacity (MJ/°C).
    pub fuel_heat_capacity: f64,
    /// Lumped coolant heat capacity (MJ/°C).
    pub coolant_heat_capacity: f64,
    /// Fuel-to-coolant heat transfer coefficient (MW/°C).
    pub heat_transfer_coeff: f64,
    /// Nominal full thermal power (MWth).
    pub nominal_power_mw: f64,
    /// Coolant inlet temperature (°C).
    pub t_inlet_c: f64,
    /// Nominal average coolant temperature (°C).
    pub t_coolant0_c: f64,
    /// Nominal average fuel temperature (°C).
    pub t_fuel0_c: f64,
}

/// Governor valve and turbine mechanical lag constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurbineConfig {
    /// Turbine mechanical time constant (s).
    pub tau_t_s: f64,
    /// Governor valve actuator time constant (s).
    pub tau_v_s: f64,
    /// Nominal shaft speed (rpm).
    pub omega_nominal_rpm: f64,
    /// Nominal mechanical power output (MWm).
    pub nominal_mech_power_mw: f64,
}

/// Reactor-to-turbine coupling.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouplingConfig {
    /// Thermal-to-steam transfer efficiency (0..1).
    pub eta_transfer: f64,
}

/// Swing-equation constants and the system power base.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Inertia constant H (s).
    pub inertia_h_s: f64,
    /// Damping coefficient D (p.u.).
    pub damping_d_pu: f64,
    /// Nominal grid frequency (Hz).
    pub f_nominal_hz: f64,
    /// System MVA base for per-unit conversion.
    pub s_base_mva: f64,
    /// Nominal electrical load demand (MW).
    pub initial_load_mw: f64,
}

/// Hard safety limits, warning margins, and severity weights.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafetyLimits {
    /// Hard fuel temperature limit (°C); exceeding it terminates the episode.
    pub max_fuel_temp_c: f64,
    /// Warning threshold as a fraction of the hard fuel limit.
    pub fuel_temp_warning_fraction: f64,
    /// Overspeed limit (rpm).
    pub max_speed_rpm: f64,
    /// Under-frequency limit (Hz).
    pub min_frequency_hz: f64,
    /// Over-frequency limit (Hz).
    pub max_frequency_hz: f64,
    /// Frequency deviation used to normalize severity (Hz).
    pub freq_deviation_limit_hz: f64,
    /// Transient severity weight on frequency excursion.
    pub w_freq_severity: f64,
    /// Transient severity weight on speed excursion.
    pub w_speed_severity: f64,
    /// Fraction of a demanded power change that counts as "responded".
    pub response_threshold: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_fuel_temp_c: 2800.0,
            fuel_temp_warning_fraction: 0.95,
            max_speed_rpm: 2250.0,
            min_frequency_hz: 57.0,
            max_frequency_hz: 63.0,
            freq_deviation_limit_hz: 1.0,
            w_freq_severity: 0.6,
            w_speed_severity: 0.4,
            response_threshold: 0.9,
        }
    }
}

/// Per-variable divisors mapping raw state into the observation range.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    pub fuel_temp_c: f64,
    pub moderator_temp_c: f64,
    pub power_mw: f64,
    pub speed_rpm: f64,
    pub frequency_hz: f64,
    pub load_mw: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            fuel_temp_c: 1000.0,
            moderator_temp_c: 500.0,
            power_mw: 3000.0,
            speed_rpm: 1800.0,
            frequency_hz: 60.0,
            load_mw: 3000.0,
        }
    }
}

/// Parameter groups for the external controllers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllersConfig {
    pub pid: PidConfig,
    pub fuzzy: FuzzyConfig,
}

/// PID speed-governor parameters (measurement is normalized shaft speed).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Setpoint in normalized speed units (1.0 = nominal).
    pub setpoint: f64,
    pub output_min: f64,
    pub output_max: f64,
    /// Derivative low-pass filter time constant (s).
    pub deriv_filter_tau_s: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 20.0,
            ki: 1.5,
            kd: 1.0,
            setpoint: 1.0,
            output_min: 0.0,
            output_max: 1.0,
            deriv_filter_tau_s: 0.05,
        }
    }
}

/// Fuzzy-logic controller scaling parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuzzyConfig {
    /// Setpoint in normalized speed units (1.0 = nominal).
    pub setpoint: f64,
    /// Maps speed error into the [-1, 1] fuzzy universe.
    pub error_scaling: f64,
    /// Maps error rate into the [-1, 1] fuzzy universe.
    pub derror_scaling: f64,
    /// Scales the defuzzified output into a valve increment per second.
    pub output_scaling: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            setpoint: 1.0,
            error_scaling: 40.0,
            derror_scaling: 4.0,
            output_scaling: 1.2,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"reactor.generation_time_s"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl PlantConfig {
    /// Returns the built-in 3000 MWth reference plant.
    pub fn pwr_3000() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            reactor: ReactorConfig {
                beta_i: vec![0.000215, 0.001424, 0.001274, 0.002568, 0.000748, 0.000273],
                lambda_i: vec![0.0124, 0.0305, 0.111, 0.301, 1.14, 3.01],
                beta_total: 0.006502,
                generation_time_s: 1.0e-3,
                alpha_f: -2.5e-5,
                alpha_c: -2.0e-5,
                fuel_heat_capacity: 200.0,
                coolant_heat_capacity: 5.0e5,
                heat_transfer_coeff: 6.0,
                nominal_power_mw: 3000.0,
                t_inlet_c: 290.0,
                t_coolant0_c: 306.5,
                t_fuel0_c: 800.0,
            },
            turbine: TurbineConfig {
                tau_t_s: 4.0,
                tau_v_s: 0.5,
                omega_nominal_rpm: 1800.0,
                nominal_mech_power_mw: 2800.0,
            },
            coupling: CouplingConfig { eta_transfer: 0.98 },
            grid: GridConfig {
                inertia_h_s: 5.0,
                damping_d_pu: 1.0,
                f_nominal_hz: 60.0,
                s_base_mva: 3000.0,
                initial_load_mw: 2500.0,
            },
            safety_limits: SafetyLimits::default(),
            normalization: NormalizationConfig::default(),
            controllers: ControllersConfig::default(),
        }
    }

    /// Parses a plant configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read, the TOML is
    /// invalid, or a required physical constant is missing.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a plant configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, contains unknown
    /// fields, or omits a required physical constant.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if !(s.dt_s > 0.0) {
            errors.push(ConfigError::new("simulation.dt_s", "must be > 0"));
        }
        if s.max_steps == 0 {
            errors.push(ConfigError::new("simulation.max_steps", "must be > 0"));
        }

        let r = &self.reactor;
        if r.beta_i.is_empty() {
            errors.push(ConfigError::new("reactor.beta_i", "must not be empty"));
        }
        if r.beta_i.len() != r.lambda_i.len() {
            errors.push(ConfigError::new(
                "reactor.lambda_i",
                "must have the same length as reactor.beta_i",
            ));
        }
        if r.lambda_i.iter().any(|&l| l <= 0.0) {
            errors.push(ConfigError::new("reactor.lambda_i", "entries must be > 0"));
        }
        if r.generation_time_s < 0.0 {
            errors.push(ConfigError::new("reactor.generation_time_s", "must be >= 0"));
        }
        if r.fuel_heat_capacity <= 0.0 {
            errors.push(ConfigError::new("reactor.fuel_heat_capacity", "must be > 0"));
        }
        if r.coolant_heat_capacity <= 0.0 {
            errors.push(ConfigError::new(
                "reactor.coolant_heat_capacity",
                "must be > 0",
            ));
        }
        if r.nominal_power_mw <= 0.0 {
            errors.push(ConfigError::new("reactor.nominal_power_mw", "must be > 0"));
        }

        let t = &self.turbine;
        if t.tau_t_s <= 0.0 {
            errors.push(ConfigError::new("turbine.tau_t_s", "must be > 0"));
        }
        if t.tau_v_s <= 0.0 {
            errors.push(ConfigError::new("turbine.tau_v_s", "must be > 0"));
        }
        if t.omega_nominal_rpm <= 0.0 {
            errors.push(ConfigError::new("turbine.omega_nominal_rpm", "must be > 0"));
        }

        if !(0.0..=1.0).contains(&self.coupling.eta_transfer) {
            errors.push(ConfigError::new(
                "coupling.eta_transfer",
                "must be in [0.0, 1.0]",
            ));
        }

        let g = &self.grid;
        if g.inertia_h_s <= 0.0 {
            errors.push(ConfigError::new("grid.inertia_h_s", "must be > 0"));
        }
        if g.f_nominal_hz <= 0.0 {
            errors.push(ConfigError::new("grid.f_nominal_hz", "must be > 0"));
        }
        if g.s_base_mva <= 0.0 {
            errors.push(ConfigError::new("grid.s_base_mva", "must be > 0"));
        }

        let lim = &self.safety_limits;
        if lim.min_frequency_hz >= lim.max_frequency_hz {
            errors.push(ConfigError::new(
                "safety_limits.min_frequency_hz",
                "must be < safety_limits.max_frequency_hz",
            ));
        }
        if !(0.0..=1.0).contains(&lim.fuel_temp_warning_fraction) {
            errors.push(ConfigError::new(
                "safety_limits.fuel_temp_warning_fraction",
                "must be in [0.0, 1.0]",
            ));
        }

        let n = &self.normalization;
        for (field, value) in [
            ("normalization.fuel_temp_c", n.fuel_temp_c),
            ("normalization.moderator_temp_c", n.moderator_temp_c),
            ("normalization.power_mw", n.power_mw),
            ("normalization.speed_rpm", n.speed_rpm),
            ("normalization.frequency_hz", n.frequency_hz),
            ("normalization.load_mw", n.load_mw),
        ] {
            if value <= 0.0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }

        let pid = &self.controllers.pid;
        if pid.output_min >= pid.output_max {
            errors.push(ConfigError::new(
                "controllers.pid.output_min",
                "must be < controllers.pid.output_max",
            ));
        }

        errors
    }
}

use crate::config::{CouplingConfig, TurbineConfig};

/// Turbine-governor actuator and mechanical power dynamics.
///
/// The governor valve tracks its command through a first-order lag with time
/// constant τ_v; mechanical power tracks the valve-throttled steam power
/// through a second first-order lag with time constant τ_t. Shaft speed is
/// intentionally not modeled here: `GridModel` derives it from the
/// system-wide power imbalance, keeping a single source of truth.
#[derive(Debug, Clone)]
pub struct TurbineModel {
    /// Turbine mechanical time constant (s).
    tau_t: f64,
    /// Governor valve actuator time constant (s).
    tau_v: f64,
    /// Thermal-to-steam transfer efficiency (0..1).
    eta_transfer: f64,

    /// Mechanical power output (MWm).
    pub mechanical_power: f64,
    /// Actual valve position ∈ [0, 1].
    pub valve_position: f64,
}

impl TurbineModel {
    /// Creates a turbine model from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics on non-positive time constants; `PlantConfig::validate`
    /// reports these before construction.
    pub fn new(turbine: &TurbineConfig, coupling: &CouplingConfig) -> Self {
        assert!(turbine.tau_t_s > 0.0 && turbine.tau_v_s > 0.0);
        assert!((0.0..=1.0).contains(&coupling.eta_transfer));

        Self {
            tau_t: turbine.tau_t_s,
            tau_v: turbine.tau_v_s,
            eta_transfer: coupling.eta_transfer,
            mechanical_power: 0.0,
            valve_position: 0.8,
        }
    }

    /// Resets the turbine to an initial operating point.
    pub fn reset(&mut self, initial_mech_power: f64, initial_valve_pos: f64) {
        self.mechanical_power = initial_mech_power;
        self.valve_position = initial_valve_pos.clamp(0.0, 1.0);
    }

    /// Overrides the transfer efficiency (scenario parameter ramps).
    pub fn set_eta_transfer(&mut self, eta: f64) {
        self.eta_transfer = eta;
    }

    /// Advances the turbine by one time step and returns mechanical power
    /// in MWm.
    pub fn step(&mut self, dt: f64, thermal_power_mw: f64, valve_command: f64) -> f64 {
        // Governor valve actuator lag
        let dv_dt = (valve_command - self.valve_position) / self.tau_v;
        self.valve_position = (self.valve_position + dv_dt * dt).clamp(0.0, 1.0);

        // Steam power at the turbine inlet, throttled by the valve
        let effective_steam_mw = self.valve_position * self.eta_transfer * thermal_power_mw;

        // Mechanical power response lag
        let dp_dt = (effective_steam_mw - self.mechanical_power) / self.tau_t;
        self.mechanical_power += dp_dt * dt;

        self.mechanical_power
    }
}

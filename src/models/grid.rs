use crate::config::GridConfig;
use crate::scenario::LoadProfile;

/// Electrical grid frequency dynamics driven by the swing equation.
///
/// `GridModel` integrates per-unit rotor speed from the imbalance between
/// mechanical input power and electrical demand, then derives grid frequency
/// and rotor angle from it. This is the single source of truth for turbine
/// speed and frequency in the whole plant: `speed_rpm = ω_pu × nominal rpm`.
#[derive(Debug, Clone)]
pub struct GridModel {
    /// Inertia constant H (s).
    h: f64,
    /// Damping coefficient D (p.u.).
    d: f64,
    /// Nominal grid frequency (Hz).
    f_nominal: f64,
    /// System MVA base for per-unit conversion.
    s_base: f64,

    /// Grid frequency (Hz).
    pub frequency: f64,
    /// Rotor speed in per-unit (1.0 = nominal).
    pub omega_pu: f64,
    /// Rotor angle (rad).
    pub rotor_angle: f64,
    /// Electrical load demand as of the last step (MW).
    pub current_demand: f64,

    load_profile: LoadProfile,
}

impl GridModel {
    /// Creates a grid model from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics on non-positive inertia, frequency, or power base;
    /// `PlantConfig::validate` reports these before construction.
    pub fn new(cfg: &GridConfig) -> Self {
        assert!(cfg.inertia_h_s > 0.0);
        assert!(cfg.f_nominal_hz > 0.0 && cfg.s_base_mva > 0.0);

        Self {
            h: cfg.inertia_h_s,
            d: cfg.damping_d_pu,
            f_nominal: cfg.f_nominal_hz,
            s_base: cfg.s_base_mva,
            frequency: cfg.f_nominal_hz,
            omega_pu: 1.0,
            rotor_angle: 0.0,
            current_demand: 0.0,
            load_profile: LoadProfile::Constant(0.0),
        }
    }

    /// Resets the grid to nominal frequency with a constant-load fallback
    /// profile at the given demand.
    pub fn reset(&mut self, initial_load_mw: f64) {
        self.frequency = self.f_nominal;
        self.omega_pu = 1.0;
        self.rotor_angle = 0.0;
        self.current_demand = initial_load_mw;
        self.load_profile = LoadProfile::Constant(initial_load_mw);
    }

    /// Installs a scenario-specific load profile.
    pub fn set_load_profile(&mut self, profile: LoadProfile) {
        self.load_profile = profile;
    }

    /// Advances the grid by one time step.
    ///
    /// Demand comes from the active load profile plus any injected
    /// imbalance; the swing equation `d(ω_pu)/dt = (P_m − P_e − D·(ω_pu−1))
    /// / 2H` is integrated in per-unit, and frequency and rotor angle are
    /// derived from the updated speed.
    pub fn step(
        &mut self,
        dt: f64,
        mechanical_power_mw: f64,
        time_s: f64,
        step_idx: usize,
        imbalance_mw: f64,
    ) {
        self.current_demand = self.load_profile.demand_mw(time_s, step_idx) + imbalance_mw;

        let p_m_pu = mechanical_power_mw / self.s_base;
        let p_e_pu = self.current_demand / self.s_base;

        let d_omega_dt = (p_m_pu - p_e_pu - self.d * (self.omega_pu - 1.0)) / (2.0 * self.h);
        self.omega_pu += d_omega_dt * dt;

        self.frequency = self.omega_pu * self.f_nominal;
        self.rotor_angle += (self.omega_pu - 1.0) * 2.0 * std::f64::consts::PI * self.f_nominal * dt;
    }
}

use crate::config::ReactorConfig;

/// Point-kinetics reactor core with lumped thermal feedback.
///
/// `ReactorModel` integrates the point-kinetics equations (one prompt term
/// plus one delayed-neutron precursor group per configured beta/lambda pair)
/// together with a two-node lumped thermal model (fuel and average moderator
/// temperature). Reactivity feedback comes from fuel and moderator
/// temperature deviations from their nominal values; control-rod reactivity
/// is supplied externally each step.
///
/// All integration is fixed-step explicit Euler.
#[derive(Debug, Clone)]
pub struct ReactorModel {
    /// Delayed-neutron group fractions.
    beta_i: Vec<f64>,
    /// Delayed-neutron group decay constants (1/s).
    lambda_i: Vec<f64>,
    /// Total delayed-neutron fraction.
    beta_total: f64,
    /// Prompt neutron generation time (s).
    generation_time: f64,
    /// Fuel temperature reactivity coefficient (1/°C).
    alpha_f: f64,
    /// Coolant temperature reactivity coefficient (1/°C).
    alpha_c: f64,
    /// Lumped fuel heat capacity (MJ/°C).
    c_f: f64,
    /// Lumped coolant heat capacity (MJ/°C).
    c_c: f64,
    /// Fuel-to-coolant heat transfer coefficient (MW/°C).
    heat_transfer: f64,
    /// Nominal full thermal power (MWth).
    p0: f64,
    /// Nominal average coolant temperature (°C).
    t_coolant0: f64,
    /// Nominal average fuel temperature (°C).
    t_fuel0: f64,

    /// Reactor power as a fraction of nominal (≥ 0).
    pub power_fraction: f64,
    /// Precursor-group concentrations, one per delay group.
    pub precursors: Vec<f64>,
    /// Average fuel temperature (°C).
    pub t_fuel: f64,
    /// Average moderator/coolant temperature (°C).
    pub t_moderator: f64,
}

impl ReactorModel {
    /// Creates a reactor model from validated configuration.
    ///
    /// # Panics
    ///
    /// Panics on group-length mismatch or non-positive heat capacities;
    /// `PlantConfig::validate` reports these before construction.
    pub fn new(cfg: &ReactorConfig) -> Self {
        assert_eq!(cfg.beta_i.len(), cfg.lambda_i.len());
        assert!(!cfg.beta_i.is_empty());
        assert!(cfg.fuel_heat_capacity > 0.0 && cfg.coolant_heat_capacity > 0.0);

        Self {
            beta_i: cfg.beta_i.clone(),
            lambda_i: cfg.lambda_i.clone(),
            beta_total: cfg.beta_total,
            generation_time: cfg.generation_time_s,
            alpha_f: cfg.alpha_f,
            alpha_c: cfg.alpha_c,
            c_f: cfg.fuel_heat_capacity,
            c_c: cfg.coolant_heat_capacity,
            heat_transfer: cfg.heat_transfer_coeff,
            p0: cfg.nominal_power_mw,
            t_coolant0: cfg.t_coolant0_c,
            t_fuel0: cfg.t_fuel0_c,
            power_fraction: 0.0,
            precursors: vec![0.0; cfg.beta_i.len()],
            t_fuel: 0.0,
            t_moderator: 0.0,
        }
    }

    /// Resets the core to the given power fraction.
    ///
    /// Fuel and moderator temperatures scale linearly from their nominal
    /// values; precursors are seeded at their equilibrium concentration
    /// `β_i·power / (λ_i·Λ)`, zeroed when the generation time is numerically
    /// negligible.
    pub fn reset(&mut self, initial_power_fraction: f64) {
        self.power_fraction = initial_power_fraction;
        self.t_fuel = self.t_fuel0 * initial_power_fraction;
        self.t_moderator = self.t_coolant0 * initial_power_fraction;

        if self.generation_time > 1e-9 {
            for (c, (b, l)) in self
                .precursors
                .iter_mut()
                .zip(self.beta_i.iter().zip(self.lambda_i.iter()))
            {
                *c = (b / (l * self.generation_time)) * initial_power_fraction;
            }
        } else {
            self.precursors.fill(0.0);
        }
    }

    /// Advances the core by one time step and returns thermal power in MWth.
    ///
    /// `rod_reactivity` is the control-rod reactivity inserted this step.
    /// Power is clamped non-negative after integration; temperatures are
    /// left unclamped.
    pub fn step(&mut self, dt: f64, rod_reactivity: f64) -> f64 {
        // Temperature-feedback reactivity
        let rho_feedback = self.alpha_f * (self.t_fuel - self.t_fuel0)
            + self.alpha_c * (self.t_moderator - self.t_coolant0);
        let total_reactivity = rho_feedback + rod_reactivity;

        // Point kinetics (Euler)
        let lambda_c_sum: f64 = self
            .lambda_i
            .iter()
            .zip(self.precursors.iter())
            .map(|(l, c)| l * c)
            .sum();
        let dp_dt = ((total_reactivity - self.beta_total) / self.generation_time)
            * self.power_fraction
            + lambda_c_sum;
        self.power_fraction += dp_dt * dt;

        for (c, (b, l)) in self
            .precursors
            .iter_mut()
            .zip(self.beta_i.iter().zip(self.lambda_i.iter()))
        {
            let dc_dt = (b / self.generation_time) * self.power_fraction - l * *c;
            *c += dc_dt * dt;
        }

        // Lumped thermal-hydraulics
        let generated_mw = self.power_fraction * self.p0;
        let transfer_mw = self.heat_transfer * (self.t_fuel - self.t_moderator);
        self.t_fuel += (generated_mw - transfer_mw) / self.c_f * dt;
        self.t_moderator += transfer_mw / self.c_c * dt;

        self.power_fraction = self.power_fraction.max(0.0);

        self.power_fraction * self.p0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlantConfig;

    fn make_reactor() -> ReactorModel {
        ReactorModel::new(&PlantConfig::pwr_3000().reactor)
    }

    #[test]
    fn reset_scales_temperatures_linearly() {
        let mut r = make_reactor();
        r.reset(0.9);
        assert_eq!(r.power_fraction, 0.9);
        assert!((r.t_fuel - 720.0).abs() < 1e-12);
        assert!((r.t_moderator - 306.5 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn reset_seeds_equilibrium_precursors() {
        let cfg = PlantConfig::pwr_3000().reactor;
        let mut r = ReactorModel::new(&cfg);
        r.reset(1.0);
        for ((c, b), l) in r.precursors.iter().zip(&cfg.beta_i).zip(&cfg.lambda_i) {
            let expected = b / (l * cfg.generation_time_s);
            assert!((c - expected).abs() < expected * 1e-12);
        }
    }

    #[test]
    fn reset_zeroes_precursors_for_negligible_generation_time() {
        let mut cfg = PlantConfig::pwr_3000().reactor;
        cfg.generation_time_s = 0.0;
        let mut r = ReactorModel::new(&cfg);
        r.reset(1.0);
        assert!(r.precursors.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn kinetics_equilibrium_at_nominal_power() {
        // At pf=1.0 with matched temperatures and zero rod reactivity the
        // neutronics are balanced: dp/dt and dc/dt cancel to rounding error.
        let mut r = make_reactor();
        r.reset(1.0);
        let before = r.precursors.clone();
        r.step(0.02, 0.0);
        assert!((r.power_fraction - 1.0).abs() < 1e-9);
        for (c, c0) in r.precursors.iter().zip(&before) {
            assert!((c - c0).abs() < c0 * 1e-9);
        }
    }

    #[test]
    fn power_never_goes_negative() {
        let mut r = make_reactor();
        r.reset(0.5);
        // Drive a deep negative reactivity insertion for many steps.
        for _ in 0..10_000 {
            r.step(0.02, -0.05);
            assert!(r.power_fraction >= 0.0);
        }
    }

    #[test]
    fn positive_rod_reactivity_raises_power() {
        let mut r = make_reactor();
        r.reset(0.9);
        let p_before = r.power_fraction;
        for _ in 0..50 {
            r.step(0.02, 0.001);
        }
        assert!(r.power_fraction > p_before);
    }
}

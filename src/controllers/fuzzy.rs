use std::collections::BTreeMap;

use crate::config::{ConfigError, FuzzyConfig};
use crate::controllers::Controller;

/// Observation index of the controller's measurement (normalized speed).
const MEASUREMENT_OBS_INDEX: usize = 4;

/// Rule-consequent singletons, indexed `[error_set][delta_error_set]` with
/// set order Negative, Zero, Positive. A positive error (speed below the
/// setpoint) opens the valve.
const RULE_TABLE: [[f64; 3]; 3] = [
    [-1.0, -0.5, 0.0],
    [-0.5, 0.0, 0.5],
    [0.0, 0.5, 1.0],
];

/// Incremental fuzzy-logic valve controller.
///
/// Speed error and its rate of change are scaled into the [-1, 1] fuzzy
/// universe, fuzzified with three triangular membership sets, pushed through
/// a 3×3 rule table, and defuzzified by a centroid of the rule singletons.
/// The defuzzified value is an increment applied to the held valve level,
/// so the controller output is naturally smooth and bounded.
#[derive(Debug, Clone)]
pub struct FuzzyController {
    setpoint: f64,
    error_scaling: f64,
    derror_scaling: f64,
    output_scaling: f64,
    dt: f64,

    previous_error: f64,
    valve_level: f64,
}

/// Triangular membership degrees over [-1, 1]: Negative, Zero, Positive.
fn memberships(x: f64) -> [f64; 3] {
    [
        (-x).clamp(0.0, 1.0),
        (1.0 - x.abs()).max(0.0),
        x.clamp(0.0, 1.0),
    ]
}

impl FuzzyController {
    /// Creates a fuzzy controller from a validated parameter group.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a non-positive time step or non-positive
    /// scaling factors.
    pub fn new(cfg: &FuzzyConfig, dt: f64) -> Result<Self, ConfigError> {
        if dt <= 0.0 {
            return Err(ConfigError::new(
                "controllers.fuzzy",
                "time step must be > 0",
            ));
        }
        if cfg.error_scaling <= 0.0 || cfg.derror_scaling <= 0.0 {
            return Err(ConfigError::new(
                "controllers.fuzzy.error_scaling",
                "scaling factors must be > 0",
            ));
        }

        Ok(Self {
            setpoint: cfg.setpoint,
            error_scaling: cfg.error_scaling,
            derror_scaling: cfg.derror_scaling,
            output_scaling: cfg.output_scaling,
            dt,
            previous_error: 0.0,
            valve_level: 0.8,
        })
    }
}

impl Controller for FuzzyController {
    fn step(&mut self, observation: &[f64]) -> f64 {
        let measurement = observation
            .get(MEASUREMENT_OBS_INDEX)
            .copied()
            .unwrap_or(self.setpoint);

        let error = self.setpoint - measurement;
        let derror = (error - self.previous_error) / self.dt;
        self.previous_error = error;

        let e = (error * self.error_scaling).clamp(-1.0, 1.0);
        let de = (derror * self.derror_scaling).clamp(-1.0, 1.0);

        let mu_e = memberships(e);
        let mu_de = memberships(de);

        // Centroid of the fired rule singletons
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, &we) in mu_e.iter().enumerate() {
            for (j, &wde) in mu_de.iter().enumerate() {
                let w = we * wde;
                weighted += w * RULE_TABLE[i][j];
                total += w;
            }
        }
        let increment = if total > 1e-12 { weighted / total } else { 0.0 };

        self.valve_level =
            (self.valve_level + increment * self.output_scaling * self.dt).clamp(0.0, 1.0);
        self.valve_level
    }

    fn reset(&mut self) {
        self.previous_error = 0.0;
        self.valve_level = 0.8;
    }

    fn update_parameters(&mut self, params: &BTreeMap<String, f64>) {
        if let Some(&v) = params.get("error_scaling") {
            self.error_scaling = v;
        }
        if let Some(&v) = params.get("derror_scaling") {
            self.derror_scaling = v;
        }
        if let Some(&v) = params.get("output_scaling") {
            self.output_scaling = v;
        }
        if let Some(&v) = params.get("setpoint") {
            self.setpoint = v;
        }
    }

    fn get_parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("error_scaling".to_string(), self.error_scaling),
            ("derror_scaling".to_string(), self.derror_scaling),
            ("output_scaling".to_string(), self.output_scaling),
            ("setpoint".to_string(), self.setpoint),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlantConfig;

    fn make_fuzzy() -> FuzzyController {
        FuzzyController::new(&PlantConfig::pwr_3000().controllers.fuzzy, 0.02).unwrap()
    }

    fn obs_with_speed(speed: f64) -> [f64; 8] {
        let mut obs = [0.0; 8];
        obs[MEASUREMENT_OBS_INDEX] = speed;
        obs
    }

    #[test]
    fn memberships_partition_the_universe() {
        for x in [-1.0, -0.5, 0.0, 0.3, 1.0] {
            let mu = memberships(x);
            assert!((mu.iter().sum::<f64>() - 1.0).abs() < 1e-12, "x={x}");
        }
    }

    #[test]
    fn zero_error_holds_the_valve() {
        let mut flc = make_fuzzy();
        let first = flc.step(&obs_with_speed(1.0));
        let second = flc.step(&obs_with_speed(1.0));
        assert_eq!(first, 0.8);
        assert_eq!(second, 0.8);
    }

    #[test]
    fn low_speed_opens_the_valve() {
        let mut flc = make_fuzzy();
        let mut last = 0.8;
        for _ in 0..100 {
            let out = flc.step(&obs_with_speed(0.95));
            assert!(out >= last);
            last = out;
        }
        assert!(last > 0.8);
    }

    #[test]
    fn high_speed_closes_the_valve() {
        let mut flc = make_fuzzy();
        for _ in 0..100 {
            flc.step(&obs_with_speed(1.05));
        }
        assert!(flc.valve_level < 0.8);
    }

    #[test]
    fn output_stays_within_unit_interval() {
        let mut flc = make_fuzzy();
        for _ in 0..100_000 {
            let out = flc.step(&obs_with_speed(0.5));
            assert!((0.0..=1.0).contains(&out));
        }
    }

    #[test]
    fn non_positive_scaling_is_rejected() {
        let mut cfg = PlantConfig::pwr_3000().controllers.fuzzy;
        cfg.error_scaling = 0.0;
        assert!(FuzzyController::new(&cfg, 0.02).is_err());
    }

    #[test]
    fn parameters_round_trip() {
        let mut flc = make_fuzzy();
        let mut params = flc.get_parameters();
        params.insert("output_scaling".to_string(), 2.0);
        flc.update_parameters(&params);
        assert_eq!(flc.get_parameters()["output_scaling"], 2.0);
    }
}

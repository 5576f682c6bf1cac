use std::collections::BTreeMap;

use crate::config::{ConfigError, PidConfig};
use crate::controllers::Controller;

/// Observation index of the controller's measurement (normalized speed).
const MEASUREMENT_OBS_INDEX: usize = 4;

/// PID speed governor with a filtered derivative and conditional-integration
/// anti-windup.
///
/// The measurement is the normalized shaft speed at observation index 4;
/// the setpoint is expressed in the same units (1.0 = nominal speed). The
/// integral only accumulates while the full candidate output is inside the
/// output band, so a saturated actuator cannot ratchet the integral.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    setpoint: f64,
    output_min: f64,
    output_max: f64,
    deriv_filter_tau: f64,
    use_filter: bool,
    dt: f64,

    integral: f64,
    previous_error: f64,
    derivative_state: f64,
}

impl PidController {
    /// Creates a PID controller from a validated parameter group.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a non-positive time step or inverted
    /// output bounds.
    pub fn new(cfg: &PidConfig, dt: f64) -> Result<Self, ConfigError> {
        if dt <= 0.0 {
            return Err(ConfigError::new("controllers.pid", "time step must be > 0"));
        }
        if cfg.output_min >= cfg.output_max {
            return Err(ConfigError::new(
                "controllers.pid.output_min",
                "must be < controllers.pid.output_max",
            ));
        }

        // The derivative filter only makes sense when its time constant is
        // meaningfully longer than the sample period.
        let use_filter = cfg.deriv_filter_tau_s > dt * 1.5;

        Ok(Self {
            kp: cfg.kp,
            ki: cfg.ki,
            kd: cfg.kd,
            setpoint: cfg.setpoint,
            output_min: cfg.output_min,
            output_max: cfg.output_max,
            deriv_filter_tau: cfg.deriv_filter_tau_s,
            use_filter,
            dt,
            integral: 0.0,
            previous_error: 0.0,
            derivative_state: 0.0,
        })
    }
}

impl Controller for PidController {
    fn step(&mut self, observation: &[f64]) -> f64 {
        let measurement = observation
            .get(MEASUREMENT_OBS_INDEX)
            .copied()
            .unwrap_or(self.setpoint);

        let error = self.setpoint - measurement;
        let p_term = self.kp * error;

        let raw_derivative = (error - self.previous_error) / self.dt;
        let effective_derivative = if self.use_filter {
            self.derivative_state +=
                (raw_derivative - self.derivative_state) / self.deriv_filter_tau * self.dt;
            self.derivative_state
        } else {
            raw_derivative
        };
        let d_term = self.kd * effective_derivative;

        // Conditional integration: freeze the integral while the candidate
        // output is saturated in the direction of the error.
        let candidate = p_term + self.ki * self.integral + d_term;
        let saturating_high = candidate >= self.output_max && error > 0.0;
        let saturating_low = candidate <= self.output_min && error < 0.0;
        if !saturating_high && !saturating_low {
            self.integral += error * self.dt;
        }

        let output = p_term + self.ki * self.integral + d_term;
        self.previous_error = error;
        output.clamp(self.output_min, self.output_max)
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.derivative_state = 0.0;
    }

    fn update_parameters(&mut self, params: &BTreeMap<String, f64>) {
        if let Some(&kp) = params.get("kp") {
            self.kp = kp;
        }
        if let Some(&ki) = params.get("ki") {
            self.ki = ki;
        }
        if let Some(&kd) = params.get("kd") {
            self.kd = kd;
        }
        if let Some(&setpoint) = params.get("setpoint") {
            self.setpoint = setpoint;
        }
    }

    fn get_parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("kp".to_string(), self.kp),
            ("ki".to_string(), self.ki),
            ("kd".to_string(), self.kd),
            ("setpoint".to_string(), self.setpoint),
        ])
    }
}

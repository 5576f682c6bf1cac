//! Inner stabilizing regulator coupling the reactor to its thermal setpoint.

/// Fixed-gain PI regulator holding average moderator temperature at a
/// setpoint by issuing control-rod reactivity.
///
/// This is plant-internal instrumentation, not the externally supplied
/// policy. Gains are deliberately small: the point-kinetics core is very
/// sensitive and the regulator prioritizes a smooth, stable response over
/// rapid correction.
#[derive(Debug, Clone)]
pub struct InnerReactorController {
    kp: f64,
    ki: f64,
    dt: f64,
    /// Target moderator temperature (°C).
    pub setpoint: f64,
    integral: f64,
}

/// Integral clamp band for anti-windup.
const INTEGRAL_LIMIT: f64 = 5.0;
/// Symmetric reactivity output limit, bounding insertion rates.
const REACTIVITY_LIMIT: f64 = 0.005;

impl InnerReactorController {
    /// Creates the regulator for the given time step and temperature
    /// setpoint in °C.
    pub fn new(dt: f64, setpoint: f64) -> Self {
        Self {
            kp: 8.0e-5,
            ki: 2.0e-5,
            dt,
            setpoint,
            integral: 0.0,
        }
    }

    /// Zeroes the integral term and installs a new setpoint.
    pub fn reset(&mut self, setpoint: f64) {
        self.integral = 0.0;
        self.setpoint = setpoint;
    }

    /// Returns the rod reactivity for the current moderator temperature.
    pub fn step(&mut self, moderator_temp_c: f64) -> f64 {
        if self.dt <= 0.0 {
            return 0.0;
        }

        let error = self.setpoint - moderator_temp_c;
        self.integral = (self.integral + error * self.dt).clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);

        let output = self.kp * error + self.ki * self.integral;
        output.clamp(-REACTIVITY_LIMIT, REACTIVITY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_error_yields_zero_reactivity() {
        let mut c = InnerReactorController::new(0.02, 306.5);
        assert_eq!(c.step(306.5), 0.0);
    }

    #[test]
    fn output_is_clamped_for_large_errors() {
        let mut c = InnerReactorController::new(0.02, 306.5);
        assert_eq!(c.step(-10_000.0), REACTIVITY_LIMIT);
        c.reset(306.5);
        assert_eq!(c.step(10_000.0), -REACTIVITY_LIMIT);
    }

    #[test]
    fn integral_is_clamped() {
        let mut c = InnerReactorController::new(0.02, 306.5);
        // Drive a constant error far longer than the clamp band allows.
        for _ in 0..100_000 {
            c.step(300.0);
        }
        assert!(c.integral <= INTEGRAL_LIMIT);
        // Output stays bounded even with a saturated integral.
        assert!(c.step(300.0).abs() <= REACTIVITY_LIMIT);
    }

    #[test]
    fn reset_zeroes_integral_and_sets_setpoint() {
        let mut c = InnerReactorController::new(0.02, 306.5);
        for _ in 0..1000 {
            c.step(290.0);
        }
        c.reset(310.0);
        assert_eq!(c.integral, 0.0);
        assert_eq!(c.setpoint, 310.0);
    }

    #[test]
    fn non_positive_dt_is_inert() {
        let mut c = InnerReactorController::new(0.0, 306.5);
        assert_eq!(c.step(100.0), 0.0);
    }
}

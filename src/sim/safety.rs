//! Safety-limit monitor for the stepping plant.

use crate::config::SafetyLimits;

/// Per-step safety evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyStatus {
    /// Fuel temperature above the hard limit (scram condition).
    pub fuel_temp_violation: bool,
    /// Fuel temperature above the warning fraction of the hard limit.
    pub fuel_temp_warning: bool,
    /// Shaft speed above the overspeed limit.
    pub speed_violation: bool,
    /// Grid frequency outside the protection band.
    pub frequency_violation: bool,
}

impl SafetyStatus {
    /// True when any hard limit is breached.
    pub fn any_violation(&self) -> bool {
        self.fuel_temp_violation || self.speed_violation || self.frequency_violation
    }

    /// True when the episode must hard-terminate.
    ///
    /// Only a fuel-temperature breach scrams the plant; speed and frequency
    /// excursions accumulate unsafe time in metrics but let the episode run.
    pub fn is_scram(&self) -> bool {
        self.fuel_temp_violation
    }
}

/// Compares plant state against configured safety limits each step.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    limits: SafetyLimits,
}

impl SafetyMonitor {
    pub fn new(limits: SafetyLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Evaluates fuel temperature, shaft speed, and grid frequency against
    /// their limits.
    pub fn check(&self, fuel_temp_c: f64, speed_rpm: f64, frequency_hz: f64) -> SafetyStatus {
        let warn_threshold = self.limits.max_fuel_temp_c * self.limits.fuel_temp_warning_fraction;
        SafetyStatus {
            fuel_temp_violation: fuel_temp_c > self.limits.max_fuel_temp_c,
            fuel_temp_warning: fuel_temp_c > warn_threshold,
            speed_violation: speed_rpm > self.limits.max_speed_rpm,
            frequency_violation: frequency_hz < self.limits.min_frequency_hz
                || frequency_hz > self.limits.max_frequency_hz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> SafetyMonitor {
        SafetyMonitor::new(SafetyLimits::default())
    }

    #[test]
    fn nominal_state_is_safe() {
        let status = monitor().check(800.0, 1800.0, 60.0);
        assert!(!status.any_violation());
        assert!(!status.fuel_temp_warning);
        assert!(!status.is_scram());
    }

    #[test]
    fn fuel_temp_over_limit_scrams() {
        let status = monitor().check(2801.0, 1800.0, 60.0);
        assert!(status.fuel_temp_violation);
        assert!(status.is_scram());
    }

    #[test]
    fn warning_fires_below_hard_limit() {
        // Warning threshold is 0.95 * 2800 = 2660
        let status = monitor().check(2700.0, 1800.0, 60.0);
        assert!(status.fuel_temp_warning);
        assert!(!status.fuel_temp_violation);
        assert!(!status.is_scram());
    }

    #[test]
    fn speed_and_frequency_excursions_do_not_scram() {
        let status = monitor().check(800.0, 2300.0, 56.0);
        assert!(status.speed_violation);
        assert!(status.frequency_violation);
        assert!(status.any_violation());
        assert!(!status.is_scram());
    }

    #[test]
    fn frequency_band_is_inclusive_of_limits() {
        let m = monitor();
        assert!(!m.check(800.0, 1800.0, 57.0).frequency_violation);
        assert!(!m.check(800.0, 1800.0, 63.0).frequency_violation);
        assert!(m.check(800.0, 1800.0, 56.999).frequency_violation);
        assert!(m.check(800.0, 1800.0, 63.001).frequency_violation);
    }
}

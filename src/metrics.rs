//! Performance and safety metrics extracted from an episode's record stream.
//!
//! `MetricsEngine::calculate` turns a raw `StepRecord` sequence into a fixed
//! set of 24 scalar indicators. The key set is a stable contract: optimizers
//! and report generators depend on every key being present, so degraded
//! outcomes (empty input, too-short input, non-finite data) are reported as
//! tagged variants whose `values()` still materialize the full key set.

use std::collections::BTreeMap;

use crate::config::{PlantConfig, SafetyLimits};
use crate::scenario::ScenarioSpec;
use crate::sim::types::StepRecord;

/// Every metric this engine can calculate. Adding keys is backward
/// compatible; removing or renaming is not.
pub const METRIC_KEYS: [&str; 24] = [
    "transient_severity_score",
    "grid_load_following_index",
    "agility_response_time_index",
    "integrated_thermal_margin_violation_c_s",
    "thermal_transient_burden",
    "core_power_oscillation_index",
    "max_rotor_angle_deviation_rad",
    "negative_damping_events",
    "control_policy_entropy",
    "max_overshoot_speed_pct",
    "max_undershoot_speed_pct",
    "iae_freq_hz_s",
    "ise_freq_hz_s",
    "time_over_fuel_temp_limit_s",
    "time_over_speed_limit_s",
    "time_outside_freq_limit_s",
    "total_time_unsafe_s",
    "max_fuel_temp_c",
    "max_speed_rpm",
    "max_freq_deviation_hz",
    "min_freq_nadir_hz",
    "control_effort_valve_abs_sum",
    "control_effort_valve_sq_sum",
    "valve_reversals",
];

/// Minimum record count below which metrics are undefined.
const MIN_SAMPLES: usize = 20;

/// Valve-position histogram bins for the entropy metric.
const ENTROPY_BINS: usize = 20;

/// Outcome of a metrics calculation.
///
/// The degraded variants preserve the key contract through [`values`]:
/// every key maps to NaN, so batch consumers never branch on key absence.
///
/// [`values`]: MetricsReport::values
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsReport {
    /// All metrics computed from a valid record stream. A metric that does
    /// not apply to the scenario (e.g. agility outside "sudden" scenarios)
    /// is NaN inside the map.
    Computed(BTreeMap<&'static str, f64>),
    /// Input was empty or shorter than the minimum sample count.
    InsufficientData,
    /// The input contained non-finite data and computation was abandoned.
    ComputationError,
}

impl MetricsReport {
    /// Materializes the stable key set: the computed values, or every key
    /// mapped to NaN for the degraded variants.
    pub fn values(&self) -> BTreeMap<&'static str, f64> {
        match self {
            MetricsReport::Computed(map) => map.clone(),
            MetricsReport::InsufficientData | MetricsReport::ComputationError => {
                METRIC_KEYS.iter().map(|&k| (k, f64::NAN)).collect()
            }
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, MetricsReport::Computed(_))
    }
}

/// Computes the full advanced metrics suite for one episode.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    limits: SafetyLimits,
    f_nominal: f64,
    target_speed_rpm: f64,
}

impl MetricsEngine {
    pub fn new(cfg: &PlantConfig) -> Self {
        Self {
            limits: cfg.safety_limits.clone(),
            f_nominal: cfg.grid.f_nominal_hz,
            target_speed_rpm: cfg.turbine.omega_nominal_rpm,
        }
    }

    /// Calculates all metrics for an episode. Never panics: degraded inputs
    /// yield the tagged degraded variants instead.
    pub fn calculate(&self, records: &[StepRecord], scenario: &ScenarioSpec) -> MetricsReport {
        if records.len() < MIN_SAMPLES {
            return MetricsReport::InsufficientData;
        }
        match self.compute(records, scenario) {
            Some(map) => MetricsReport::Computed(map),
            None => MetricsReport::ComputationError,
        }
    }

    fn compute(
        &self,
        records: &[StepRecord],
        scenario: &ScenarioSpec,
    ) -> Option<BTreeMap<&'static str, f64>> {
        let time: Vec<f64> = records.iter().map(|r| r.time_s).collect();
        let load: Vec<f64> = records.iter().map(|r| r.load_demand_mw).collect();
        let mech: Vec<f64> = records.iter().map(|r| r.mech_power_mw).collect();
        let t_fuel: Vec<f64> = records.iter().map(|r| r.t_fuel_c).collect();
        let t_mod: Vec<f64> = records.iter().map(|r| r.t_moderator_c).collect();
        let power: Vec<f64> = records.iter().map(|r| r.reactor_power_mw).collect();
        let angle: Vec<f64> = records.iter().map(|r| r.rotor_angle_rad).collect();
        let freq: Vec<f64> = records.iter().map(|r| r.frequency_hz).collect();
        let valve: Vec<f64> = records.iter().map(|r| r.valve_position).collect();
        let speed: Vec<f64> = records.iter().map(|r| r.speed_rpm).collect();

        // Non-finite data invalidates the whole computation.
        for series in [
            &time, &load, &mech, &t_fuel, &t_mod, &power, &angle, &freq, &valve, &speed,
        ] {
            if series.iter().any(|v| !v.is_finite()) {
                return None;
            }
        }

        let dt = time[1] - time[0];
        if dt <= 0.0 {
            return None;
        }

        let mut metrics: BTreeMap<&'static str, f64> =
            METRIC_KEYS.iter().map(|&k| (k, f64::NAN)).collect();

        // Load-following index: inverse mean squared tracking error
        let mse: f64 = load
            .iter()
            .zip(mech.iter())
            .map(|(l, m)| (l - m).powi(2))
            .sum::<f64>()
            / load.len() as f64;
        metrics.insert("grid_load_following_index", 1000.0 / (1.0 + mse));

        // Agility: time to reach the configured fraction of the largest
        // sudden load jump. Only defined for "sudden" scenarios.
        if scenario.description.to_lowercase().contains("sudden") {
            if let Some(arti) = agility_response_time(
                &time,
                &load,
                &mech,
                self.limits.response_threshold,
            ) {
                metrics.insert("agility_response_time_index", arti);
            }
        }

        // Integrated violation of the thermal warning margin
        let t_warn = self.limits.max_fuel_temp_c * self.limits.fuel_temp_warning_fraction;
        let excursion: Vec<f64> = t_fuel.iter().map(|t| (t - t_warn).max(0.0)).collect();
        metrics.insert(
            "integrated_thermal_margin_violation_c_s",
            simpson(&excursion, dt),
        );

        // Cumulative moderator temperature rate of change
        let dtm_abs: Vec<f64> = t_mod.windows(2).map(|w| ((w[1] - w[0]) / dt).abs()).collect();
        metrics.insert("thermal_transient_burden", simpson(&dtm_abs, dt));

        // Steady-state power stability over the second half of the episode
        let half = &power[power.len() / 2..];
        metrics.insert("core_power_oscillation_index", sample_std(half));

        // Rotor angle stability
        let angle_max = angle.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let angle_min = angle.iter().copied().fold(f64::INFINITY, f64::min);
        metrics.insert("max_rotor_angle_deviation_rad", angle_max - angle_min);

        // Controller fighting the natural damping: power surplus while
        // overspeeding, or deficit while underspeeding
        let neg_damping = freq
            .iter()
            .zip(mech.iter().zip(load.iter()))
            .filter(|(f, (m, l))| {
                let omega_pu = **f / self.f_nominal;
                let mismatch = *m - *l;
                (mismatch > 1.0 && omega_pu > 1.0001) || (mismatch < -1.0 && omega_pu < 0.9999)
            })
            .count();
        metrics.insert("negative_damping_events", neg_damping as f64);

        metrics.insert("control_policy_entropy", valve_entropy(&valve));

        // Standard safety and tracking metrics
        let max_freq_dev = freq
            .iter()
            .map(|f| (f - self.f_nominal).abs())
            .fold(f64::NEG_INFINITY, f64::max);
        metrics.insert("max_freq_deviation_hz", max_freq_dev);
        metrics.insert(
            "min_freq_nadir_hz",
            freq.iter().copied().fold(f64::INFINITY, f64::min),
        );
        let max_speed = speed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        metrics.insert("max_speed_rpm", max_speed);
        metrics.insert(
            "max_fuel_temp_c",
            t_fuel.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        );

        let final_speed = *speed.last()?;
        let nadir_speed = speed.iter().copied().fold(f64::INFINITY, f64::min);
        let (overshoot, undershoot) = if self.target_speed_rpm > 1e-6 {
            (
                ((max_speed - final_speed) / self.target_speed_rpm * 100.0).max(0.0),
                ((final_speed - nadir_speed) / self.target_speed_rpm * 100.0).max(0.0),
            )
        } else {
            (0.0, 0.0)
        };
        metrics.insert("max_overshoot_speed_pct", overshoot);
        metrics.insert("max_undershoot_speed_pct", undershoot);

        let freq_err_abs: Vec<f64> = freq.iter().map(|f| (f - self.f_nominal).abs()).collect();
        let freq_err_sq: Vec<f64> = freq.iter().map(|f| (f - self.f_nominal).powi(2)).collect();
        metrics.insert("iae_freq_hz_s", simpson(&freq_err_abs, dt));
        metrics.insert("ise_freq_hz_s", simpson(&freq_err_sq, dt));

        let valve_diff: Vec<f64> = valve.windows(2).map(|w| w[1] - w[0]).collect();
        metrics.insert(
            "control_effort_valve_abs_sum",
            valve_diff.iter().map(|d| d.abs()).sum(),
        );
        metrics.insert(
            "control_effort_valve_sq_sum",
            valve_diff.iter().map(|d| d * d).sum(),
        );
        let signs: Vec<i8> = valve_diff.iter().map(|&d| sign(d)).collect();
        let reversals = signs.windows(2).filter(|w| w[0] != w[1]).count();
        metrics.insert("valve_reversals", reversals as f64);

        // Weighted transient-severity composite
        let freq_severity = if self.limits.freq_deviation_limit_hz > 1e-6 {
            max_freq_dev / self.limits.freq_deviation_limit_hz
        } else {
            0.0
        };
        let speed_dev_limit = self.limits.max_speed_rpm - self.target_speed_rpm;
        let speed_severity = if speed_dev_limit > 1e-6 {
            ((max_speed - self.target_speed_rpm) / speed_dev_limit).max(0.0)
        } else {
            0.0
        };
        metrics.insert(
            "transient_severity_score",
            self.limits.w_freq_severity * freq_severity
                + self.limits.w_speed_severity * speed_severity,
        );

        // Cumulative unsafe time, dt-quantized
        let time_over_fuel = t_fuel
            .iter()
            .filter(|&&t| t > self.limits.max_fuel_temp_c)
            .count() as f64
            * dt;
        let time_over_speed = speed
            .iter()
            .filter(|&&s| s > self.limits.max_speed_rpm)
            .count() as f64
            * dt;
        let time_outside_freq = freq
            .iter()
            .filter(|&&f| f < self.limits.min_frequency_hz || f > self.limits.max_frequency_hz)
            .count() as f64
            * dt;
        metrics.insert("time_over_fuel_temp_limit_s", time_over_fuel);
        metrics.insert("time_over_speed_limit_s", time_over_speed);
        metrics.insert("time_outside_freq_limit_s", time_outside_freq);
        metrics.insert(
            "total_time_unsafe_s",
            time_over_fuel + time_over_speed + time_outside_freq,
        );

        Some(metrics)
    }
}

/// Time from the largest load jump until mechanical power reaches the
/// configured fraction of the demanded change.
fn agility_response_time(
    time: &[f64],
    load: &[f64],
    mech: &[f64],
    response_threshold: f64,
) -> Option<f64> {
    let mut step_idx = 0;
    let mut largest = f64::NEG_INFINITY;
    for i in 1..load.len() {
        let jump = (load[i] - load[i - 1]).abs();
        if jump > largest {
            largest = jump;
            step_idx = i;
        }
    }
    if step_idx == 0 {
        return None;
    }

    let t_step = time[step_idx];
    let p_initial = mech[step_idx - 1];
    let p_change_req = load[step_idx] - p_initial;
    let target = p_initial + p_change_req * response_threshold;
    let sign = p_change_req.signum();

    (step_idx..time.len())
        .find(|&i| mech[i] * sign >= target * sign)
        .map(|i| time[i] - t_step)
}

/// Shannon entropy (base 2) of a 20-bin valve-position histogram.
fn valve_entropy(valve: &[f64]) -> f64 {
    if valve.len() < 2 {
        return f64::NAN;
    }
    let bin_width = 1.0 / ENTROPY_BINS as f64;
    let mut counts = [0usize; ENTROPY_BINS];
    for &v in valve {
        let bin = ((v.clamp(0.0, 1.0) / bin_width) as usize).min(ENTROPY_BINS - 1);
        counts[bin] += 1;
    }
    // Density histogram with a small floor, renormalized to a distribution
    let densities: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 / (valve.len() as f64 * bin_width) + 1e-9)
        .collect();
    let total: f64 = densities.iter().sum();
    -densities
        .iter()
        .map(|d| {
            let p = d / total;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Composite Simpson quadrature over a uniform grid.
///
/// Falls back to a trapezoid for the final interval when the sample count
/// is even, and to a pure trapezoid rule below three samples.
fn simpson(y: &[f64], dt: f64) -> f64 {
    match y.len() {
        0 | 1 => 0.0,
        2 => (y[0] + y[1]) * dt / 2.0,
        n => {
            let odd_samples = if n % 2 == 1 { n } else { n - 1 };
            let mut sum = y[0] + y[odd_samples - 1];
            for (i, &v) in y.iter().enumerate().take(odd_samples - 1).skip(1) {
                sum += if i % 2 == 1 { 4.0 * v } else { 2.0 * v };
            }
            let mut integral = sum * dt / 3.0;
            if n % 2 == 0 {
                integral += (y[n - 2] + y[n - 1]) * dt / 2.0;
            }
            integral
        }
    }
}

/// Sample standard deviation (n − 1 denominator).
fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    let mean = xs.iter().sum::<f64>() / xs.len() as f64;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario;

    fn engine() -> MetricsEngine {
        MetricsEngine::new(&PlantConfig::pwr_3000())
    }

    fn baseline_scenario() -> ScenarioSpec {
        scenario::by_name(&PlantConfig::pwr_3000(), "baseline_steady_state").unwrap()
    }

    /// Synthesizes a steady record stream at nominal conditions.
    fn steady_records(n: usize) -> Vec<StepRecord> {
        (0..n)
            .map(|i| StepRecord {
                step: i as i64 - 1,
                time_s: i as f64 * 0.02,
                power_fraction: 0.9,
                reactor_power_mw: 2700.0,
                t_fuel_c: 850.0,
                t_moderator_c: 306.5,
                valve_command: 0.85,
                valve_position: 0.85,
                mech_power_mw: 2500.0,
                speed_rpm: 1800.0,
                frequency_hz: 60.0,
                rotor_angle_rad: 0.0,
                load_demand_mw: 2500.0,
                rod_reactivity: 0.0,
                terminated: false,
                truncated: i == n - 1,
            })
            .collect()
    }

    #[test]
    fn key_set_is_stable() {
        assert_eq!(METRIC_KEYS.len(), 24);
        let report = engine().calculate(&steady_records(100), &baseline_scenario());
        let values = report.values();
        assert_eq!(values.len(), 24);
        for key in METRIC_KEYS {
            assert!(values.contains_key(key), "missing key {key}");
        }
    }

    #[test]
    fn empty_input_is_insufficient_data() {
        let report = engine().calculate(&[], &baseline_scenario());
        assert_eq!(report, MetricsReport::InsufficientData);
        assert!(report.values().values().all(|v| v.is_nan()));
    }

    #[test]
    fn short_input_is_insufficient_data() {
        let report = engine().calculate(&steady_records(19), &baseline_scenario());
        assert_eq!(report, MetricsReport::InsufficientData);
    }

    #[test]
    fn non_finite_input_is_computation_error() {
        let mut records = steady_records(100);
        records[50].frequency_hz = f64::NAN;
        let report = engine().calculate(&records, &baseline_scenario());
        assert_eq!(report, MetricsReport::ComputationError);
        assert!(report.values().values().all(|v| v.is_nan()));
    }

    #[test]
    fn steady_episode_accumulates_no_unsafe_time() {
        let report = engine().calculate(&steady_records(200), &baseline_scenario());
        let values = report.values();
        assert_eq!(values["time_over_fuel_temp_limit_s"], 0.0);
        assert_eq!(values["time_over_speed_limit_s"], 0.0);
        assert_eq!(values["time_outside_freq_limit_s"], 0.0);
        assert_eq!(values["total_time_unsafe_s"], 0.0);
    }

    #[test]
    fn perfect_tracking_maximizes_load_following_index() {
        let report = engine().calculate(&steady_records(200), &baseline_scenario());
        assert_eq!(report.values()["grid_load_following_index"], 1000.0);
    }

    #[test]
    fn unsafe_time_counts_excursion_steps() {
        let mut records = steady_records(200);
        for r in &mut records[40..90] {
            r.frequency_hz = 56.0; // below the 57 Hz floor
        }
        let values = engine().calculate(&records, &baseline_scenario()).values();
        assert!((values["time_outside_freq_limit_s"] - 50.0 * 0.02).abs() < 1e-12);
        assert!((values["total_time_unsafe_s"] - 1.0).abs() < 1e-12);
        assert_eq!(values["min_freq_nadir_hz"], 56.0);
        assert_eq!(values["max_freq_deviation_hz"], 4.0);
    }

    #[test]
    fn agility_only_defined_for_sudden_scenarios() {
        let n = 200;
        let mut records = steady_records(n);
        // Load steps +125 MW at t = 1.0 s; mechanical power follows 0.4 s later.
        for (i, r) in records.iter_mut().enumerate() {
            if i >= 50 {
                r.load_demand_mw = 2625.0;
            }
            if i >= 70 {
                r.mech_power_mw = 2625.0;
            }
        }
        let cfg = PlantConfig::pwr_3000();
        let sudden = scenario::by_name(&cfg, "sudden_load_increase_5pct").unwrap();

        let values = engine().calculate(&records, &sudden).values();
        let arti = values["agility_response_time_index"];
        assert!((arti - 0.4).abs() < 1e-9, "arti was {arti}");

        // Same data under a non-sudden scenario: agility stays undefined.
        let values = engine().calculate(&records, &baseline_scenario()).values();
        assert!(values["agility_response_time_index"].is_nan());
    }

    #[test]
    fn constant_valve_has_near_zero_entropy() {
        let values = engine()
            .calculate(&steady_records(500), &baseline_scenario())
            .values();
        assert!(values["control_policy_entropy"] < 0.01);
        assert_eq!(values["control_effort_valve_abs_sum"], 0.0);
        assert_eq!(values["valve_reversals"], 0.0);
    }

    #[test]
    fn dithering_valve_raises_entropy_and_reversals() {
        let mut records = steady_records(500);
        for (i, r) in records.iter_mut().enumerate() {
            r.valve_position = if i % 2 == 0 { 0.2 } else { 0.9 };
        }
        let values = engine().calculate(&records, &baseline_scenario()).values();
        assert!(values["control_policy_entropy"] > 0.5);
        assert!(values["valve_reversals"] > 400.0);
        assert!(values["control_effort_valve_abs_sum"] > 300.0);
    }

    #[test]
    fn thermal_margin_violation_integrates_excess() {
        let mut records = steady_records(101);
        // 100 K above the 2660 °C warning threshold for the whole episode
        for r in &mut records {
            r.t_fuel_c = 2760.0;
        }
        let values = engine().calculate(&records, &baseline_scenario()).values();
        // 100 K over 2.0 s of episode
        assert!((values["integrated_thermal_margin_violation_c_s"] - 200.0).abs() < 1e-6);
        // Still below the 2800 hard limit, so no unsafe time
        assert_eq!(values["time_over_fuel_temp_limit_s"], 0.0);
    }

    #[test]
    fn simpson_integrates_polynomials_exactly() {
        // Simpson is exact for quadratics on an odd sample count.
        let dt = 0.1;
        let y: Vec<f64> = (0..101).map(|i| (i as f64 * dt).powi(2)).collect();
        let exact = 10.0_f64.powi(3) / 3.0;
        assert!((simpson(&y, dt) - exact).abs() < 1e-9);
    }

    #[test]
    fn sample_std_matches_hand_computation() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Sample variance 4.571428..., std 2.13809...
        assert!((sample_std(&xs) - 4.571_428_571_428_571_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn transient_severity_composes_weighted_excursions() {
        let mut records = steady_records(100);
        for r in &mut records[10..20] {
            r.frequency_hz = 60.5; // 0.5 Hz deviation, limit 1.0
            r.speed_rpm = 2025.0; // 225 rpm over target, limit band 450
        }
        let values = engine().calculate(&records, &baseline_scenario()).values();
        // 0.6 * 0.5 + 0.4 * 0.5 = 0.5
        assert!((values["transient_severity_score"] - 0.5).abs() < 1e-12);
    }
}

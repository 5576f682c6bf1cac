//! Seeded pseudo-randomness: adversarial observation noise and domain
//! randomization of physics parameters.

use rand::{Rng, rngs::StdRng};

use crate::config::PlantConfig;
use crate::scenario::AdversarialNoise;
use crate::sim::types::Observation;

/// Generates Gaussian noise using the Box-Muller transform.
///
/// Returns a draw from a zero-mean Gaussian with the given standard
/// deviation, or 0.0 when `std_dev` is non-positive.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Perturbs a normalized observation in place with per-component Gaussian
/// noise at the schedule's magnitude for the given episode progress.
///
/// Only the observation is perturbed; the underlying physical truth is
/// untouched.
pub fn perturb_observation(
    noise: &AdversarialNoise,
    rng: &mut StdRng,
    obs: &mut Observation,
    progress: f64,
) {
    let std_dev = noise.magnitude_at(progress);
    for component in obs.iter_mut() {
        *component += gaussian_noise(rng, std_dev);
    }
}

/// Fractional half-width of the domain-randomization band.
const RANDOMIZATION_SPAN: f64 = 0.10;

/// Randomizes key physics parameters by ±10% for a domain-randomization
/// drill. Applied to a fresh copy of the configuration at reset, before any
/// model is constructed.
pub fn randomize_physics(cfg: &mut PlantConfig, rng: &mut StdRng) {
    let lo = 1.0 - RANDOMIZATION_SPAN;
    let hi = 1.0 + RANDOMIZATION_SPAN;

    cfg.reactor.alpha_f *= rng.random_range(lo..=hi);
    cfg.reactor.alpha_c *= rng.random_range(lo..=hi);
    cfg.reactor.fuel_heat_capacity *= rng.random_range(lo..=hi);
    cfg.coupling.eta_transfer = (cfg.coupling.eta_transfer * rng.random_range(lo..=hi)).min(1.0);
    cfg.grid.inertia_h_s *= rng.random_range(lo..=hi);
}

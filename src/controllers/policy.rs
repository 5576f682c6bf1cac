use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::controllers::Controller;
use crate::sim::types::OBS_LEN;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    policy: PolicyParams,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyParams {
    weights: Vec<f64>,
    bias: f64,
}

/// Wrapper presenting a learned linear policy as a [`Controller`].
///
/// The policy is `action = clamp(w·obs + b, 0, 1)` with one weight per
/// observation component, loaded from a static, non-executable TOML file:
///
/// ```toml
/// [policy]
/// weights = [0.0, 0.0, 0.0, 0.0, -4.0, 0.0, 1.0, 0.0]
/// bias = 4.8
/// ```
///
/// Handing the driver a non-finite action (e.g. from a corrupted weight
/// file) is treated as a controller fault by the episode runner, which
/// substitutes the neutral action and keeps the batch alive.
#[derive(Debug, Clone)]
pub struct PolicyController {
    weights: Vec<f64>,
    bias: f64,
}

impl PolicyController {
    /// Creates a policy from explicit weights and bias.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the weight vector does not have one
    /// entry per observation component.
    pub fn new(weights: Vec<f64>, bias: f64) -> Result<Self, ConfigError> {
        if weights.len() != OBS_LEN {
            return Err(ConfigError::new(
                "policy.weights",
                format!("expected {OBS_LEN} weights, got {}", weights.len()),
            ));
        }
        Ok(Self { weights, bias })
    }

    /// Loads a policy from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read, the TOML is
    /// invalid, or the weight arity is wrong.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("policy", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a policy from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: PolicyFile =
            toml::from_str(s).map_err(|e| ConfigError::new("policy", e.to_string()))?;
        Self::new(file.policy.weights, file.policy.bias)
    }
}

impl Controller for PolicyController {
    fn step(&mut self, observation: &[f64]) -> f64 {
        if observation.len() != self.weights.len() {
            // Arity mismatch at runtime: surface it as a fault, not a panic.
            return f64::NAN;
        }
        let dot: f64 = self
            .weights
            .iter()
            .zip(observation.iter())
            .map(|(w, x)| w * x)
            .sum();
        (dot + self.bias).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {}

    fn update_parameters(&mut self, params: &BTreeMap<String, f64>) {
        if let Some(&b) = params.get("bias") {
            self.bias = b;
        }
        for (i, w) in self.weights.iter_mut().enumerate() {
            if let Some(&v) = params.get(&format!("w{i}")) {
                *w = v;
            }
        }
    }

    fn get_parameters(&self) -> BTreeMap<String, f64> {
        let mut params = BTreeMap::from([("bias".to_string(), self.bias)]);
        for (i, w) in self.weights.iter().enumerate() {
            params.insert(format!("w{i}"), *w);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_weight_arity_is_rejected() {
        assert!(PolicyController::new(vec![1.0; 3], 0.0).is_err());
        assert!(PolicyController::new(vec![0.0; OBS_LEN], 0.0).is_ok());
    }

    #[test]
    fn computes_clamped_affine_action() {
        let mut w = vec![0.0; OBS_LEN];
        w[4] = -1.0;
        let mut policy = PolicyController::new(w, 1.5).unwrap();

        let mut obs = [0.0; OBS_LEN];
        obs[4] = 1.0;
        assert_eq!(policy.step(&obs), 0.5);

        obs[4] = -5.0;
        assert_eq!(policy.step(&obs), 1.0);
        obs[4] = 50.0;
        assert_eq!(policy.step(&obs), 0.0);
    }

    #[test]
    fn observation_arity_mismatch_yields_nan() {
        let mut policy = PolicyController::new(vec![0.0; OBS_LEN], 0.5).unwrap();
        assert!(policy.step(&[1.0, 2.0]).is_nan());
    }

    #[test]
    fn parses_policy_toml() {
        let toml = r#"
[policy]
weights = [0.0, 0.0, 0.0, 0.0, -4.0, 0.0, 1.0, 0.0]
bias = 4.8
"#;
        let mut policy = PolicyController::from_toml_str(toml).unwrap();
        let mut obs = [0.0; OBS_LEN];
        obs[4] = 1.0;
        obs[6] = 0.8;
        assert!((policy.step(&obs) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed_policy_toml() {
        assert!(PolicyController::from_toml_str("[policy]\nbias = 1.0").is_err());
        assert!(PolicyController::from_toml_str("weights = [1.0]").is_err());
    }

    #[test]
    fn parameters_round_trip() {
        let mut policy = PolicyController::new(vec![0.0; OBS_LEN], 0.5).unwrap();
        let mut params = policy.get_parameters();
        assert_eq!(params.len(), OBS_LEN + 1);
        params.insert("w4".to_string(), -2.0);
        params.insert("bias".to_string(), 2.0);
        policy.update_parameters(&params);
        let after = policy.get_parameters();
        assert_eq!(after["w4"], -2.0);
        assert_eq!(after["bias"], 2.0);
    }
}

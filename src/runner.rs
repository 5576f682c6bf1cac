//! Episode driver: runs one controller against one environment, shielding
//! the batch from controller faults, and extracts metrics and a verdict.

use std::fmt;

use crate::controllers::Controller;
use crate::metrics::{MetricsEngine, MetricsReport};
use crate::sim::environment::PlantEnvironment;
use crate::sim::types::{EnvError, StepRecord};

/// Mid-range valve command substituted when a controller faults.
const NEUTRAL_ACTION: f64 = 0.5;

/// Why an episode stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Nominal completion: the configured step count was reached.
    Truncated,
    /// A hard safety limit terminated the episode.
    SafetyViolation,
    /// The environment refused to run (lifecycle misuse).
    EnvFailure(EnvError),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Truncated => write!(f, "completed nominally"),
            TerminationReason::SafetyViolation => write!(f, "safety-limit violation"),
            TerminationReason::EnvFailure(e) => write!(f, "environment failure: {e}"),
        }
    }
}

/// Full record stream and outcome of one episode.
#[derive(Debug, Clone)]
pub struct EpisodeResult {
    pub records: Vec<StepRecord>,
    pub reason: TerminationReason,
    /// Steps where the controller produced a non-finite action and the
    /// neutral action was substituted.
    pub controller_faults: usize,
}

/// Episode result paired with its metrics and success verdict.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub episode: EpisodeResult,
    pub metrics: MetricsReport,
    /// Nominal completion with zero accumulated unsafe time.
    pub success: bool,
}

/// Drives one full episode: reset, step until termination or truncation,
/// close.
///
/// A controller that yields a non-finite action does not kill the episode;
/// the neutral mid-range valve command is substituted, the fault is counted
/// and logged, and the loop continues.
pub fn run_episode(env: &mut PlantEnvironment, controller: &mut dyn Controller) -> EpisodeResult {
    controller.reset();

    let options = env.scenario().reset_options.clone();
    let (mut observation, initial) = match env.reset(&options) {
        Ok(pair) => pair,
        Err(e) => {
            return EpisodeResult {
                records: Vec::new(),
                reason: TerminationReason::EnvFailure(e),
                controller_faults: 0,
            };
        }
    };

    let mut records = vec![initial];
    let mut controller_faults = 0;

    let reason = loop {
        let mut action = controller.step(&observation);
        if !action.is_finite() {
            controller_faults += 1;
            eprintln!(
                "controller fault at step {}: non-finite action, substituting {NEUTRAL_ACTION}",
                records.len() - 1
            );
            action = NEUTRAL_ACTION;
        }

        match env.step(action) {
            Ok(outcome) => {
                observation = outcome.observation;
                records.push(outcome.record);
                if outcome.terminated {
                    break TerminationReason::SafetyViolation;
                }
                if outcome.truncated {
                    break TerminationReason::Truncated;
                }
            }
            Err(e) => break TerminationReason::EnvFailure(e),
        }
    };

    env.close();

    EpisodeResult {
        records,
        reason,
        controller_faults,
    }
}

/// Runs one episode and extracts its metrics and success verdict.
///
/// Success means the episode completed nominally (truncation, not a safety
/// violation) and `total_time_unsafe_s` is exactly zero; undefined metrics
/// never count as success.
pub fn evaluate(
    env: &mut PlantEnvironment,
    controller: &mut dyn Controller,
    engine: &MetricsEngine,
) -> Evaluation {
    let episode = run_episode(env, controller);
    let metrics = engine.calculate(&episode.records, env.scenario());
    let success = episode.reason == TerminationReason::Truncated
        && metrics
            .values()
            .get("total_time_unsafe_s")
            .is_some_and(|&t| t == 0.0);

    Evaluation {
        episode,
        metrics,
        success,
    }
}

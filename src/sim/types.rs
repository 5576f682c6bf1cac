//! Core types shared by the environment, runner, and metrics.

use std::fmt;

/// Number of components in a normalized observation vector.
pub const OBS_LEN: usize = 8;

/// Normalized observation handed to external controllers.
///
/// Layout: `[power_fraction, fuel_temp, moderator_temp, mech_power, speed,
/// frequency, valve_position, load_demand]` — speed at index 4.
pub type Observation = [f64; OBS_LEN];

/// Lifecycle phase of a `PlantEnvironment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvPhase {
    Uninitialized,
    Ready,
    Stepping,
    Terminated,
    Truncated,
    Closed,
}

/// One row of episode telemetry: the full raw physical state after a step.
///
/// The initial record emitted by `reset` carries `step == -1`; step records
/// are numbered from 0. Sequences are append-only and owned by the episode
/// driver.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step: i64,
    pub time_s: f64,
    pub power_fraction: f64,
    pub reactor_power_mw: f64,
    pub t_fuel_c: f64,
    pub t_moderator_c: f64,
    pub valve_command: f64,
    pub valve_position: f64,
    pub mech_power_mw: f64,
    pub speed_rpm: f64,
    pub frequency_hz: f64,
    pub rotor_angle_rad: f64,
    pub load_demand_mw: f64,
    pub rod_reactivity: f64,
    pub terminated: bool,
    pub truncated: bool,
}

/// Result of a single environment step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub observation: Observation,
    /// Reward shaping is left to training wrappers; always 0.
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub record: StepRecord,
}

/// Environment lifecycle misuse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// `step` called before the first `reset`.
    NotReset,
    /// `step` called after the episode terminated or truncated.
    EpisodeOver,
    /// `reset` or `step` called after `close`.
    Closed,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::NotReset => write!(f, "environment was stepped before reset"),
            EnvError::EpisodeOver => {
                write!(f, "episode already finished; call reset to start a new one")
            }
            EnvError::Closed => write!(f, "environment is closed"),
        }
    }
}

impl std::error::Error for EnvError {}

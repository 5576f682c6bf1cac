//! Episode orchestration: environment state machine, inner regulator,
//! safety monitoring, and noise injection.

pub mod environment;
/// Fixed-gain PI rod-reactivity regulator.
pub mod inner_control;
/// Seeded observation noise and domain randomization.
pub mod noise;
pub mod safety;
pub mod types;

pub use environment::PlantEnvironment;
pub use inner_control::InnerReactorController;
pub use safety::{SafetyMonitor, SafetyStatus};
pub use types::{EnvError, EnvPhase, OBS_LEN, Observation, StepOutcome, StepRecord};

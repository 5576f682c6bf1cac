//! Digital-twin simulator of a pressurized-water power plant.
//!
//! The crate couples a point-kinetics reactor core, a turbine-governor, and
//! a swing-equation grid into an episodic environment used to evaluate and
//! tune valve-control policies against a library of operational and
//! adversarial scenarios.

/// Validated plant configuration and the built-in reference preset.
pub mod config;
/// External controller contract and variants.
pub mod controllers;
/// Telemetry export.
pub mod io;
/// Per-episode performance and safety metrics.
pub mod metrics;
/// Pure physics state-transition models.
pub mod models;
/// Episode report rendering.
pub mod reporting;
/// Episode driver and evaluation.
pub mod runner;
/// Scenario catalog and load profiles.
pub mod scenario;
/// Environment orchestration: state machine, safety, noise.
pub mod sim;

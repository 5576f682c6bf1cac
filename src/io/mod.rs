//! Telemetry input/output.

/// CSV telemetry export.
pub mod export;

//! Pure state-transition physics models for the coupled plant.

/// Swing-equation grid frequency model.
pub mod grid;
/// Point-kinetics reactor core with thermal feedback.
pub mod reactor;
/// Governor valve and turbine mechanical power lags.
pub mod turbine;

// Re-export the main types for convenience
pub use grid::GridModel;
pub use reactor::ReactorModel;
pub use turbine::TurbineModel;

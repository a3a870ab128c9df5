//! Configuration for the gravity model and the calibration search.

mod gravity;

pub use gravity::{
    CalibrationConfig, DEFAULT_BETA_BRACKET, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
    GravityConfig,
};

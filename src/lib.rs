//! Doubly-constrained gravity modelling and adaptive hierarchical zoning
//! over planar point demand.

#![allow(clippy::too_many_arguments)]

// Core modules
pub mod config;
pub mod error;
pub mod gravity;
pub mod utils;
pub mod zoning;

// Re-export commonly used types outside of crate
pub use config::{CalibrationConfig, GravityConfig};
pub use error::{Result, ZoningError};
pub use gravity::{
    BalanceObserver, DistanceMatrix, GravityOutcome, LogObserver, calibrate_doubly_constrained,
    distance_matrix_from_points, doubly_constrained,
};
pub use zoning::{AdaptiveZoneSystem, ZoneSystemBuilder};

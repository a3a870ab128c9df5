//! Gravity model and calibration configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default beta search bracket for calibration.
/// The lower bound is kept strictly positive because beta must be > 0.
pub const DEFAULT_BETA_BRACKET: (f64, f64) = (1e-9, 1.0);

/// Settings for the doubly-constrained balancer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GravityConfig {
    /// Convergence tolerance on the maximum relative deviation of the
    /// achieved row/column sums from the origin/destination targets.
    pub tolerance: f64,

    /// Iteration budget for the proportional fitting loop. Exceeding it
    /// surfaces a convergence error carrying the last residual.
    pub max_iterations: usize,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Settings for the beta root search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Lower end of the beta bracket (must be > 0).
    pub beta_min: f64,
    /// Upper end of the beta bracket.
    pub beta_max: f64,
    /// Bisection stops once the bracket is narrower than this.
    pub beta_tolerance: f64,

    /// Passed through to every inner balancer run.
    pub gravity: GravityConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            beta_min: DEFAULT_BETA_BRACKET.0,
            beta_max: DEFAULT_BETA_BRACKET.1,
            beta_tolerance: 1e-6,
            gravity: GravityConfig::default(),
        }
    }
}

//! Error types for the adaptive zoning core.

use thiserror::Error;

/// Top-level error type for the crate.
///
/// Nothing in the core retries automatically; widening a calibration
/// bracket or raising an iteration budget is caller policy.
#[derive(Debug, Error)]
pub enum ZoningError {
    /// Malformed or mismatched input arrays, or a required parameter out
    /// of range. Surfaced immediately, never recovered silently.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Iterative proportional fitting did not reach tolerance within the
    /// iteration budget. Carries the last achieved residual so the caller
    /// can decide whether an approximate result is acceptable.
    #[error("balancing did not converge after {iterations} iterations (residual {residual:.3e})")]
    Convergence { residual: f64, iterations: usize },

    /// The root search for beta could not proceed: the bracket does not
    /// straddle the target, or an inner balance failed mid-search.
    #[error("calibration failed: {0}")]
    Calibration(String),
}

pub type Result<T> = std::result::Result<T, ZoningError>;

impl ZoningError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ZoningError::InvalidInput(msg.into())
    }
}

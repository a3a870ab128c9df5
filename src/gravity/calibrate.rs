use crate::config::CalibrationConfig;
use crate::error::{Result, ZoningError};
use crate::gravity::distance::DistanceMatrix;
use crate::gravity::model::doubly_constrained;

/// Finds the beta that reproduces a target mean trip distance, by
/// bisection.
///
/// Relies on the realized mean distance being strictly decreasing in beta
/// (stronger decay, shorter trips). The search aborts rather than guess:
/// a bracket whose endpoints sit on the same side of the target, or any
/// inner balancing failure, surfaces a calibration error.
pub fn calibrate_doubly_constrained(
    origins: &[f64],
    destinations: &[f64],
    distance: &DistanceMatrix,
    target_mean_distance: f64,
    config: &CalibrationConfig,
) -> Result<f64> {
    if !(target_mean_distance > 0.0) || !target_mean_distance.is_finite() {
        return Err(ZoningError::invalid(format!(
            "target mean distance must be > 0, got {target_mean_distance}"
        )));
    }
    if !(config.beta_min > 0.0) || !(config.beta_max > config.beta_min) {
        return Err(ZoningError::invalid(format!(
            "beta bracket must satisfy 0 < beta_min < beta_max, got [{}, {}]",
            config.beta_min, config.beta_max
        )));
    }

    let mean_at = |beta: f64| -> Result<f64> {
        doubly_constrained(origins, destinations, distance, beta, &config.gravity, None)
            .map(|out| out.mean_distance)
            .map_err(|err| ZoningError::Calibration(format!("balancing failed at beta {beta}: {err}")))
    };

    // Low beta yields the longest trips, high beta the shortest.
    let mean_max = mean_at(config.beta_min)?;
    let mean_min = mean_at(config.beta_max)?;

    if mean_max < target_mean_distance {
        return Err(ZoningError::Calibration(format!(
            "target {target_mean_distance} exceeds mean distance {mean_max} at beta_min {}; lower the bracket",
            config.beta_min
        )));
    }
    if mean_min > target_mean_distance {
        return Err(ZoningError::Calibration(format!(
            "target {target_mean_distance} is below mean distance {mean_min} at beta_max {}; raise the bracket",
            config.beta_max
        )));
    }

    let (mut lo, mut hi) = (config.beta_min, config.beta_max);
    while (hi - lo) > config.beta_tolerance {
        let mid = (lo + hi) / 2.0;
        if mean_at(mid)? < target_mean_distance {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let beta = (lo + hi) / 2.0;
    log::info!("calibrate_doubly_constrained: beta {beta:.6} for target {target_mean_distance}");
    Ok(beta)
}

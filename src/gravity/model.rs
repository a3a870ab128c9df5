use rayon::prelude::*;

use crate::config::GravityConfig;
use crate::error::{Result, ZoningError};
use crate::gravity::distance::DistanceMatrix;

/// Diagnostic hook for the balancing loop.
///
/// Fires once per iteration with the residual achieved so far. Observers
/// are a side-channel only; they must not (and cannot) affect the numeric
/// result.
pub trait BalanceObserver {
    fn on_iteration(&mut self, iteration: usize, residual: f64);
}

/// Routes iteration diagnostics to the `log` facade at debug level.
pub struct LogObserver;

impl BalanceObserver for LogObserver {
    fn on_iteration(&mut self, iteration: usize, residual: f64) {
        log::debug!("doubly_constrained: iteration {iteration}, residual {residual:.3e}");
    }
}

/// Result of a converged balancing run.
#[derive(Clone, Debug)]
pub struct GravityOutcome {
    /// Full trip matrix, `trips[i][j] = a_i * b_j * O_i * D_j * exp(-beta * d_ij)`.
    pub trips: Vec<Vec<f64>>,
    /// Trip-weighted mean distance. Zero when the matrix carries no trips.
    pub mean_distance: f64,
    /// Per-origin balancing factors (0 for zero-total origins).
    pub a: Vec<f64>,
    /// Per-destination balancing factors (0 for zero-total destinations).
    pub b: Vec<f64>,
    /// Iterations actually spent.
    pub iterations: usize,
}

/// Solves the doubly-constrained spatial interaction model
/// `T_ij = a_i * b_j * O_i * D_j * exp(-beta * d_ij)` by iterative
/// proportional fitting.
///
/// Guarantees on success: every row of `trips` sums to the matching origin
/// total and every column to the matching destination total, within
/// `config.tolerance` (relative). Zero-total origins/destinations get a
/// balancing factor of exactly 0 and contribute zero rows/columns.
///
/// Fails with a convergence error carrying the last residual when the
/// iteration budget runs out; the caller decides whether to retry with a
/// larger budget.
pub fn doubly_constrained(
    origins: &[f64],
    destinations: &[f64],
    distance: &DistanceMatrix,
    beta: f64,
    config: &GravityConfig,
    mut observer: Option<&mut dyn BalanceObserver>,
) -> Result<GravityOutcome> {
    let n = distance.len();
    validate_inputs(origins, destinations, n, beta, config.tolerance)?;
    if config.max_iterations == 0 {
        return Err(ZoningError::invalid("max_iterations must be >= 1"));
    }

    // Prior interaction weights; constant across iterations.
    let prior: Vec<f64> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let row = distance.row(i);
            let o_i = origins[i];
            (0..n).map(move |j| o_i * destinations[j] * (-beta * row[j]).exp())
        })
        .collect();

    let mut a = vec![1.0; n];
    let mut b = vec![1.0; n];
    let mut residual = f64::INFINITY;
    let mut iterations = 0;

    for iteration in 1..=config.max_iterations {
        iterations = iteration;

        // a_i = O_i / sum_j(prior_ij * b_j); zero-total rows stay at 0
        a = prior
            .par_chunks(n)
            .zip(origins.par_iter())
            .map(|(row, &o_i)| {
                let denom: f64 = row.iter().zip(&b).map(|(p, bj)| p * bj).sum();
                if denom > 0.0 { o_i / denom } else { 0.0 }
            })
            .collect();

        // b_j = D_j / sum_i(a_i * prior_ij)
        b = (0..n)
            .into_par_iter()
            .map(|j| {
                let denom: f64 = (0..n).map(|i| a[i] * prior[i * n + j]).sum();
                if denom > 0.0 { destinations[j] / denom } else { 0.0 }
            })
            .collect();

        // The b update makes column sums exact, so the residual is how far
        // the row sums have drifted from the origin targets.
        residual = prior
            .par_chunks(n)
            .zip(a.par_iter().zip(origins.par_iter()))
            .map(|(row, (&a_i, &o_i))| {
                let achieved: f64 = a_i * row.iter().zip(&b).map(|(p, bj)| p * bj).sum::<f64>();
                if o_i > 0.0 {
                    (achieved - o_i).abs() / o_i
                } else {
                    achieved.abs()
                }
            })
            .reduce(|| 0.0, f64::max);

        if let Some(obs) = observer.as_deref_mut() {
            obs.on_iteration(iteration, residual);
        }

        if residual < config.tolerance {
            log::debug!("doubly_constrained: converged after {iteration} iterations");
            break;
        }

        if iteration == config.max_iterations {
            return Err(ZoningError::Convergence {
                residual,
                iterations: iteration,
            });
        }
    }

    // Realize the trip matrix and its trip-weighted mean distance.
    let mut total_trips = 0.0;
    let mut total_trip_distance = 0.0;
    let mut trips = Vec::with_capacity(n);
    for i in 0..n {
        let d_row = distance.row(i);
        let p_row = &prior[i * n..(i + 1) * n];
        let mut row = Vec::with_capacity(n);
        for j in 0..n {
            let t = a[i] * b[j] * p_row[j];
            total_trips += t;
            total_trip_distance += t * d_row[j];
            row.push(t);
        }
        trips.push(row);
    }
    let mean_distance = if total_trips > 0.0 {
        total_trip_distance / total_trips
    } else {
        0.0
    };

    Ok(GravityOutcome {
        trips,
        mean_distance,
        a,
        b,
        iterations,
    })
}

fn validate_inputs(
    origins: &[f64],
    destinations: &[f64],
    n: usize,
    beta: f64,
    tolerance: f64,
) -> Result<()> {
    if origins.len() != n || destinations.len() != n {
        return Err(ZoningError::invalid(format!(
            "array lengths must match the {n}x{n} distance matrix (origins: {}, destinations: {})",
            origins.len(),
            destinations.len()
        )));
    }
    if !(beta > 0.0) || !beta.is_finite() {
        return Err(ZoningError::invalid(format!("beta must be > 0, got {beta}")));
    }
    for (name, values) in [("origins", origins), ("destinations", destinations)] {
        if let Some(idx) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(ZoningError::invalid(format!(
                "{name}[{idx}] must be finite and >= 0, got {}",
                values[idx]
            )));
        }
    }
    let total_o: f64 = origins.iter().sum();
    let total_d: f64 = destinations.iter().sum();
    let scale = total_o.max(total_d).max(1.0);
    if (total_o - total_d).abs() > tolerance * scale {
        return Err(ZoningError::invalid(format!(
            "origin and destination totals must balance (got {total_o} vs {total_d})"
        )));
    }
    Ok(())
}

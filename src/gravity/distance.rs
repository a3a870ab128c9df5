use rayon::prelude::*;

use crate::error::{Result, ZoningError};

/// Square symmetric matrix of pairwise planar distances.
///
/// Flat row-major storage; the diagonal is exactly zero and symmetry is
/// exact because each unordered pair is computed once.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Number of points (the matrix is `len() x len()`).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Row `i` as a slice, for callers iterating one origin at a time.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}

/// Builds the Euclidean distance matrix for an ordered point set.
///
/// Rows are computed in parallel; each row fills only its upper-triangle
/// entries and the mirror pass copies them down, so symmetry holds exactly.
pub fn distance_matrix_from_points(points: &[(f64, f64)]) -> Result<DistanceMatrix> {
    if points.is_empty() {
        return Err(ZoningError::invalid("need at least one point"));
    }
    if let Some(idx) = points
        .iter()
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(ZoningError::invalid(format!(
            "point {idx} has a non-finite coordinate"
        )));
    }

    let n = points.len();
    let mut data = vec![0.0; n * n];

    // Upper triangle, one row per task
    data.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
        let (xi, yi) = points[i];
        for (j, cell) in row.iter_mut().enumerate().skip(i + 1) {
            let dx = xi - points[j].0;
            let dy = yi - points[j].1;
            *cell = (dx * dx + dy * dy).sqrt();
        }
    });

    // Mirror down so d[j][i] is bit-identical to d[i][j]
    for i in 0..n {
        for j in (i + 1)..n {
            data[j * n + i] = data[i * n + j];
        }
    }

    Ok(DistanceMatrix { n, data })
}

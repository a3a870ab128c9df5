use crate::error::{Result, ZoningError};

/// Per-zone attribute arena.
///
/// Leaf entries come first, in input order; aggregate entries are appended
/// as merges happen, so a zone index works across the tree, the distance
/// cache, and this arena alike. Entries are never mutated once written.
#[derive(Clone, Debug)]
pub struct ZoneData {
    origins: Vec<f64>,
    destinations: Vec<f64>,
    weights: Vec<f64>,
    centroids: Vec<(f64, f64)>,
}

impl ZoneData {
    pub fn new(
        origins: &[f64],
        destinations: &[f64],
        weights: &[f64],
        centroids: &[(f64, f64)],
    ) -> Result<Self> {
        let n = origins.len();
        if n == 0 {
            return Err(ZoningError::invalid("need at least one zone"));
        }
        if destinations.len() != n || weights.len() != n || centroids.len() != n {
            return Err(ZoningError::invalid(format!(
                "zone arrays must have equal length (origins: {n}, destinations: {}, weights: {}, centroids: {})",
                destinations.len(),
                weights.len(),
                centroids.len()
            )));
        }
        for (name, values) in [
            ("origins", origins),
            ("destinations", destinations),
            ("weights", weights),
        ] {
            if let Some(idx) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(ZoningError::invalid(format!(
                    "{name}[{idx}] must be finite and >= 0, got {}",
                    values[idx]
                )));
            }
        }
        if let Some(idx) = centroids
            .iter()
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(ZoningError::invalid(format!(
                "centroid {idx} has a non-finite coordinate"
            )));
        }

        Ok(Self {
            origins: origins.to_vec(),
            destinations: destinations.to_vec(),
            weights: weights.to_vec(),
            centroids: centroids.to_vec(),
        })
    }

    /// Appends the aggregate entry for a new parent zone: attribute sums,
    /// weight-mean centroid. When the combined weight is zero the centroid
    /// falls back to the plain mean of the child centroids.
    pub fn append_parent(&mut self, children: &[usize]) {
        let origin: f64 = children.iter().map(|&c| self.origins[c]).sum();
        let destination: f64 = children.iter().map(|&c| self.destinations[c]).sum();
        let weight: f64 = children.iter().map(|&c| self.weights[c]).sum();

        let (x, y) = if weight > 0.0 {
            children.iter().fold((0.0, 0.0), |(x, y), &c| {
                let w = self.weights[c] / weight;
                (x + self.centroids[c].0 * w, y + self.centroids[c].1 * w)
            })
        } else {
            let k = children.len() as f64;
            children.iter().fold((0.0, 0.0), |(x, y), &c| {
                (x + self.centroids[c].0 / k, y + self.centroids[c].1 / k)
            })
        };

        self.origins.push(origin);
        self.destinations.push(destination);
        self.weights.push(weight);
        self.centroids.push((x, y));
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    #[inline]
    pub fn origin(&self, zone: usize) -> f64 {
        self.origins[zone]
    }

    #[inline]
    pub fn destination(&self, zone: usize) -> f64 {
        self.destinations[zone]
    }

    #[inline]
    pub fn weight(&self, zone: usize) -> f64 {
        self.weights[zone]
    }

    #[inline]
    pub fn centroid(&self, zone: usize) -> (f64, f64) {
        self.centroids[zone]
    }

    pub fn centroids(&self) -> &[(f64, f64)] {
        &self.centroids
    }
}

use std::collections::HashMap;

use crate::zoning::data::ZoneData;
use crate::zoning::tree::ZoneTree;

/// Cached zone-to-zone distances over the merge tree.
///
/// Leaf pairs use the Euclidean distance between centroids. Any pair
/// involving an aggregate is the weight-mean of the distances from its
/// children, computed recursively and cached. Only the half with i <= j is
/// stored; the self-distance of an aggregate is its internal distance.
#[derive(Clone, Debug)]
pub struct LazyDistance {
    cache: Vec<HashMap<usize, f64>>,
}

impl LazyDistance {
    pub fn new(num_zones: usize) -> Self {
        Self {
            cache: vec![HashMap::new(); num_zones],
        }
    }

    /// Extends the cache for a freshly appended aggregate zone.
    pub fn add_zone(&mut self) {
        self.cache.push(HashMap::new());
    }

    pub fn get(&mut self, i: usize, j: usize, tree: &ZoneTree, data: &ZoneData) -> f64 {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        if let Some(&d) = self.cache[i].get(&j) {
            return d;
        }

        // Children always have lower indices than their parent, so
        // recursing on the higher index terminates at leaf pairs.
        let d = if tree.is_leaf(j) {
            let (xi, yi) = data.centroid(i);
            let (xj, yj) = data.centroid(j);
            ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt()
        } else {
            let children = tree.children(j).to_vec();
            let total: f64 = children.iter().map(|&c| data.weight(c)).sum();
            if total > 0.0 {
                children
                    .iter()
                    .map(|&c| data.weight(c) / total * self.get(i, c, tree, data))
                    .sum()
            } else {
                let k = children.len() as f64;
                children
                    .iter()
                    .map(|&c| self.get(i, c, tree, data) / k)
                    .sum()
            }
        };

        self.cache[i].insert(j, d);
        d
    }
}

use std::collections::BTreeSet;

use itertools::Itertools;

/// Merge-candidate graph over zones.
///
/// Seeded from the symmetrised k-nearest-neighbour graph of the leaf
/// centroids; merging rewires every neighbour of the merged children onto
/// the new parent zone. Sets are ordered so candidate generation is
/// deterministic.
#[derive(Clone, Debug)]
pub struct Adjacency {
    adjacents: Vec<BTreeSet<usize>>,
}

impl Adjacency {
    pub fn new(centroids: &[(f64, f64)], k: usize) -> Self {
        let n = centroids.len();
        let mut adjacents = vec![BTreeSet::new(); n];
        for i in 0..n {
            let (xi, yi) = centroids[i];
            let nearest = (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    let dx = xi - centroids[j].0;
                    let dy = yi - centroids[j].1;
                    (dx * dx + dy * dy, j)
                })
                .sorted_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                .take(k);
            for (_, j) in nearest {
                adjacents[i].insert(j);
                adjacents[j].insert(i);
            }
        }
        Self { adjacents }
    }

    /// Rewires the graph after `children` merge into one new zone (index =
    /// current node count). Returns the new zone's neighbours, ascending.
    pub fn merge(&mut self, children: &[usize]) -> Vec<usize> {
        let parent = self.adjacents.len();
        let mut merged: BTreeSet<usize> = children
            .iter()
            .flat_map(|&c| self.adjacents[c].iter().copied())
            .collect();
        for &c in children {
            merged.remove(&c);
        }

        for &neighbour in &merged {
            for &c in children {
                self.adjacents[neighbour].remove(&c);
            }
            self.adjacents[neighbour].insert(parent);
        }
        let out: Vec<usize> = merged.iter().copied().collect();
        self.adjacents.push(merged);
        out
    }

    pub fn neighbours(&self, zone: usize) -> &BTreeSet<usize> {
        &self.adjacents[zone]
    }

    pub fn len(&self) -> usize {
        self.adjacents.len()
    }
}

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use crate::zoning::adjacency::Adjacency;
use crate::zoning::data::ZoneData;
use crate::zoning::lazy_distance::LazyDistance;
use crate::zoning::tree::ZoneTree;

/// A candidate pair in the merge queue.
///
/// Ordered by aggregation cost ascending; equal costs break ties on
/// `(lo, hi)`, so the pair holding the lowest original index merges first.
#[derive(Clone, Copy, Debug, PartialEq)]
struct MergeCandidate {
    cost: f64,
    lo: usize,
    hi: usize,
}

impl Eq for MergeCandidate {}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.lo.cmp(&other.lo))
            .then(self.hi.cmp(&other.hi))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Builds the zone hierarchy by repeated lowest-cost pair merging.
///
/// Candidates come from the k-nearest-neighbour graph over centroids and
/// are kept in a min-heap keyed on the aggregation cost
/// `w_c * exp(beta * d_cc) - sum_i(w_i * exp(beta * d_ii))`, evaluated in
/// log space. Entries whose members have since been merged are skipped on
/// pop. If the heap drains while more than one zone is active, candidates
/// are reseeded from the remaining active set, so the build always ends in
/// a single root.
pub struct ClusterMaker {
    data: ZoneData,
    beta: f64,
    tree: ZoneTree,
    distance: LazyDistance,
    adjacency: Adjacency,
    queue: BinaryHeap<Reverse<MergeCandidate>>,
}

impl ClusterMaker {
    pub fn new(data: ZoneData, beta: f64, neighbourhood_size: usize) -> Self {
        let n = data.len();
        let adjacency = Adjacency::new(data.centroids(), neighbourhood_size);
        Self {
            data,
            beta,
            tree: ZoneTree::new(n),
            distance: LazyDistance::new(n),
            adjacency,
            queue: BinaryHeap::new(),
        }
    }

    /// Runs the full merge and hands back the tree together with the
    /// extended attribute arena and the populated distance cache.
    pub fn build(mut self) -> (ZoneTree, ZoneData, LazyDistance) {
        let n = self.tree.num_leaves();

        // Every adjacent leaf pair is an initial candidate.
        let seed_pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| {
                self.adjacency
                    .neighbours(i)
                    .iter()
                    .filter(move |&&j| i < j)
                    .map(move |&j| (i, j))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (i, j) in seed_pairs {
            self.push_candidate(i, j);
        }

        loop {
            while let Some(Reverse(candidate)) = self.queue.pop() {
                if self.tree.parent(candidate.lo).is_some()
                    || self.tree.parent(candidate.hi).is_some()
                {
                    continue; // stale: a member already merged
                }
                self.merge(candidate.lo, candidate.hi);
            }

            let active: Vec<usize> = (0..self.tree.len())
                .filter(|&zone| self.tree.parent(zone).is_none())
                .collect();
            if active.len() <= 1 {
                break;
            }
            log::debug!(
                "cluster: candidate queue drained with {} active zones, reseeding",
                active.len()
            );
            self.reseed(&active);
        }

        log::info!(
            "cluster: merged {} leaf zones into a tree of {} nodes",
            n,
            self.tree.len()
        );
        (self.tree, self.data, self.distance)
    }

    fn merge(&mut self, lo: usize, hi: usize) {
        let parent = self.tree.append_parent(vec![lo, hi]);
        self.data.append_parent(&[lo, hi]);
        self.distance.add_zone();

        let neighbours = self.adjacency.merge(&[lo, hi]);
        for neighbour in neighbours {
            if self.tree.parent(neighbour).is_none() {
                self.push_candidate(neighbour, parent);
            }
        }
    }

    fn push_candidate(&mut self, a: usize, b: usize) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let cost = self.log_cost(&[lo, hi]);
        self.queue.push(Reverse(MergeCandidate { cost, lo, hi }));
    }

    /// Log of the aggregation cost for merging `candidate`, via the
    /// max-shift trick so large `beta * distance` products cannot
    /// overflow. Zero weights are clamped to the smallest positive float
    /// before the log; ordering among positive-weight pairs is unchanged.
    fn log_cost(&mut self, candidate: &[usize]) -> f64 {
        let beta = self.beta;
        let weights: Vec<f64> = candidate
            .iter()
            .map(|&c| self.data.weight(c).max(f64::MIN_POSITIVE))
            .collect();
        let w_combi: f64 = weights.iter().sum();

        // Internal distance of the merged zone (all ordered child pairs,
        // self terms included).
        let mut dii_combi = 0.0;
        for (ai, &a) in candidate.iter().enumerate() {
            for (bi, &b) in candidate.iter().enumerate() {
                dii_combi += self.distance.get(a, b, &self.tree, &self.data)
                    * weights[ai]
                    * weights[bi];
            }
        }
        dii_combi /= w_combi * w_combi;

        let x: Vec<f64> = candidate
            .iter()
            .zip(&weights)
            .map(|(&c, &w)| beta * self.distance.get(c, c, &self.tree, &self.data) + w.ln())
            .collect();
        let x_combi = beta * dii_combi + w_combi.ln();
        let x_max = x.iter().fold(x_combi, |m, &v| m.max(v));

        x_max + ((x_combi - x_max).exp() - x.iter().map(|&v| (v - x_max).exp()).sum::<f64>()).ln()
    }

    /// Refills the queue from the current active set: each active zone
    /// nominates its nearest active peer by centroid distance.
    fn reseed(&mut self, active: &[usize]) {
        let mut pairs = BTreeSet::new();
        for &i in active {
            let (xi, yi) = self.data.centroid(i);
            let nearest = active
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| {
                    let (xj, yj) = self.data.centroid(j);
                    ((xi - xj).powi(2) + (yi - yj).powi(2), j)
                })
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            if let Some((_, j)) = nearest {
                pairs.insert((i.min(j), i.max(j)));
            }
        }
        for (i, j) in pairs {
            self.push_candidate(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_square() -> (ZoneTree, ZoneData, LazyDistance) {
        let data = ZoneData::new(
            &[1.0; 4],
            &[1.0; 4],
            &[1.0; 4],
            &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)],
        )
        .unwrap();
        ClusterMaker::new(data, 1.0, 2).build()
    }

    #[test]
    fn four_points_merge_to_a_single_root() {
        let (tree, data, _) = build_square();
        assert_eq!(tree.num_leaves(), 4);
        assert_eq!(tree.len(), 7); // 4 leaves + 3 pair merges
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(data.len(), tree.len());
        // Root aggregates everything.
        assert_eq!(data.origin(tree.root()), 4.0);
        assert_eq!(data.weight(tree.root()), 4.0);
        assert_eq!(data.centroid(tree.root()), (0.5, 0.5));
    }

    #[test]
    fn every_resolution_partitions_the_leaves() {
        let (tree, _, _) = build_square();
        for m in 1..=4 {
            let active = tree.active_at_resolution(m);
            assert_eq!(active.len(), m);
            let mut leaves: Vec<usize> = active.iter().flat_map(|&z| tree.leaves_of(z)).collect();
            leaves.sort_unstable();
            assert_eq!(leaves, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn resolution_two_splits_unit_square_in_halves() {
        let (tree, _, _) = build_square();
        let active = tree.active_at_resolution(2);
        for &zone in &active {
            assert_eq!(tree.leaves_of(zone).len(), 2);
        }
    }

    #[test]
    fn disconnected_candidate_graph_still_reaches_a_root() {
        // Two far-apart pairs with k = 1: the kNN graph has two components,
        // so the final merge can only come from reseeding.
        let data = ZoneData::new(
            &[1.0; 4],
            &[1.0; 4],
            &[1.0; 4],
            &[(0.0, 0.0), (1.0, 0.0), (100.0, 0.0), (101.0, 0.0)],
        )
        .unwrap();
        let (tree, _, _) = ClusterMaker::new(data, 0.05, 1).build();
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.active_at_resolution(1), vec![6]);
        // The close pairs merge before the cross-gap merge.
        let halves = tree.active_at_resolution(2);
        let mut sides: Vec<Vec<usize>> =
            halves.iter().map(|&z| tree.leaves_of(z)).collect();
        sides.sort();
        assert_eq!(sides, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn single_zone_builds_trivially() {
        let data = ZoneData::new(&[1.0], &[1.0], &[1.0], &[(0.0, 0.0)]).unwrap();
        let (tree, _, _) = ClusterMaker::new(data, 1.0, 1).build();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), 0);
        assert_eq!(tree.active_at_resolution(1), vec![0]);
    }
}

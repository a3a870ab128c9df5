use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use crate::zoning::data::ZoneData;
use crate::zoning::lazy_distance::LazyDistance;
use crate::zoning::tree::ZoneTree;

/// The resolution at which a zone first becomes active: leaves live at
/// resolution n, the aggregate created by merge step s (0-based) at
/// n - s - 1.
pub fn level_of(tree: &ZoneTree, zone: usize) -> usize {
    let n = tree.num_leaves();
    if tree.is_leaf(zone) {
        n
    } else {
        n - (zone - n) - 1
    }
}

/// K nearest peers of `zone` among the zones active at its own hierarchy
/// level, ordered ascending by centroid distance, ties broken by zone
/// index. `zone` itself is excluded; fewer than `k` come back only when
/// fewer peers exist.
pub fn same_level_neighbours(
    tree: &ZoneTree,
    data: &ZoneData,
    zone: usize,
    k: usize,
) -> Vec<usize> {
    let (x, y) = data.centroid(zone);
    let mut ranked: Vec<(f64, usize)> = tree
        .active_at_resolution(level_of(tree, zone))
        .into_iter()
        .filter(|&peer| peer != zone)
        .map(|peer| {
            let (px, py) = data.centroid(peer);
            ((x - px).powi(2) + (y - py).powi(2), peer)
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    ranked.into_iter().take(k).map(|(_, peer)| peer).collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Expansion {
    priority: f64,
    zone: usize,
}

impl Eq for Expansion {}

impl Ord for Expansion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.zone.cmp(&other.zone))
    }
}

impl PartialOrd for Expansion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Builds the per-leaf adaptive neighbourhoods of the Hagen-Zanker & Jin
/// method: each leaf starts with the root in view and repeatedly splits
/// the most interaction-relevant aggregate into its children until
/// `size` zones are held. Distant demand stays aggregated; nearby demand
/// gets resolved down to leaves.
pub struct NeighbourhoodMaker<'a> {
    tree: &'a ZoneTree,
    data: &'a ZoneData,
    distance: &'a mut LazyDistance,
    beta: f64,
    size: usize,
}

impl<'a> NeighbourhoodMaker<'a> {
    pub fn new(
        tree: &'a ZoneTree,
        data: &'a ZoneData,
        distance: &'a mut LazyDistance,
        beta: f64,
        size: usize,
    ) -> Self {
        Self {
            tree,
            data,
            distance,
            beta,
            size,
        }
    }

    /// Negated log interaction criterion for splitting zone `j` while
    /// building the neighbourhood of leaf `i` (the heap pops smallest
    /// first). Zero origins/destinations are clamped below the log so
    /// zero-demand zones rank last without disturbing the rest.
    fn priority(&mut self, i: usize, j: usize) -> f64 {
        let d_ii = self.distance.get(i, i, self.tree, self.data);
        let d_jj = self.distance.get(j, j, self.tree, self.data);
        let d_ij = self.distance.get(i, j, self.tree, self.data);

        let log_o = self.data.origin(i).max(f64::MIN_POSITIVE).ln();
        let log_d = self.data.destination(j).max(f64::MIN_POSITIVE).ln();
        let spread = (1.0 - (-2.0 * self.beta * (d_ii + d_jj)).exp()).ln();

        -(log_o + log_d + self.beta * (d_ii + d_jj - d_ij) + spread)
    }

    /// One neighbourhood per leaf, each a set of zone indices mixing
    /// leaves and aggregates.
    pub fn create(mut self) -> Vec<BTreeSet<usize>> {
        let root = self.tree.root();
        (0..self.tree.num_leaves())
            .map(|leaf| self.create_for(leaf, root))
            .collect()
    }

    fn create_for(&mut self, leaf: usize, root: usize) -> BTreeSet<usize> {
        let mut neighbourhood = BTreeSet::from([root]);
        let mut queue = BinaryHeap::new();
        if !self.tree.is_leaf(root) {
            let priority = self.priority(leaf, root);
            queue.push(Reverse(Expansion {
                priority,
                zone: root,
            }));
        }

        while neighbourhood.len() < self.size {
            let Some(Reverse(Expansion { zone, .. })) = queue.pop() else {
                break;
            };
            neighbourhood.remove(&zone);
            for &child in self.tree.children(zone) {
                neighbourhood.insert(child);
                if !self.tree.is_leaf(child) {
                    let priority = self.priority(leaf, child);
                    queue.push(Reverse(Expansion {
                        priority,
                        zone: child,
                    }));
                }
            }
        }
        neighbourhood
    }
}

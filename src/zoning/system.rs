use std::collections::BTreeSet;

use crate::error::{Result, ZoningError};
use crate::zoning::cluster::ClusterMaker;
use crate::zoning::data::ZoneData;
use crate::zoning::neighbourhood::{NeighbourhoodMaker, level_of, same_level_neighbours};
use crate::zoning::tree::ZoneTree;

/// Configuration for an [`AdaptiveZoneSystem`] build.
///
/// Splitting configuration from construction keeps the (potentially
/// expensive) hierarchy build an explicit step: collect the inputs here,
/// then call [`build`](Self::build).
pub struct ZoneSystemBuilder {
    origins: Vec<f64>,
    destinations: Vec<f64>,
    weights: Vec<f64>,
    points: Vec<(f64, f64)>,
    beta: f64,
    neighbourhood_size: usize,
}

impl ZoneSystemBuilder {
    pub fn new(
        origins: Vec<f64>,
        destinations: Vec<f64>,
        weights: Vec<f64>,
        points: Vec<(f64, f64)>,
        beta: f64,
        neighbourhood_size: usize,
    ) -> Self {
        Self {
            origins,
            destinations,
            weights,
            points,
            beta,
            neighbourhood_size,
        }
    }

    /// Validates the inputs, runs the hierarchical merge and the per-leaf
    /// neighbourhood expansion, and returns the finished immutable system.
    pub fn build(self) -> Result<AdaptiveZoneSystem> {
        if !(self.beta > 0.0) || !self.beta.is_finite() {
            return Err(ZoningError::invalid(format!(
                "beta must be > 0, got {}",
                self.beta
            )));
        }
        if self.neighbourhood_size < 1 {
            return Err(ZoningError::invalid("neighbourhood size must be >= 1"));
        }
        let data = ZoneData::new(
            &self.origins,
            &self.destinations,
            &self.weights,
            &self.points,
        )?;

        let clusterer = ClusterMaker::new(data, self.beta, self.neighbourhood_size);
        let (tree, data, mut distance) = clusterer.build();
        let leaf_neighbourhoods = NeighbourhoodMaker::new(
            &tree,
            &data,
            &mut distance,
            self.beta,
            self.neighbourhood_size,
        )
        .create();

        log::info!(
            "zone system: {} atomic zones, {} total, neighbourhood size {}",
            tree.num_leaves(),
            tree.len(),
            self.neighbourhood_size
        );

        Ok(AdaptiveZoneSystem {
            tree,
            data,
            leaf_neighbourhoods,
            beta: self.beta,
            neighbourhood_size: self.neighbourhood_size,
        })
    }
}

/// Multi-resolution zoning over a set of weighted demand points.
///
/// Holds the merge tree built bottom-up from the input points, the
/// aggregated attributes of every zone in it, and one adaptive
/// neighbourhood per leaf. Immutable once built; safe for one thread at a
/// time.
#[derive(Debug)]
pub struct AdaptiveZoneSystem {
    tree: ZoneTree,
    data: ZoneData,
    leaf_neighbourhoods: Vec<BTreeSet<usize>>,
    beta: f64,
    neighbourhood_size: usize,
}

impl AdaptiveZoneSystem {
    /// Builds the system eagerly from input arrays. Equivalent to
    /// [`ZoneSystemBuilder::new`] followed by `build()`.
    pub fn new(
        origins: Vec<f64>,
        destinations: Vec<f64>,
        weights: Vec<f64>,
        points: Vec<(f64, f64)>,
        beta: f64,
        neighbourhood_size: usize,
    ) -> Result<Self> {
        ZoneSystemBuilder::new(
            origins,
            destinations,
            weights,
            points,
            beta,
            neighbourhood_size,
        )
        .build()
    }

    /// The zones active when exactly `count` top-level aggregates remain.
    /// Together they partition the original points exactly. Requests
    /// outside `[1, n]` are clamped to that range, not rejected.
    pub fn select_resolution(&self, count: usize) -> Vec<usize> {
        self.tree.active_at_resolution(count)
    }

    /// The `k` nearest peers of `zone` at its own hierarchy level, closest
    /// first, ties broken by zone index, `zone` itself excluded.
    pub fn neighbourhood(&self, zone: usize, k: usize) -> Result<Vec<usize>> {
        self.check_zone(zone)?;
        Ok(same_level_neighbours(&self.tree, &self.data, zone, k))
    }

    /// Number of initial (leaf) zones.
    pub fn num_atomic_zones(&self) -> usize {
        self.tree.num_leaves()
    }

    /// Total zone count, aggregates included.
    pub fn num_zones(&self) -> usize {
        self.tree.len()
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn neighbourhood_size(&self) -> usize {
        self.neighbourhood_size
    }

    pub fn origin(&self, zone: usize) -> Result<f64> {
        self.check_zone(zone)?;
        Ok(self.data.origin(zone))
    }

    pub fn destination(&self, zone: usize) -> Result<f64> {
        self.check_zone(zone)?;
        Ok(self.data.destination(zone))
    }

    pub fn weight(&self, zone: usize) -> Result<f64> {
        self.check_zone(zone)?;
        Ok(self.data.weight(zone))
    }

    /// Weight-aggregated centroid; stable for the lifetime of the system,
    /// which is what a Voronoi renderer needs as generator points.
    pub fn centroid(&self, zone: usize) -> Result<(f64, f64)> {
        self.check_zone(zone)?;
        Ok(self.data.centroid(zone))
    }

    pub fn parent(&self, zone: usize) -> Result<Option<usize>> {
        self.check_zone(zone)?;
        Ok(self.tree.parent(zone))
    }

    pub fn children(&self, zone: usize) -> Result<&[usize]> {
        self.check_zone(zone)?;
        Ok(self.tree.children(zone))
    }

    /// All original points covered by `zone`, ascending.
    pub fn leaves_of(&self, zone: usize) -> Result<Vec<usize>> {
        self.check_zone(zone)?;
        Ok(self.tree.leaves_of(zone))
    }

    /// The resolution at which `zone` first becomes active.
    pub fn level_of(&self, zone: usize) -> Result<usize> {
        self.check_zone(zone)?;
        Ok(level_of(&self.tree, zone))
    }

    /// Labels every original point with its covering zone at resolution
    /// `count` (clamped); `renumber` compacts labels to `0..count`.
    pub fn map_leaves_to_clusters(&self, count: usize, renumber: bool) -> Vec<usize> {
        self.tree.map_leaves_to_groups(count, renumber)
    }

    /// The adaptive neighbourhood of each leaf: a mixed-level set of zones
    /// partitioning all original points, resolved finely near the leaf and
    /// coarsely far away.
    pub fn leaf_neighbourhoods(&self) -> &[BTreeSet<usize>] {
        &self.leaf_neighbourhoods
    }

    /// For every zone, which leaves hold it in their adaptive
    /// neighbourhood.
    pub fn transposed_neighbourhoods(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.num_zones()];
        for (leaf, neighbourhood) in self.leaf_neighbourhoods.iter().enumerate() {
            for &zone in neighbourhood {
                out[zone].push(leaf);
            }
        }
        out
    }

    /// Labels every original point with the member of `center`'s adaptive
    /// neighbourhood covering it, for rendering the neighbourhood as an
    /// aggregation pattern. `renumber` compacts labels to `0..len`.
    pub fn map_leaves_to_neighbourhood(&self, center: usize, renumber: bool) -> Result<Vec<usize>> {
        if center >= self.num_atomic_zones() {
            return Err(ZoningError::invalid(format!(
                "center must be a leaf zone index below {}, got {center}",
                self.num_atomic_zones()
            )));
        }
        let mut out = vec![0; self.num_atomic_zones()];
        for (position, &zone) in self.leaf_neighbourhoods[center].iter().enumerate() {
            let label = if renumber { position } else { zone };
            for leaf in self.tree.leaves_of(zone) {
                out[leaf] = label;
            }
        }
        Ok(out)
    }

    fn check_zone(&self, zone: usize) -> Result<()> {
        if zone >= self.num_zones() {
            return Err(ZoningError::invalid(format!(
                "zone index {zone} out of range (have {})",
                self.num_zones()
            )));
        }
        Ok(())
    }
}

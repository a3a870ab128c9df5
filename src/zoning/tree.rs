/// Arena merge tree over zones.
///
/// The first `num_leaves` indices are the input zones; every merge appends
/// a parent node, so parents always carry a higher index than their
/// children and the append order doubles as the merge order. No nested
/// ownership: relationships are plain index vectors.
#[derive(Clone, Debug)]
pub struct ZoneTree {
    num_leaves: usize,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl ZoneTree {
    pub fn new(num_leaves: usize) -> Self {
        Self {
            num_leaves,
            parent: vec![None; num_leaves],
            children: vec![Vec::new(); num_leaves],
        }
    }

    /// Records a merge: the children get a freshly appended parent node.
    /// Returns the new parent's index.
    pub fn append_parent(&mut self, children: Vec<usize>) -> usize {
        let parent_index = self.parent.len();
        for &c in &children {
            debug_assert!(self.parent[c].is_none(), "zone {c} merged twice");
            self.parent[c] = Some(parent_index);
        }
        self.parent.push(None);
        self.children.push(children);
        parent_index
    }

    /// The last appended node; the global root once merging has finished.
    pub fn root(&self) -> usize {
        self.parent.len() - 1
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Total node count, leaves plus aggregates.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn is_leaf(&self, zone: usize) -> bool {
        zone < self.num_leaves
    }

    pub fn parent(&self, zone: usize) -> Option<usize> {
        self.parent[zone]
    }

    pub fn children(&self, zone: usize) -> &[usize] {
        &self.children[zone]
    }

    /// All original leaf zones covered by `zone`, ascending.
    pub fn leaves_of(&self, zone: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![zone];
        while let Some(node) = stack.pop() {
            if self.is_leaf(node) {
                leaves.push(node);
            } else {
                stack.extend_from_slice(&self.children[node]);
            }
        }
        leaves.sort_unstable();
        leaves
    }

    /// The zones active once exactly `count` remain, i.e. the hierarchy
    /// state after undoing the last merges. `count` outside the achievable
    /// range is clamped (defined behavior, not an error). Ascending order.
    pub fn active_at_resolution(&self, count: usize) -> Vec<usize> {
        let merges = self.len() - self.num_leaves;
        let min_count = self.num_leaves - merges;
        let count = count.clamp(min_count.max(1), self.num_leaves);

        // Replaying the first (num_leaves - count) pair merges leaves the
        // nodes below `cutoff` whose parent (if any) sits at or above it.
        let cutoff = self.num_leaves + (self.num_leaves - count);
        (0..cutoff)
            .filter(|&zone| match self.parent[zone] {
                None => true,
                Some(p) => p >= cutoff,
            })
            .collect()
    }

    /// Maps every leaf to the active zone covering it at resolution
    /// `count`. With `renumber` the labels are compacted to `0..count` in
    /// ascending zone-index order; otherwise they are the zone indices.
    pub fn map_leaves_to_groups(&self, count: usize, renumber: bool) -> Vec<usize> {
        let mut out = vec![0; self.num_leaves];
        for (group, &zone) in self.active_at_resolution(count).iter().enumerate() {
            let label = if renumber { group } else { zone };
            for leaf in self.leaves_of(zone) {
                out[leaf] = label;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4 leaves, merged (0,1) -> 4, (2,3) -> 5, (4,5) -> 6.
    fn sample_tree() -> ZoneTree {
        let mut tree = ZoneTree::new(4);
        tree.append_parent(vec![0, 1]);
        tree.append_parent(vec![2, 3]);
        tree.append_parent(vec![4, 5]);
        tree
    }

    #[test]
    fn parents_and_children_are_consistent() {
        let tree = sample_tree();
        assert_eq!(tree.root(), 6);
        assert_eq!(tree.parent(0), Some(4));
        assert_eq!(tree.parent(4), Some(6));
        assert_eq!(tree.parent(6), None);
        assert_eq!(tree.children(5), &[2, 3]);
        assert!(tree.is_leaf(3));
        assert!(!tree.is_leaf(4));
    }

    #[test]
    fn resolution_slices_partition_the_leaves() {
        let tree = sample_tree();
        assert_eq!(tree.active_at_resolution(4), vec![0, 1, 2, 3]);
        assert_eq!(tree.active_at_resolution(3), vec![2, 3, 4]);
        assert_eq!(tree.active_at_resolution(2), vec![4, 5]);
        assert_eq!(tree.active_at_resolution(1), vec![6]);

        for m in 1..=4 {
            let active = tree.active_at_resolution(m);
            assert_eq!(active.len(), m);
            let mut covered: Vec<usize> =
                active.iter().flat_map(|&z| tree.leaves_of(z)).collect();
            covered.sort_unstable();
            assert_eq!(covered, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn out_of_range_resolutions_clamp() {
        let tree = sample_tree();
        assert_eq!(tree.active_at_resolution(0), vec![6]);
        assert_eq!(tree.active_at_resolution(99), vec![0, 1, 2, 3]);
    }

    #[test]
    fn leaf_mapping_respects_renumbering() {
        let tree = sample_tree();
        assert_eq!(tree.map_leaves_to_groups(2, false), vec![4, 4, 5, 5]);
        assert_eq!(tree.map_leaves_to_groups(2, true), vec![0, 0, 1, 1]);
    }
}

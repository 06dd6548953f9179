use eframe::egui::Vec2;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::network::{Network, NodeIndex};

/// Position of one index member, tagged with its slot in `members`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexedPoint {
    position: [f32; 2],
    slot: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = point[0] - self.position[0];
        let dy = point[1] - self.position[1];
        dx * dx + dy * dy
    }
}

/// Nearest-node lookup over a subset of the network. Rebuilt whole whenever
/// the subset or the positions change.
#[derive(Clone)]
pub struct SpatialIndex {
    members: Vec<NodeIndex>,
    tree: RTree<IndexedPoint>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("members", &self.members.len())
            .field("indexed", &self.tree.size())
            .finish()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            tree: RTree::new(),
        }
    }
}

impl SpatialIndex {
    /// Indexes `members`, dropping indices past the end of the network.
    /// Members without a finite position stay listed but are never found.
    pub fn build(network: &Network, members: Vec<NodeIndex>) -> Self {
        let members = members
            .into_iter()
            .filter(|&index| index < network.nodes.len())
            .collect::<Vec<_>>();
        let points = members
            .iter()
            .enumerate()
            .filter_map(|(slot, &index)| {
                let pos = network.nodes[index].pos;
                pos.is_finite().then_some(IndexedPoint {
                    position: [pos.x, pos.y],
                    slot,
                })
            })
            .collect();
        Self {
            members,
            tree: RTree::bulk_load(points),
        }
    }

    pub fn all(network: &Network) -> Self {
        Self::build(network, (0..network.nodes.len()).collect())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[NodeIndex] {
        &self.members
    }

    /// Nearest member to `point`. Equidistant members resolve to the one
    /// listed first.
    pub fn find(&self, point: Vec2) -> Option<NodeIndex> {
        if !point.is_finite() {
            return None;
        }
        let query = [point.x, point.y];
        let mut nearest = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = nearest.next()?;
        let slot = nearest
            .take_while(|&(_, distance)| distance <= best)
            .map(|(entry, _)| entry.slot)
            .fold(first.slot, usize::min);
        self.members.get(slot).copied()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::layout::LayoutConfig;
    use crate::network::fixtures::sample;
    use crate::network::prepare;

    fn spread_network() -> Network {
        let (mut network, _) = prepare(&sample(), "hub/core", &LayoutConfig::default()).unwrap();
        for (index, node) in network.nodes.iter_mut().enumerate() {
            node.pos = vec2(index as f32 * 100.0, (index % 2) as f32 * 40.0);
        }
        network
    }

    #[test]
    fn finds_the_nearest_member() {
        let network = spread_network();
        let index = SpatialIndex::all(&network);
        assert_eq!(index.len(), network.nodes.len());
        assert_eq!(index.find(vec2(305.0, 38.0)), Some(3));
        assert_eq!(index.find(vec2(-50.0, 0.0)), Some(0));
    }

    #[test]
    fn subset_maps_back_to_node_indices() {
        let network = spread_network();
        let index = SpatialIndex::build(&network, vec![4, 6, 99]);
        assert_eq!(index.members(), [4, 6]);
        assert_eq!(index.find(vec2(0.0, 0.0)), Some(4));
        assert_eq!(index.find(vec2(590.0, 0.0)), Some(6));
    }

    #[test]
    fn empty_index_finds_nothing() {
        let network = spread_network();
        let index = SpatialIndex::build(&network, Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.find(Vec2::ZERO), None);
    }

    #[test]
    fn stacked_members_resolve_to_the_first_listed() {
        let mut network = spread_network();
        for index in [2, 5, 7] {
            network.nodes[index].pos = vec2(50.0, 50.0);
        }
        let index = SpatialIndex::build(&network, vec![7, 5, 2]);
        assert_eq!(index.find(vec2(51.0, 49.0)), Some(7));
    }

    #[test]
    fn non_finite_positions_and_queries_are_skipped() {
        let mut network = spread_network();
        network.nodes[1].pos = vec2(f32::NAN, 0.0);
        let index = SpatialIndex::build(&network, vec![0, 1]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.find(vec2(100.0, 0.0)), Some(0));
        assert_eq!(index.find(vec2(f32::NAN, 1.0)), None);
    }
}

//! Phased radial layout.
//!
//! Phases run in a fixed order and each one consumes the pins and radii the
//! previous one left behind: owner clouds, contributor clouds, ring
//! placement, the collaboration simulation, the community band, and finally
//! fallback placement with link resolution.

mod collaboration;
mod community;
mod contributor;
mod finalize;
mod forces;
mod owner;
mod quadtree;
mod ring;
mod simulation;

use eframe::egui::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::debug;

pub use collaboration::{ApproxTextMeasure, FontRole, TextMeasure, TextMetrics};
pub use forces::{
    BBoxCollide, Collide, LinkForce, ManyBody, PositionX, PositionY, Radial, RadialClamp,
};
pub use ring::RingGeometry;
pub use simulation::{Body, Force, Simulation, TickContext, jitter_around, ramp};

use crate::error::LayoutError;
use crate::network::{Filters, Network, Node, NodeIndex, NodeKind, RawNetwork, prepare};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Arc length kept free between neighboring contributors on the ring.
    pub contributor_padding: f32,
    /// Shared repos and owners stay within this fraction of the ring radius.
    pub inner_radius_factor: f32,
    pub ring_width_multiplier: f32,
    pub min_ring_radius: f32,
    pub min_radius_per_contributor: f32,
    pub central_radius: f32,
    /// Pointer distance beyond the outer ring at which hit testing gives up.
    pub hit_margin: f32,
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            contributor_padding: 40.0,
            inner_radius_factor: 0.7,
            ring_width_multiplier: 2.3,
            min_ring_radius: 200.0,
            min_radius_per_contributor: 15.0,
            central_radius: 35.0,
            hit_margin: 200.0,
            seed: None,
        }
    }
}

impl LayoutConfig {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Mutable state threaded through every phase.
pub(crate) struct LayoutState<'a> {
    pub(crate) network: Network,
    pub(crate) config: &'a LayoutConfig,
    pub(crate) rng: StdRng,
}

impl LayoutState<'_> {
    fn pin_central(&mut self) {
        let central = self.network.central;
        self.network.nodes[central].pin_at(Vec2::ZERO);
    }

    /// Simulation bodies for `members`, carrying over positions and pins.
    fn bodies(&self, members: &[NodeIndex]) -> Vec<Body> {
        members
            .iter()
            .map(|&index| {
                let node = &self.network.nodes[index];
                Body {
                    pos: node.pos,
                    vel: Vec2::ZERO,
                    pin: node.pin,
                }
            })
            .collect()
    }

    fn write_back(&mut self, members: &[NodeIndex], bodies: &[Body]) {
        for (&index, body) in members.iter().zip(bodies) {
            self.network.nodes[index].pos = body.pos;
        }
    }

    /// Farthest reach of `members` from `center`, counting each member's own extent.
    fn cloud_extent(&self, center: NodeIndex, members: &[NodeIndex]) -> f32 {
        let center_node = &self.network.nodes[center];
        members
            .iter()
            .map(|&index| {
                let node = &self.network.nodes[index];
                (node.pos - center_node.pos).length() + cloud_member_extent(node)
            })
            .fold(center_node.r, f32::max)
    }
}

/// Radius a cloud member occupies: owners bring their own cloud along.
pub(crate) fn cloud_member_extent(node: &Node) -> f32 {
    match node.kind() {
        NodeKind::Owner => node.max_radius.max(node.r),
        NodeKind::Contributor | NodeKind::Repo => node.r,
    }
}

/// Final positions plus the sets later stages need.
#[derive(Clone, Debug)]
pub struct Layout {
    pub network: Network,
    pub ring: RingGeometry,
    /// Nodes positioned by the collaboration simulation; they get labels.
    pub central_set: Vec<NodeIndex>,
    /// Community contributors placed in the outer band.
    pub remaining: Vec<NodeIndex>,
}

/// Runs every phase over a prepared network.
pub fn run(
    network: Network,
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
) -> Result<Layout, LayoutError> {
    let mut state = LayoutState {
        network,
        config,
        rng: config.rng(),
    };

    state.pin_central();
    owner::run(&mut state);
    contributor::run(&mut state);
    state.pin_central();
    let ring = ring::run(&mut state)?;
    let central_set = collaboration::run(&mut state, &ring, measure);
    let remaining = community::run(&mut state, &ring);
    finalize::run(&mut state);

    debug!(
        nodes = state.network.nodes.len(),
        links = state.network.links.len(),
        radius = ring.radius,
        central = central_set.len(),
        remaining = remaining.len(),
        "layout finished"
    );

    Ok(Layout {
        network: state.network,
        ring,
        central_set,
        remaining,
    })
}

/// Filters, prepares and lays out the raw network from scratch.
pub fn rebuild(
    raw: &RawNetwork,
    filters: &Filters,
    central_id: &str,
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
) -> Result<Layout, LayoutError> {
    let visible = filters.apply(raw, Some(central_id));
    let (network, _report) = prepare(&visible, central_id, config)?;
    run(network, config, measure)
}

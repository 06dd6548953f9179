use std::collections::HashSet;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::Rng;
use tracing::debug;

use super::LayoutState;
use super::forces::{Collide, LinkForce, ManyBody, PositionX, PositionY, Radial};
use super::ring::{RingGeometry, translate_and_pin};
use super::simulation::{Body, Simulation, ramp};
use crate::network::{NodeIndex, NodeKind};

const TICKS: usize = 200;
const BAND_FACTOR: f32 = 1.45;
const SPREAD_FACTOR: f32 = 0.3;
const LINK_DISTANCE_FACTOR: f32 = 0.3;
const LINK_STRENGTH: f32 = 0.05;
const RADIAL_STRENGTH: f32 = 0.4;
const CENTERING: f32 = 0.01;
const CHARGE: f32 = -20.0;
const COLLIDE_START: f32 = 0.6;
const COLLIDE_MAX: f32 = 0.8;
const ANCHOR_DEFAULT_RADIUS: f32 = 10.0;
const ANCHOR_PADDING: f32 = 4.0;
const JITTER_MIN: f32 = 10.0;
const JITTER_RANGE: f32 = 20.0;

/// Scatters community contributors into a band outside the ring, each drawn
/// toward the repos and owners it commits to. Returns the contributors moved.
pub(super) fn run(state: &mut LayoutState<'_>, ring: &RingGeometry) -> Vec<NodeIndex> {
    let community = state
        .network
        .indices_of_kind(NodeKind::Contributor)
        .into_iter()
        .filter(|&index| state.network.nodes[index].is_community())
        .collect::<Vec<_>>();
    if community.is_empty() {
        debug!("no community contributors; skipping band simulation");
        return community;
    }

    let band = ring.radius * BAND_FACTOR;
    let spread = ring.radius * SPREAD_FACTOR;

    let mut anchors = Vec::new();
    let mut edges = Vec::new();
    for (slot, &contributor) in community.iter().enumerate() {
        let node = &state.network.nodes[contributor];
        let own: HashSet<NodeIndex> = node.cloud.iter().copied().collect();
        for (source, target) in state.network.resolved_links() {
            if source != contributor || own.contains(&target) || community.contains(&target) {
                continue;
            }
            let anchor = match anchors.iter().position(|&anchor| anchor == target) {
                Some(position) => position,
                None => {
                    anchors.push(target);
                    anchors.len() - 1
                }
            };
            edges.push((slot, community.len() + anchor));
        }
    }

    let previous = community
        .iter()
        .map(|&index| state.network.nodes[index].pos)
        .collect::<Vec<_>>();

    let count = community.len() as f32;
    let mut bodies = Vec::with_capacity(community.len() + anchors.len() + 1);
    for slot in 0..community.len() {
        let angle = (slot as f32 + state.rng.gen_range(0.0..1.0_f32)) / count * TAU;
        let radius = band + (state.rng.gen_range(0.0..1.0_f32) - 0.5) * spread;
        bodies.push(Body::free(radius * vec2(angle.cos(), angle.sin())));
    }
    for &anchor in &anchors {
        bodies.push(Body::pinned(state.network.nodes[anchor].pos));
    }
    // Keeps band members from drifting into the ring.
    bodies.push(Body::pinned(Vec2::ZERO));

    let mut radii = community
        .iter()
        .map(|&index| state.network.nodes[index].r)
        .chain(anchors.iter().map(|&index| {
            let r = state.network.nodes[index].r;
            (if r > 0.0 { r } else { ANCHOR_DEFAULT_RADIUS }) + ANCHOR_PADDING
        }))
        .collect::<Vec<_>>();
    radii.push(ring.radius);

    let link_count = edges.len();
    let mut links = LinkForce::new(edges, bodies.len())
        .with_distance(band * LINK_DISTANCE_FACTOR)
        .with_strength(LINK_STRENGTH);
    let mut radial = Radial::new(band, Vec2::ZERO, RADIAL_STRENGTH);
    let mut x = PositionX::new(0.0, CENTERING);
    let mut y = PositionY::new(0.0, CENTERING);
    let mut collide = Collide::new(radii).with_strength(COLLIDE_START);
    let mut charge = ManyBody::new(CHARGE);

    let mut simulation = Simulation::new(bodies);
    for tick in 0..TICKS {
        for (slot, &index) in community.iter().enumerate() {
            let jitter = state.rng.gen_range(0.0..JITTER_RANGE);
            collide.radii[slot] = state.network.nodes[index].r + jitter + JITTER_MIN;
        }
        simulation.step(
            &mut [&mut links, &mut radial, &mut x, &mut y, &mut collide, &mut charge],
            &mut state.rng,
        );
        collide.set_strength(ramp(tick, TICKS, COLLIDE_MAX));
    }

    for (slot, &contributor) in community.iter().enumerate() {
        let position = simulation.bodies[slot].pos;
        let offset = position - previous[slot];

        let node = &mut state.network.nodes[contributor];
        node.pin_at(position);
        node.node_central = true;
        node.contributor_angle = Some(position.y.atan2(position.x));

        let cloud = node.cloud.clone();
        translate_and_pin(state, &cloud, offset);
        for member in cloud {
            let satellite = &state.network.nodes[member];
            if satellite.kind() == NodeKind::Owner {
                let owned = satellite.cloud.clone();
                translate_and_pin(state, &owned, offset);
            }
        }
    }

    debug!(
        community = community.len(),
        anchors = anchors.len(),
        links = link_count,
        band,
        "community band settled"
    );
    community
}

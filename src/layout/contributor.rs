use eframe::egui::Vec2;
use tracing::debug;

use super::forces::{Collide, LinkForce, ManyBody, PositionX, PositionY};
use super::simulation::{Simulation, jitter_around, ramp};
use super::{LayoutState, cloud_member_extent};
use crate::network::{Network, NodeIndex, NodeKind};

const TICKS: usize = 200;
const CHARGE: f32 = -10.0;
const COLLIDE_START: f32 = 0.1;
const COLLIDE_MAX: f32 = 0.8;
const CENTERING: f32 = 0.1;

/// The contributor first, then its single-link repos and the owners only
/// it commits to.
pub(super) fn cloud_members(network: &Network, contributor: NodeIndex) -> Vec<NodeIndex> {
    let mut members = vec![contributor];
    for (source, target) in network.resolved_links() {
        if source != contributor || target == network.central || members.contains(&target) {
            continue;
        }
        let node = &network.nodes[target];
        let satellite = match node.kind() {
            NodeKind::Repo => node.degree == 1,
            NodeKind::Owner => node.degree == 1 || node.is_single_contributor_owner(),
            NodeKind::Contributor => false,
        };
        if satellite {
            members.push(target);
        }
    }
    members
}

/// Clusters each contributor's private repos and owners around it. The
/// contributor stays pinned at the origin until ring placement.
pub(super) fn run(state: &mut LayoutState<'_>) {
    let contributors = state.network.indices_of_kind(NodeKind::Contributor);
    for &contributor in &contributors {
        state.network.nodes[contributor].pin_at(Vec2::ZERO);
    }

    let mut satellites = 0;
    for &contributor in &contributors {
        let members = cloud_members(&state.network, contributor);
        for &member in &members[1..] {
            let seeded = jitter_around(Vec2::ZERO, &mut state.rng);
            state.network.nodes[member].pos = seeded;
        }

        let radii = members
            .iter()
            .map(|&member| cloud_member_extent(&state.network.nodes[member]) + 2.0)
            .collect::<Vec<_>>();
        let spokes = (1..members.len()).map(|member| (0, member)).collect();

        let mut links = LinkForce::new(spokes, members.len()).with_strength(0.0);
        let mut charge = ManyBody::new(CHARGE);
        let mut collide = Collide::new(radii).with_strength(COLLIDE_START);
        let mut x = PositionX::new(0.0, CENTERING);
        let mut y = PositionY::new(0.0, CENTERING);

        let mut simulation = Simulation::new(state.bodies(&members));
        for tick in 0..TICKS {
            simulation.step(
                &mut [&mut links, &mut charge, &mut collide, &mut x, &mut y],
                &mut state.rng,
            );
            collide.set_strength(ramp(tick, TICKS, COLLIDE_MAX));
        }
        state.write_back(&members, &simulation.bodies);

        let cloud = members[1..].to_vec();
        satellites += cloud.len();
        let max_radius = state.cloud_extent(contributor, &cloud);
        let node = &mut state.network.nodes[contributor];
        node.max_radius = max_radius;
        node.cloud = cloud;
    }

    debug!(
        contributors = contributors.len(),
        satellites, "contributor clouds settled"
    );
}

use eframe::egui::Vec2;
use tracing::debug;

use super::LayoutState;
use super::forces::{Collide, LinkForce, PositionX, PositionY};
use super::simulation::{Simulation, jitter_around, ramp};
use crate::network::{Network, NodeIndex, NodeKind};

const TICKS: usize = 200;
const COLLIDE_MAX: f32 = 0.8;
const CENTERING: f32 = 0.1;

/// Members of `owner`'s cloud: the owner first, then every repo it links to
/// that has no other link.
pub(super) fn cloud_members(network: &Network, owner: NodeIndex) -> Vec<NodeIndex> {
    let mut members = vec![owner];
    for (source, target) in network.resolved_links() {
        if source != owner || target == network.central || members.contains(&target) {
            continue;
        }
        let node = &network.nodes[target];
        if node.degree == 1 && node.kind() == NodeKind::Repo {
            members.push(target);
        }
    }
    members
}

fn collide_radius(network: &Network, owner: NodeIndex, member: NodeIndex) -> f32 {
    let node = &network.nodes[member];
    if member != owner {
        return node.r + (node.r * 0.2).max(2.0);
    }
    if node.is_single_contributor_owner() {
        node.r + 2.0
    } else {
        node.r + node.r.clamp(10.0, 14.0)
    }
}

/// Clusters each owner's single-link repos around it. Cloud positions stay
/// relative to the owner, who is pinned at the origin while this runs.
pub(super) fn run(state: &mut LayoutState<'_>) {
    let owners = state.network.indices_of_kind(NodeKind::Owner);
    for &owner in &owners {
        state.network.nodes[owner].pin_at(Vec2::ZERO);
    }

    for &owner in &owners {
        let members = cloud_members(&state.network, owner);
        for &member in &members {
            let seeded = jitter_around(Vec2::ZERO, &mut state.rng);
            state.network.nodes[member].pos = seeded;
        }
        state.network.nodes[owner].pos = Vec2::ZERO;

        let radii = members
            .iter()
            .map(|&member| collide_radius(&state.network, owner, member))
            .collect::<Vec<_>>();
        let spokes = (1..members.len()).map(|member| (0, member)).collect();

        let mut links = LinkForce::new(spokes, members.len()).with_strength(0.0);
        let mut collide = Collide::new(radii).with_strength(0.0);
        let mut x = PositionX::new(0.0, CENTERING);
        let mut y = PositionY::new(0.0, CENTERING);

        let mut simulation = Simulation::new(state.bodies(&members));
        for tick in 0..TICKS {
            simulation.step(
                &mut [&mut links, &mut collide, &mut x, &mut y],
                &mut state.rng,
            );
            collide.set_strength(ramp(tick, TICKS, COLLIDE_MAX));
        }
        state.write_back(&members, &simulation.bodies);

        let cloud = members[1..].to_vec();
        let max_radius = state.cloud_extent(owner, &cloud);
        let node = &mut state.network.nodes[owner];
        node.max_radius = max_radius;
        node.cloud = cloud;
        node.unpin();
    }

    debug!(owners = owners.len(), "owner clouds settled");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ApproxTextMeasure, LayoutConfig};
    use crate::network::fixtures::{contributor, link, repo};
    use crate::network::{Filters, RawNetwork, Tier, prepare};

    fn prepared(raw: &RawNetwork, config: &LayoutConfig) -> Network {
        let (network, _) = prepare(raw, "hub/core", config).unwrap();
        network
    }

    fn three_repo_owner() -> RawNetwork {
        RawNetwork {
            central: Some("hub/core".to_owned()),
            contributors: vec![contributor("ada", Tier::Core), contributor("bob", Tier::Core)],
            repos: vec![
                repo("hub/core", 100),
                repo("acme/a", 5),
                repo("acme/b", 50),
                repo("acme/c", 500),
            ],
            links: vec![
                link("ada", "hub/core", 3),
                link("bob", "hub/core", 3),
                link("ada", "acme/a", 1),
                link("bob", "acme/b", 1),
                link("ada", "acme/c", 1),
            ],
        }
    }

    #[test]
    fn owner_with_three_single_link_repos_gets_a_cloud_of_three() {
        let config = LayoutConfig {
            seed: Some(1),
            ..LayoutConfig::default()
        };
        let mut state = LayoutState {
            network: prepared(&three_repo_owner(), &config),
            config: &config,
            rng: config.rng(),
        };
        run(&mut state);

        let owner = state.network.index_of("acme").unwrap();
        let node = &state.network.nodes[owner];
        assert_eq!(node.cloud.len(), 3);
        assert!(node.max_radius >= node.r);
        assert!(node.pin.is_none());
        for &member in &node.cloud {
            let repo = &state.network.nodes[member];
            assert!((repo.pos - node.pos).length() + repo.r <= node.max_radius + 1e-3);
        }
    }

    #[test]
    fn shared_repo_commits_still_route_through_owner() {
        let mut raw = three_repo_owner();
        raw.links.push(link("bob", "acme/a", 1));
        let network = prepared(&raw, &LayoutConfig::default());
        let owner = network.index_of("acme").unwrap();

        // Both commits to acme/a route through the owner; the repo keeps degree one.
        let members = cloud_members(&network, owner);
        assert_eq!(members.len(), 4);
        assert_eq!(members[0], owner);
    }

    #[test]
    fn clouds_survive_the_full_pipeline() {
        let config = LayoutConfig {
            seed: Some(5),
            ..LayoutConfig::default()
        };
        let layout = crate::layout::rebuild(
            &three_repo_owner(),
            &Filters::default(),
            "hub/core",
            &config,
            &ApproxTextMeasure,
        )
        .unwrap();
        let owner = layout.network.index_of("acme").unwrap();
        let node = &layout.network.nodes[owner];
        for &member in &node.cloud {
            let repo = &layout.network.nodes[member];
            assert!((repo.pos - node.pos).length() <= node.max_radius + 1e-2);
        }
    }
}

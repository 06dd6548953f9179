use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::Rng;
use tracing::{debug, warn};

use super::LayoutState;
use crate::network::{Link, LinkEndpoint, Network, NodeKind};

const CONTRIBUTOR_FALLBACK_RADIUS: f32 = 250.0;
const REPO_FALLBACK_RADIUS: f32 = 150.0;
const REPO_FALLBACK_SPREAD: f32 = 50.0;
const OWNER_FALLBACK_RADIUS: f32 = 50.0;

fn default_node_radius(kind: NodeKind) -> f32 {
    match kind {
        NodeKind::Contributor => 6.0,
        NodeKind::Repo => 8.0,
        NodeKind::Owner => 15.0,
    }
}

pub(super) fn run(state: &mut LayoutState<'_>) {
    place_leftovers(state);
    resolve_links(&mut state.network);
}

/// Puts every node no phase reached on a ring by kind.
fn place_leftovers(state: &mut LayoutState<'_>) {
    let central = state.network.central;
    for node in &mut state.network.nodes {
        if !node.pos.x.is_finite() || !node.pos.y.is_finite() {
            warn!(id = %node.id, "non-finite position reset");
            node.pos = Vec2::ZERO;
            node.pin = None;
        }
    }

    let contributor_count = state.network.count_of_kind(NodeKind::Contributor).max(1);
    let repo_count = state.network.count_of_kind(NodeKind::Repo).max(1);
    let owner_count = state.network.count_of_kind(NodeKind::Owner).max(1);

    let mut placed = [0usize; 3];
    for index in 0..state.network.nodes.len() {
        if index == central || state.network.nodes[index].pos != Vec2::ZERO {
            continue;
        }
        let kind = state.network.nodes[index].kind();
        let (total, radius) = match kind {
            NodeKind::Contributor => (contributor_count, CONTRIBUTOR_FALLBACK_RADIUS),
            NodeKind::Repo => (
                repo_count,
                REPO_FALLBACK_RADIUS + state.rng.gen_range(0.0..REPO_FALLBACK_SPREAD),
            ),
            NodeKind::Owner => (owner_count, OWNER_FALLBACK_RADIUS),
        };
        let slot = placed[kind as usize];
        placed[kind as usize] += 1;

        let angle = slot as f32 / total as f32 * TAU;
        let node = &mut state.network.nodes[index];
        node.pos = radius * vec2(angle.cos(), angle.sin());
        if node.r <= 0.0 {
            node.r = default_node_radius(kind);
        }
    }

    let total: usize = placed.iter().sum();
    if total > 0 {
        warn!(count = total, "nodes needed fallback placement");
    }
}

/// Turns every endpoint into a node reference, dropping links that do not resolve.
pub(crate) fn resolve_links(network: &mut Network) -> usize {
    let links = std::mem::take(&mut network.links);
    let before = links.len();

    let mut resolved = Vec::with_capacity(before);
    for link in links {
        let source = network.endpoint(&link.source);
        let target = network.endpoint(&link.target);
        match (source, target) {
            (Some(source), Some(target)) => resolved.push(Link {
                source: LinkEndpoint::Ref(source),
                target: LinkEndpoint::Ref(target),
                ..link
            }),
            _ => warn!(
                source = ?link.source,
                target = ?link.target,
                source_found = source.is_some(),
                target_found = target.is_some(),
                "dropping unresolvable link"
            ),
        }
    }

    let dropped = before - resolved.len();
    network.links = resolved;
    debug!(links = network.links.len(), dropped, "links resolved");
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use crate::network::fixtures::sample;
    use crate::network::prepare;

    #[test]
    fn unresolvable_links_are_dropped_by_exact_count() {
        let (mut network, _) = prepare(&sample(), "hub/core", &LayoutConfig::default()).unwrap();
        let valid = network.links.len();
        let template = network.links[0].clone();
        network.links.push(Link {
            target: LinkEndpoint::Id("ghost/repo".to_owned()),
            ..template.clone()
        });
        network.links.push(Link {
            source: LinkEndpoint::Ref(999),
            ..template
        });

        assert_eq!(resolve_links(&mut network), 2);
        assert_eq!(network.links.len(), valid);
        assert!(network
            .links
            .iter()
            .all(|link| matches!((&link.source, &link.target), (LinkEndpoint::Ref(_), LinkEndpoint::Ref(_)))));
    }

    #[test]
    fn leftovers_get_a_ring_by_kind() {
        let config = LayoutConfig {
            seed: Some(2),
            ..LayoutConfig::default()
        };
        let (network, _) = prepare(&sample(), "hub/core", &config).unwrap();
        let mut state = LayoutState {
            network,
            config: &config,
            rng: config.rng(),
        };
        let ada = state.network.index_of("ada").unwrap();
        let tools = state.network.index_of("tools").unwrap();
        let notes = state.network.index_of("ada/notes").unwrap();
        state.network.nodes[notes].pos = vec2(f32::NAN, 1.0);

        place_leftovers(&mut state);

        let central = state.network.central_node();
        assert_eq!(central.pos, Vec2::ZERO);
        assert!((state.network.nodes[ada].pos.length() - 250.0).abs() < 1e-3);
        assert!((state.network.nodes[tools].pos.length() - 50.0).abs() < 1e-3);
        let repo_distance = state.network.nodes[notes].pos.length();
        assert!((150.0..=200.0).contains(&repo_distance));
    }
}

use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use super::LayoutState;
use super::forces::{BBoxCollide, LinkForce, ManyBody, RadialClamp};
use super::ring::{RingGeometry, translate_and_pin};
use super::simulation::{Simulation, ramp};
use crate::network::{BBox, Network, Node, NodeData, NodeIndex, NodeKind, Tier};

const TICKS: usize = 300;
const COLLIDE_MAX: f32 = 0.7;
const LINK_DISTANCE_FACTOR: f32 = 5.0;
const LABEL_PADDING: f32 = 14.0;
const LABEL_WIDTH_FACTOR: f32 = 1.25;

const PHYLLOTAXIS_RADIUS: f32 = 10.0;

/// Which label font a measurement is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    Owner,
    Repo,
    Contributor,
}

impl FontRole {
    pub fn size(self) -> f32 {
        match self {
            Self::Owner => 12.0,
            Self::Repo => 10.0,
            Self::Contributor => 11.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl TextMetrics {
    pub fn height(self) -> f32 {
        self.ascent + self.descent
    }
}

/// Label measurement, supplied by whoever renders the labels.
pub trait TextMeasure {
    fn measure(&self, text: &str, role: FontRole) -> TextMetrics;
}

/// Character-count estimate for when no font system is at hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxTextMeasure;

impl TextMeasure for ApproxTextMeasure {
    fn measure(&self, text: &str, role: FontRole) -> TextMetrics {
        let size = role.size();
        TextMetrics {
            width: text.chars().count() as f32 * size * 0.55,
            ascent: size * 0.92,
            descent: size * 0.24,
        }
    }
}

/// Whether the node is positioned by the collaboration simulation.
pub(super) fn in_central_set(node: &Node) -> bool {
    match &node.data {
        NodeData::Contributor(record) => record.tier != Tier::Community,
        NodeData::Owner(record) => !record.single_contributor,
        NodeData::Repo(record) => !record.multi_repo_owner && node.degree > 1,
    }
}

/// Label-aware collision box. More room is kept above the node, where the
/// label goes, than below it.
pub(super) fn label_box(node: &Node, measure: &dyn TextMeasure) -> BBox {
    let role = match &node.data {
        NodeData::Contributor(_) => return BBox::square(node.max_radius),
        NodeData::Owner(_) => FontRole::Owner,
        NodeData::Repo(_) => FontRole::Repo,
    };

    let mut text = measure.measure(&node.label, role);
    if let NodeData::Repo(record) = &node.data {
        let owner = measure.measure(&record.owner, role);
        if owner.width > text.width {
            text = owner;
        }
    }

    let mut text_height = text.height();
    if role == FontRole::Repo {
        text_height *= 2.0;
    }

    let body = match role {
        FontRole::Owner => node.max_radius.max(node.r),
        FontRole::Repo | FontRole::Contributor => node.r,
    };
    let top = body.max(node.r + text_height);
    let width = (body * 2.0).max(text.width * LABEL_WIDTH_FACTOR) + LABEL_PADDING;

    BBox {
        min: vec2(-width / 2.0, -top),
        max: vec2(width / 2.0, body),
    }
}

/// Spiral start position for a node that has none yet.
fn phyllotaxis(slot: usize) -> Vec2 {
    let angle = PI * (3.0 - 5.0_f32.sqrt());
    let radius = PHYLLOTAXIS_RADIUS * (0.5 + slot as f32).sqrt();
    let theta = slot as f32 * angle;
    vec2(radius * theta.cos(), radius * theta.sin())
}

fn links_within(network: &Network, members: &[NodeIndex]) -> Vec<(usize, usize)> {
    let slot_of = |index: NodeIndex| members.iter().position(|&member| member == index);
    network
        .resolved_links()
        .into_iter()
        .filter_map(|(source, target)| Some((slot_of(source)?, slot_of(target)?)))
        .collect()
}

/// Positions the nodes shared between contributors inside the ring, then
/// pins them and moves every owner cloud onto its owner.
pub(super) fn run(
    state: &mut LayoutState<'_>,
    ring: &RingGeometry,
    measure: &dyn TextMeasure,
) -> Vec<NodeIndex> {
    let members = state
        .network
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| in_central_set(node))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    for (slot, &index) in members.iter().enumerate() {
        let node = &mut state.network.nodes[index];
        node.node_central = true;
        node.bbox = Some(label_box(node, measure));
        if node.pin.is_none() && (node.pos == Vec2::ZERO || !node.pos.is_finite()) {
            node.pos = phyllotaxis(slot);
        }
    }

    let links = links_within(&state.network, &members);
    let network = &state.network;
    let mut link_force = LinkForce::new(links, members.len()).with_distance_by(|_, target| {
        let degree = network.nodes[members[target]].degree as f64;
        network.scales.link_distance.apply(degree) * LINK_DISTANCE_FACTOR
    });

    let boxes = members
        .iter()
        .map(|&index| {
            state.network.nodes[index]
                .bbox
                .unwrap_or_else(|| BBox::square(0.0))
        })
        .collect();
    let mut collide = BBoxCollide::new(boxes).with_iterations(1);
    collide.set_strength(0.0);
    let mut charge = ManyBody::default();

    let bound = ring.radius * state.config.inner_radius_factor;
    let clamped = members
        .iter()
        .map(|&index| {
            matches!(
                state.network.nodes[index].kind(),
                NodeKind::Repo | NodeKind::Owner
            )
        })
        .collect();
    let clamp = RadialClamp::new(clamped, bound);

    let mut simulation = Simulation::new(state.bodies(&members));
    for tick in 0..TICKS {
        simulation.step(
            &mut [&mut link_force, &mut collide, &mut charge],
            &mut state.rng,
        );
        clamp.constrain(&mut simulation.bodies);
        collide.set_strength(ramp(tick, TICKS, COLLIDE_MAX));
    }
    state.write_back(&members, &simulation.bodies);

    for &index in &members {
        state.network.nodes[index].pin_in_place();
    }

    for owner in state.network.indices_of_kind(NodeKind::Owner) {
        let node = &state.network.nodes[owner];
        let (cloud, offset) = (node.cloud.clone(), node.pos);
        translate_and_pin(state, &cloud, offset);
    }

    debug!(
        members = members.len(),
        links = link_force.len(),
        bound,
        "collaboration simulation settled"
    );
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutConfig, rebuild};
    use crate::network::fixtures::sample;
    use crate::network::{Filters, prepare};

    #[test]
    fn selects_the_shared_nodes() {
        let (network, _) = prepare(&sample(), "hub/core", &LayoutConfig::default()).unwrap();
        let selected = network
            .nodes
            .iter()
            .filter(|node| in_central_set(node))
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        // tools has one contributor, ada/notes and the tools repos a single link.
        assert_eq!(selected, ["ada", "grace", "hub/core", "misc/shared"]);
    }

    #[test]
    fn label_box_reserves_space_above() {
        let (network, _) = prepare(&sample(), "hub/core", &LayoutConfig::default()).unwrap();
        let shared = &network.nodes[network.index_of("misc/shared").unwrap()];
        let bbox = label_box(shared, &ApproxTextMeasure);

        assert_eq!(bbox.max.y, shared.r);
        assert!(-bbox.min.y > bbox.max.y);
        assert!((bbox.min.x + bbox.max.x).abs() < 1e-6);
        // "shared" is the wider of the two lines.
        let text = ApproxTextMeasure.measure("shared", FontRole::Repo);
        assert!((bbox.width() - (text.width * 1.25).max(shared.r * 2.0) - 14.0).abs() < 1e-4);
        assert!((-bbox.min.y - (shared.r + text.height() * 2.0)).abs() < 1e-4);
    }

    #[test]
    fn contributor_box_is_its_cloud() {
        let (mut network, _) = prepare(&sample(), "hub/core", &LayoutConfig::default()).unwrap();
        let ada = network.index_of("ada").unwrap();
        network.nodes[ada].max_radius = 42.0;
        assert_eq!(label_box(&network.nodes[ada], &ApproxTextMeasure), BBox::square(42.0));
    }

    #[test]
    fn community_contributors_are_left_out() {
        let (network, _) = prepare(&sample(), "hub/core", &LayoutConfig::default()).unwrap();
        let linus = &network.nodes[network.index_of("linus").unwrap()];
        assert_eq!(linus.tier(), Some(Tier::Community));
        assert!(!in_central_set(linus));
    }

    #[test]
    fn shared_nodes_are_pinned_inside_the_ring() {
        let config = LayoutConfig {
            seed: Some(21),
            ..LayoutConfig::default()
        };
        let layout =
            rebuild(&sample(), &Filters::default(), "hub/core", &config, &ApproxTextMeasure)
                .unwrap();
        let bound = layout.ring.radius * config.inner_radius_factor;
        for &index in &layout.central_set {
            let node = &layout.network.nodes[index];
            assert!(node.node_central);
            assert_eq!(node.pin, Some(node.pos));
            if matches!(node.kind(), NodeKind::Repo | NodeKind::Owner) {
                assert!(node.pos.length() <= bound + 1e-3, "{}", node.id);
            }
        }
    }
}

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::layout::{LayoutConfig, rebuild};
    use crate::network::fixtures::{contributor, link, repo};
    use crate::network::{Filters, RawNetwork};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_shared_repos_respect_the_inner_boundary(
            shared in 1usize..6,
            contributors in 2usize..6,
            factor in 0.3f32..0.9,
            seed in any::<u64>(),
        ) {
            let mut raw = RawNetwork {
                central: Some("hub/core".to_owned()),
                contributors: Vec::new(),
                repos: vec![repo("hub/core", 100)],
                links: Vec::new(),
            };
            for repo_index in 0..shared {
                raw.repos.push(repo(&format!("org{repo_index}/lib"), 10 + repo_index as u64));
            }
            for person in 0..contributors {
                let name = format!("dev{person}");
                raw.contributors.push(contributor(&name, Tier::Core));
                raw.links.push(link(&name, "hub/core", 5));
                for repo_index in 0..shared {
                    raw.links.push(link(&name, &format!("org{repo_index}/lib"), 1 + person as u64));
                }
            }

            let config = LayoutConfig {
                inner_radius_factor: factor,
                seed: Some(seed),
                ..LayoutConfig::default()
            };
            let layout = rebuild(&raw, &Filters::default(), "hub/core", &config, &ApproxTextMeasure)
                .unwrap();
            let bound = layout.ring.radius * factor;
            for &index in &layout.central_set {
                let node = &layout.network.nodes[index];
                if matches!(node.kind(), NodeKind::Repo | NodeKind::Owner) {
                    prop_assert!(node.pos.length() <= bound + 1e-3);
                }
            }
        }
    }
}

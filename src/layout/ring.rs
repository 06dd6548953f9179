use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};
use tracing::{debug, warn};

use super::LayoutState;
use crate::error::LayoutError;
use crate::network::NodeKind;

const FALLBACK_MAX_RADIUS: f32 = 20.0;

/// The contributor ring as placed.
#[derive(Clone, Debug, PartialEq)]
pub struct RingGeometry {
    pub radius: f32,
    /// Thickness of the band drawn around the ring.
    pub width: f32,
    /// Angular slice each contributor took, in placement order.
    pub slices: Vec<f32>,
    pub even_spacing: bool,
}

impl RingGeometry {
    pub fn outer_radius(&self) -> f32 {
        self.radius + self.width
    }
}

/// Places every contributor on a circle around the pinned central node and
/// carries its cloud along.
pub(super) fn run(state: &mut LayoutState<'_>) -> Result<RingGeometry, LayoutError> {
    let config = state.config;
    let center = match state.network.central_node().pin {
        Some(pin) if pin.x.is_finite() && pin.y.is_finite() => pin,
        Some(pin) => return Err(LayoutError::CentralNotPinned { fx: pin.x, fy: pin.y }),
        None => {
            return Err(LayoutError::CentralNotPinned {
                fx: f32::NAN,
                fy: f32::NAN,
            });
        }
    };

    let contributors = state.network.indices_of_kind(NodeKind::Contributor);
    if contributors.is_empty() {
        warn!(
            radius = config.min_ring_radius,
            "no contributors to place; using minimum ring radius"
        );
    }

    for &index in &contributors {
        let node = &mut state.network.nodes[index];
        if !node.max_radius.is_finite() || node.max_radius <= 0.0 {
            node.max_radius = if node.r > 0.0 { node.r } else { FALLBACK_MAX_RADIUS };
        }
    }

    let count = contributors.len();
    let arcs = contributors
        .iter()
        .map(|&index| state.network.nodes[index].max_radius * 2.0 + config.contributor_padding)
        .collect::<Vec<_>>();
    let circumference: f32 = arcs.iter().sum();

    let floor = config
        .min_ring_radius
        .max(count as f32 * config.min_radius_per_contributor);
    let mut radius = circumference / TAU;
    let even_spacing = !radius.is_finite() || radius < floor;
    if even_spacing {
        if count > 0 {
            warn!(
                computed = radius,
                radius = floor,
                count,
                "ring radius below floor; spacing contributors evenly"
            );
        }
        radius = floor;
    }

    let slices = if even_spacing {
        vec![TAU / count.max(1) as f32; count]
    } else {
        arcs.iter().map(|arc| arc / radius).collect()
    };

    // Slice 0 is centered on the top of the circle.
    let first_half = slices.first().copied().unwrap_or(0.0) / 2.0;
    let mut start = 0.0;
    for (&index, &slice) in contributors.iter().zip(&slices) {
        let angle = start + slice / 2.0 - first_half - FRAC_PI_2;
        start += slice;

        let previous = state.network.nodes[index].pos;
        let position = center + radius * vec2(angle.cos(), angle.sin());
        let node = &mut state.network.nodes[index];
        node.pin_at(position);
        node.contributor_angle = Some(angle);

        let cloud = node.cloud.clone();
        translate_and_pin(state, &cloud, position - previous);
    }

    let width = ((radius * config.ring_width_multiplier) / 2.0 - radius) * 2.0;
    debug!(count, radius, width, even_spacing, "contributors placed on ring");

    Ok(RingGeometry {
        radius,
        width,
        slices,
        even_spacing,
    })
}

/// Moves cloud members by `offset` and pins them there.
pub(super) fn translate_and_pin(state: &mut LayoutState<'_>, members: &[usize], offset: Vec2) {
    for &member in members {
        let node = &mut state.network.nodes[member];
        let position = node.pos + offset;
        node.pin_at(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use crate::layout::{contributor, owner};
    use crate::network::fixtures::sample;
    use crate::network::{Network, prepare};

    fn placed(network: Network, config: &LayoutConfig) -> (Network, RingGeometry) {
        let mut state = LayoutState {
            network,
            config,
            rng: config.rng(),
        };
        state.pin_central();
        owner::run(&mut state);
        contributor::run(&mut state);
        state.pin_central();
        let ring = run(&mut state).unwrap();
        (state.network, ring)
    }

    #[test]
    fn unpinned_central_is_rejected() {
        let config = LayoutConfig::default();
        let (network, _) = prepare(&sample(), "hub/core", &config).unwrap();
        let mut state = LayoutState {
            network,
            config: &config,
            rng: config.rng(),
        };
        assert!(matches!(
            run(&mut state),
            Err(LayoutError::CentralNotPinned { .. })
        ));

        let central = state.network.central;
        state.network.nodes[central].pin = Some(vec2(f32::INFINITY, 0.0));
        assert!(matches!(
            run(&mut state),
            Err(LayoutError::CentralNotPinned { fx, .. }) if fx.is_infinite()
        ));
    }

    #[test]
    fn small_networks_use_the_floor_and_even_spacing() {
        let config = LayoutConfig {
            seed: Some(8),
            ..LayoutConfig::default()
        };
        let (network, _) = prepare(&sample(), "hub/core", &config).unwrap();
        let (network, ring) = placed(network, &config);

        assert!(ring.even_spacing);
        assert_eq!(ring.radius, 200.0);
        assert!((ring.width - 60.0).abs() < 1e-3);
        assert!((ring.outer_radius() - 260.0).abs() < 1e-3);
        for contributor in network.indices_of_kind(NodeKind::Contributor) {
            let node = &network.nodes[contributor];
            assert!((node.pos.length() - 200.0).abs() < 1e-2);
            assert_eq!(node.pin, Some(node.pos));
        }
    }

    #[test]
    fn clouds_travel_with_their_contributor() {
        let config = LayoutConfig {
            seed: Some(8),
            ..LayoutConfig::default()
        };
        let (network, _) = prepare(&sample(), "hub/core", &config).unwrap();
        let (network, _) = placed(network, &config);

        let ada = &network.nodes[network.index_of("ada").unwrap()];
        let notes = &network.nodes[network.index_of("ada/notes").unwrap()];
        assert!((notes.pos - ada.pos).length() <= ada.max_radius + 1e-2);
        assert_eq!(notes.pin, Some(notes.pos));
    }

    #[test]
    fn wide_clouds_grow_the_ring() {
        let config = LayoutConfig {
            seed: Some(8),
            contributor_padding: 400.0,
            ..LayoutConfig::default()
        };
        let (network, _) = prepare(&sample(), "hub/core", &config).unwrap();
        let (network, ring) = placed(network, &config);

        assert!(!ring.even_spacing);
        let expected = network
            .indices_of_kind(NodeKind::Contributor)
            .iter()
            .map(|&index| network.nodes[index].max_radius * 2.0 + 400.0)
            .sum::<f32>()
            / TAU;
        assert!((ring.radius - expected).abs() < 1e-2);
    }

    #[test]
    fn empty_ring_falls_back_to_the_floor() {
        let config = LayoutConfig::default();
        let (mut network, _) = prepare(&sample(), "hub/core", &config).unwrap();
        let contributors = network.indices_of_kind(NodeKind::Contributor);
        network.nodes.retain(|node| node.kind() != NodeKind::Contributor);
        network.central -= contributors.len();
        let network = Network::new(network.nodes, Vec::new(), network.central, network.scales);

        let mut state = LayoutState {
            network,
            config: &config,
            rng: config.rng(),
        };
        state.pin_central();
        let ring = run(&mut state).unwrap();
        assert_eq!(ring.radius, 200.0);
        assert!(ring.slices.is_empty());
    }
}

use std::time::Instant;

use eframe::egui::Vec2;
use tracing::{debug, warn};

use super::{HitTest, SpatialIndex, Viewport, ZOOM_STEP, ZoomGesture, ZoomTransform, find_node};
use crate::error::InteractionError;
use crate::layout::{Layout, LayoutConfig};
use crate::network::{Network, NodeIndex, NodeKind, neighborhood};

const HOVER_CONTRIBUTOR_OPACITY: f32 = 0.15;
const HOVER_OTHER_OPACITY: f32 = 0.3;

/// What the renderer needs to know about the pointer. Hover and click are
/// independent: a click survives hovering other nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionState {
    pub hovered: Option<NodeIndex>,
    pub clicked: Option<NodeIndex>,
    /// Opacity of the main layer under the overlays.
    pub main_opacity: f32,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            hovered: None,
            clicked: None,
            main_opacity: 1.0,
        }
    }
}

impl InteractionState {
    pub fn hover_active(&self) -> bool {
        self.hovered.is_some()
    }

    pub fn click_active(&self) -> bool {
        self.clicked.is_some()
    }

    fn clear_hover(&mut self) {
        self.hovered = None;
        if !self.click_active() {
            self.main_opacity = 1.0;
        }
    }

    fn fade_for(&mut self, network: &Network, node: NodeIndex) {
        let Some(node) = network.nodes.get(node) else {
            return;
        };
        if node.is_community() {
            return;
        }
        self.main_opacity = match node.kind() {
            NodeKind::Contributor => HOVER_CONTRIBUTOR_OPACITY,
            NodeKind::Owner | NodeKind::Repo => HOVER_OTHER_OPACITY,
        };
    }
}

/// Pointer handling over one laid-out network: owns the spatial indices,
/// the viewport and the zoom, and updates [`InteractionState`].
#[derive(Clone, Debug)]
pub struct Interaction {
    pub state: InteractionState,
    viewport: Viewport,
    zoom: ZoomTransform,
    gesture: ZoomGesture,
    primary: SpatialIndex,
    remaining: Option<SpatialIndex>,
    max_distance: f32,
}

impl Interaction {
    pub fn new(layout: &Layout, config: &LayoutConfig, viewport: Viewport) -> Self {
        let remaining = (!layout.remaining.is_empty())
            .then(|| SpatialIndex::build(&layout.network, layout.remaining.clone()));
        Self {
            state: InteractionState::default(),
            viewport,
            zoom: ZoomTransform::IDENTITY,
            gesture: ZoomGesture::default(),
            primary: SpatialIndex::all(&layout.network),
            remaining,
            max_distance: layout.ring.outer_radius() + config.hit_margin,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn zoom(&self) -> &ZoomTransform {
        &self.zoom
    }

    /// Number of nodes the primary index currently answers for.
    pub fn index_len(&self) -> usize {
        self.primary.len()
    }

    pub fn indexed(&self) -> &[NodeIndex] {
        self.primary.members()
    }

    pub fn resize(&mut self, layout: &Layout, css_size: Vec2, device_pixel_ratio: f32) {
        self.viewport = Viewport::resize(css_size.x, css_size.y, device_pixel_ratio, &layout.ring);
        self.primary = SpatialIndex::all(&layout.network);
        debug!(
            width = self.viewport.width,
            height = self.viewport.height,
            scale = self.viewport.scale_factor,
            "viewport resized"
        );
    }

    fn hit_test(&self) -> HitTest<'_> {
        HitTest {
            primary: &self.primary,
            remaining: self.remaining.as_ref(),
            max_distance: self.max_distance,
        }
    }

    /// The node under a CSS pointer position, if it counts as a hit. The
    /// central node never does.
    pub fn target_at(
        &self,
        network: &Network,
        pointer: Vec2,
    ) -> Result<Option<NodeIndex>, InteractionError> {
        let point = self.viewport.to_layout(pointer, &self.zoom);
        let hit = find_node(network, self.hit_test(), point, self.state.click_active())?;
        Ok(hit
            .filter(|hit| hit.found && hit.node != network.central)
            .map(|hit| hit.node))
    }

    pub fn pointer_move(&mut self, network: &Network, pointer: Vec2) {
        match self.target_at(network, pointer) {
            Ok(Some(node)) => {
                self.state.hovered = Some(node);
                self.state.fade_for(network, node);
            }
            Ok(None) => self.state.clear_hover(),
            Err(error) => {
                warn!(%error, "hover failed; clearing hover state");
                self.state.clear_hover();
            }
        }
    }

    pub fn pointer_leave(&mut self) {
        self.state.clear_hover();
    }

    /// Selects the node under the pointer and narrows hit testing to its
    /// neighborhood, or clears the selection when nothing is hit.
    pub fn click(&mut self, network: &Network, pointer: Vec2, now: Instant) {
        if self.gesture.should_suppress_click(now) {
            debug!("click swallowed by pan/zoom gesture");
            return;
        }

        match self.target_at(network, pointer) {
            Ok(Some(node)) => self.select(network, node),
            Ok(None) => self.reset_selection(network),
            Err(error) => {
                warn!(%error, "click failed; clearing selection");
                self.reset_selection(network);
            }
        }
    }

    /// Pins `node` as the clicked node and indexes only it and its neighbors.
    pub fn select(&mut self, network: &Network, node: NodeIndex) {
        if node >= network.nodes.len() || node == network.central {
            self.reset_selection(network);
            return;
        }
        self.state.clicked = Some(node);
        self.state.hovered = None;
        self.state.fade_for(network, node);

        let mut members = neighborhood(network, node).nodes;
        members.push(node);
        self.primary = SpatialIndex::build(network, members);
        debug!(node, indexed = self.primary.len(), "node selected");
    }

    pub fn reset_selection(&mut self, network: &Network) {
        self.state.clicked = None;
        self.state.hovered = None;
        self.state.main_opacity = 1.0;
        self.primary = SpatialIndex::all(network);
    }

    pub fn begin_gesture(&mut self) {
        self.gesture.start(self.zoom);
    }

    pub fn end_gesture(&mut self, now: Instant) {
        self.gesture.end(now);
    }

    pub fn is_panning(&self) -> bool {
        self.gesture.is_panning()
    }

    fn set_zoom(&mut self, zoom: ZoomTransform) {
        self.zoom = zoom;
        self.gesture.update(zoom);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.set_zoom(self.zoom.translate_by(delta));
    }

    pub fn scale_by(&mut self, factor: f32, center: Vec2) {
        self.set_zoom(self.zoom.scale_by(factor, center));
    }

    pub fn zoom_in(&mut self, center: Vec2) {
        self.scale_by(ZOOM_STEP, center);
    }

    pub fn zoom_out(&mut self, center: Vec2) {
        self.scale_by(1.0 / ZOOM_STEP, center);
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(ZoomTransform::IDENTITY);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use eframe::egui::vec2;

    use super::*;
    use crate::layout::{ApproxTextMeasure, rebuild};
    use crate::network::Filters;
    use crate::network::fixtures::sample;

    fn setup() -> (Layout, Interaction) {
        let config = LayoutConfig {
            seed: Some(12),
            ..LayoutConfig::default()
        };
        let layout =
            rebuild(&sample(), &Filters::default(), "hub/core", &config, &ApproxTextMeasure)
                .unwrap();
        let viewport = Viewport::resize(900.0, 900.0, 2.0, &layout.ring);
        let interaction = Interaction::new(&layout, &config, viewport);
        (layout, interaction)
    }

    fn pointer_on(layout: &Layout, interaction: &Interaction, id: &str) -> Vec2 {
        let node = &layout.network.nodes[layout.network.index_of(id).unwrap()];
        interaction
            .viewport()
            .to_screen(node.pos, interaction.zoom())
    }

    fn empty_spot(interaction: &Interaction) -> Vec2 {
        // Past the outer ring, where hit testing gives up.
        interaction
            .viewport()
            .to_screen(vec2(5000.0, 5000.0), interaction.zoom())
    }

    #[test]
    fn hovering_a_contributor_fades_the_most() {
        let (layout, mut interaction) = setup();
        let ada = layout.network.index_of("ada").unwrap();
        interaction.pointer_move(&layout.network, pointer_on(&layout, &interaction, "ada"));
        assert_eq!(interaction.state.hovered, Some(ada));
        assert_eq!(interaction.state.main_opacity, 0.15);

        interaction.pointer_move(&layout.network, pointer_on(&layout, &interaction, "misc/shared"));
        assert_eq!(interaction.state.main_opacity, 0.3);

        interaction.pointer_move(&layout.network, empty_spot(&interaction));
        assert_eq!(interaction.state, InteractionState::default());
    }

    #[test]
    fn central_node_is_not_hoverable() {
        let (layout, mut interaction) = setup();
        interaction.pointer_move(&layout.network, pointer_on(&layout, &interaction, "hub/core"));
        assert!(!interaction.state.hover_active());
        assert_eq!(interaction.state.main_opacity, 1.0);
    }

    #[test]
    fn click_then_empty_click_restores_the_full_index() {
        let (layout, mut interaction) = setup();
        let total = layout.network.nodes.len();
        assert_eq!(interaction.index_len(), total);

        let now = Instant::now();
        let grace = layout.network.index_of("grace").unwrap();
        interaction.click(&layout.network, pointer_on(&layout, &interaction, "grace"), now);
        assert_eq!(interaction.state.clicked, Some(grace));
        assert!(interaction.index_len() < total);
        assert!(interaction.indexed().contains(&grace));

        interaction.click(&layout.network, empty_spot(&interaction), now);
        assert!(!interaction.state.click_active());
        assert_eq!(interaction.index_len(), total);
        assert_eq!(interaction.state.main_opacity, 1.0);
    }

    #[test]
    fn click_holds_the_fade_after_hover_leaves() {
        let (layout, mut interaction) = setup();
        let now = Instant::now();
        interaction.pointer_move(&layout.network, pointer_on(&layout, &interaction, "ada"));
        interaction.click(&layout.network, pointer_on(&layout, &interaction, "ada"), now);
        assert!(!interaction.state.hover_active());

        interaction.pointer_leave();
        assert!(interaction.state.click_active());
        assert_eq!(interaction.state.main_opacity, 0.15);
    }

    #[test]
    fn selecting_the_central_node_clears_the_selection() {
        let (layout, mut interaction) = setup();
        let ada = layout.network.index_of("ada").unwrap();
        interaction.select(&layout.network, ada);
        assert_eq!(interaction.state.clicked, Some(ada));

        interaction.select(&layout.network, layout.network.central);
        assert!(!interaction.state.click_active());
        assert_eq!(interaction.index_len(), layout.network.nodes.len());
    }

    #[test]
    fn clicks_right_after_a_pan_are_ignored() {
        let (layout, mut interaction) = setup();
        let now = Instant::now();
        interaction.begin_gesture();
        interaction.pan_by(vec2(12.0, 0.0));
        interaction.end_gesture(now);

        let target = pointer_on(&layout, &interaction, "grace");
        interaction.click(&layout.network, target, now + Duration::from_millis(50));
        assert!(!interaction.state.click_active());

        interaction.click(&layout.network, target, now + Duration::from_millis(400));
        assert!(interaction.state.click_active());
    }

    #[test]
    fn zoom_keeps_hit_testing_aligned() {
        let (layout, mut interaction) = setup();
        interaction.zoom_in(vec2(450.0, 450.0));
        interaction.zoom_in(vec2(300.0, 500.0));
        assert!((interaction.zoom().k - 1.44).abs() < 1e-4);

        let ada = layout.network.index_of("ada").unwrap();
        let pointer = pointer_on(&layout, &interaction, "ada");
        assert_eq!(interaction.target_at(&layout.network, pointer), Ok(Some(ada)));

        interaction.reset_zoom();
        assert_eq!(*interaction.zoom(), ZoomTransform::IDENTITY);
    }

    #[test]
    fn stale_network_resets_hover() {
        let (layout, mut interaction) = setup();
        interaction.pointer_move(&layout.network, pointer_on(&layout, &interaction, "ada"));
        assert!(interaction.state.hover_active());

        let mut truncated = layout.network.clone();
        truncated.nodes.truncate(1);
        let far = layout.network.nodes.len() - 1;
        let pointer = interaction
            .viewport()
            .to_screen(layout.network.nodes[far].pos, interaction.zoom());
        interaction.pointer_move(&truncated, pointer);
        assert_eq!(interaction.state, InteractionState::default());
    }
}

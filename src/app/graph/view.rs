use contributor_network::interaction::ViewportConfig;
use contributor_network::layout::FontRole;
use contributor_network::network::{Neighborhood, NodeData, NodeIndex, NodeKind, neighborhood};
use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, Vec2, vec2,
};
use tracing::debug;

use super::super::render_utils::{
    HIGHLIGHT_COLOR, RING_COLOR, blend_color, circle_visible, draw_background, edge_visible,
    link_color, node_color,
};
use super::super::text::PainterTextMeasure;
use super::super::ui::tooltip_lines;
use super::super::{NetworkView, ViewModel};

/// Overlay variants drawn on top of the faded main layer.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Overlay {
    Click,
    Hover,
}

impl ViewModel {
    pub(in crate::app) fn draw_network(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let canvas = ViewportConfig {
            width: rect.width(),
            height: rect.height(),
            device_pixel_ratio: ui.ctx().pixels_per_point(),
        };

        if self.layout_dirty {
            self.canvas = canvas;
            self.rebuild_layout(&PainterTextMeasure::new(&painter));
        }

        let Some(view) = self.view.as_mut() else {
            painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));
            let message = self
                .layout_error
                .as_deref()
                .unwrap_or("Nothing to lay out for the current filters.");
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(15.0),
                Color32::from_gray(220),
            );
            return;
        };

        if canvas != self.canvas {
            self.canvas = canvas;
            view.interaction
                .resize(&view.layout, rect.size(), canvas.device_pixel_ratio);
        }

        view.handle_graph_zoom(ui, rect, &response);
        view.handle_graph_pan(&response);
        view.handle_pointer(ui, rect, &response);

        draw_background(&painter, rect, view.interaction.zoom());
        view.draw_main_layer(&painter, rect);

        if let Some(clicked) = view.interaction.state.clicked {
            view.draw_overlay(&painter, rect, clicked, Overlay::Click);
        }
        if let Some(hovered) = view.interaction.state.hovered {
            view.draw_overlay(&painter, rect, hovered, Overlay::Hover);
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        if view.interaction.is_panning() || response.dragged() {
            ui.ctx().request_repaint();
        }
    }
}

impl NetworkView {
    fn screen(&self, rect: Rect, position: Vec2) -> Pos2 {
        let interaction = &self.interaction;
        rect.min + interaction.viewport().to_screen(position, interaction.zoom())
    }

    fn screen_length(&self, length: f32) -> f32 {
        let interaction = &self.interaction;
        interaction
            .viewport()
            .scale_length(length, interaction.zoom())
    }

    fn draw_main_layer(&self, painter: &Painter, rect: Rect) {
        let network = &self.layout.network;
        let opacity = self.interaction.state.main_opacity;

        let center = self.screen(rect, network.central_node().pos);
        let ring = &self.layout.ring;
        let band = self.screen_length(ring.width).max(1.0);
        painter.circle_stroke(
            center,
            self.screen_length(ring.radius + ring.width / 2.0),
            Stroke::new(band, RING_COLOR.gamma_multiply(opacity)),
        );

        for link in &network.links {
            let Some((source, target)) = network.link_ends(link) else {
                continue;
            };
            let start = self.screen(rect, network.nodes[source].pos);
            let end = self.screen(rect, network.nodes[target].pos);
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }
            let width = self
                .screen_length(network.scales.link_width.apply(link.commit_count as f64))
                .clamp(0.4, 12.0);
            let color = link_color(&network.nodes[source]).gamma_multiply(opacity);
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        for (index, node) in network.nodes.iter().enumerate() {
            let position = self.screen(rect, node.pos);
            let radius = self.screen_length(node.r).max(1.5);
            if !circle_visible(rect, position, radius) {
                continue;
            }
            let color = node_color(node, index == network.central);
            painter.circle_filled(position, radius, color.gamma_multiply(opacity));
        }

        for &index in &self.layout.central_set {
            let node = &network.nodes[index];
            if node.kind() == NodeKind::Contributor {
                continue;
            }
            let color = Color32::from_gray(225).gamma_multiply(opacity);
            self.draw_label(painter, rect, index, color);
        }
        for index in network.indices_of_kind(NodeKind::Contributor) {
            if network.nodes[index].is_community() {
                continue;
            }
            let color = Color32::from_gray(235).gamma_multiply(opacity);
            self.draw_label(painter, rect, index, color);
        }
    }

    fn draw_label(&self, painter: &Painter, rect: Rect, index: NodeIndex, color: Color32) {
        let node = &self.layout.network.nodes[index];
        let role = match &node.data {
            NodeData::Contributor(_) => FontRole::Contributor,
            NodeData::Repo(_) => FontRole::Repo,
            NodeData::Owner(_) => FontRole::Owner,
        };
        let size = self.screen_length(role.size()).max(7.0);
        let position = self.screen(rect, node.pos) - vec2(0.0, self.screen_length(node.r) + 2.0);
        if !rect.contains(position) {
            return;
        }
        painter.text(
            position,
            Align2::CENTER_BOTTOM,
            &node.label,
            FontId::proportional(size),
            color,
        );
    }

    fn draw_overlay(&self, painter: &Painter, rect: Rect, focus: NodeIndex, overlay: Overlay) {
        let network = &self.layout.network;
        let Some(focus_node) = network.nodes.get(focus) else {
            debug!(focus, "overlay focus no longer exists");
            return;
        };
        let Neighborhood { nodes, links } = neighborhood(network, focus);

        for link_index in links {
            let Some(link) = network.links.get(link_index) else {
                continue;
            };
            let Some((source, target)) = network.link_ends(link) else {
                continue;
            };
            let start = self.screen(rect, network.nodes[source].pos);
            let end = self.screen(rect, network.nodes[target].pos);
            let width = self
                .screen_length(network.scales.link_width.apply(link.commit_count as f64))
                .clamp(1.0, 14.0);
            let color = blend_color(link_color(&network.nodes[source]), HIGHLIGHT_COLOR, 0.35);
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        for &index in nodes.iter().chain(std::iter::once(&focus)) {
            let node = &network.nodes[index];
            let position = self.screen(rect, node.pos);
            let radius = self.screen_length(node.r).max(2.0);
            painter.circle_filled(position, radius, node_color(node, index == network.central));
            self.draw_label(painter, rect, index, Color32::from_gray(245));
        }

        let position = self.screen(rect, focus_node.pos);
        let radius = self.screen_length(focus_node.r).max(2.0);
        painter.circle_stroke(position, radius + 3.0, Stroke::new(2.0, HIGHLIGHT_COLOR));

        if overlay == Overlay::Hover {
            let anchor = position + vec2(radius + 12.0, 0.0);
            draw_tooltip(painter, rect, anchor, &tooltip_lines(network, focus));
        }
    }
}

fn draw_tooltip(painter: &Painter, rect: Rect, anchor: Pos2, lines: &[String]) {
    let font = FontId::proportional(13.0);
    let galleys = lines
        .iter()
        .map(|line| painter.layout_no_wrap(line.clone(), font.clone(), Color32::from_gray(240)))
        .collect::<Vec<_>>();
    let width = galleys
        .iter()
        .map(|galley| galley.size().x)
        .fold(0.0_f32, f32::max);
    let height: f32 = galleys.iter().map(|galley| galley.size().y).sum();

    let padding = vec2(8.0, 6.0);
    let size = vec2(width, height) + padding * 2.0;
    let mut min = anchor - vec2(0.0, size.y / 2.0);
    if min.x + size.x > rect.right() {
        min.x = anchor.x - size.x - 24.0;
    }
    min.y = min.y.clamp(rect.top(), (rect.bottom() - size.y).max(rect.top()));

    let frame = Rect::from_min_size(min, size);
    painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(12, 14, 18, 230));
    painter.rect_stroke(
        frame,
        4.0,
        Stroke::new(1.0, Color32::from_gray(90)),
        egui::StrokeKind::Inside,
    );

    let mut cursor = min + padding;
    for galley in galleys {
        let line_height = galley.size().y;
        painter.galley(cursor, galley, Color32::from_gray(240));
        cursor.y += line_height;
    }
}

use contributor_network::interaction::ZoomTransform;
use contributor_network::network::{Node, NodeKind};
use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

pub(super) const CENTRAL_COLOR: Color32 = Color32::from_rgb(236, 201, 120);
pub(super) const RING_COLOR: Color32 = Color32::from_rgba_premultiplied(48, 58, 70, 90);
pub(super) const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(250, 250, 245);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    base.lerp_to_gamma(overlay, amount.clamp(0.0, 1.0))
}

/// Darkened and slightly transparent, for community contributors.
fn muted(color: Color32) -> Color32 {
    blend_color(color, Color32::from_rgb(19, 23, 29), 0.45).gamma_multiply(0.8)
}

pub(super) fn node_color(node: &Node, central: bool) -> Color32 {
    if central {
        return CENTRAL_COLOR;
    }
    let base = match node.kind() {
        NodeKind::Contributor => Color32::from_rgb(214, 92, 122),
        NodeKind::Owner => Color32::from_rgb(96, 170, 224),
        NodeKind::Repo => Color32::from_rgb(84, 196, 168),
    };
    if node.is_community() {
        muted(base)
    } else {
        base
    }
}

pub(super) fn link_color(source: &Node) -> Color32 {
    let color = match source.kind() {
        NodeKind::Contributor => Color32::from_rgb(150, 84, 110),
        NodeKind::Owner | NodeKind::Repo => Color32::from_rgb(80, 130, 160),
    };
    color.gamma_multiply(0.55)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, zoom: &ZoomTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.k.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + zoom.translation();
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 50));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end).expand(padding).intersects(rect)
}

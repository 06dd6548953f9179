//! Hit testing and the hover/click state machine over a finished layout.

mod index;
mod state;
mod viewport;

use eframe::egui::Vec2;

pub use index::SpatialIndex;
pub use state::{Interaction, InteractionState};
pub use viewport::{
    CLICK_SUPPRESS_WINDOW, MAX_ZOOM, MIN_ZOOM, Viewport, ViewportConfig, ZOOM_STEP, ZoomGesture,
    ZoomTransform,
};

use crate::error::InteractionError;
use crate::network::{Network, NodeIndex};

/// Hit distance beyond the node radius while nothing is clicked.
pub const HOVER_THRESHOLD: f32 = 50.0;
/// Tighter hit distance once a click has focused the view.
pub const CLICK_THRESHOLD: f32 = 10.0;
/// Hit distance for the community fallback index.
pub const REMAINING_THRESHOLD: f32 = 5.0;

/// Nearest node to a query and whether it was close enough to count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub node: NodeIndex,
    pub distance: f32,
    pub found: bool,
}

/// Indices a hit test consults, plus the radius past which it gives up.
#[derive(Clone, Copy, Debug)]
pub struct HitTest<'a> {
    pub primary: &'a SpatialIndex,
    pub remaining: Option<&'a SpatialIndex>,
    pub max_distance: f32,
}

/// Nearest node to `point` in layout coordinates. Returns `None` past the
/// outer edge of the picture or when the index is empty, and an error when
/// the index was built over a different network.
pub fn find_node(
    network: &Network,
    test: HitTest<'_>,
    point: Vec2,
    click_active: bool,
) -> Result<Option<Hit>, InteractionError> {
    if !point.is_finite() || point.length() > test.max_distance {
        return Ok(None);
    }

    let threshold = if click_active {
        CLICK_THRESHOLD
    } else {
        HOVER_THRESHOLD
    };
    let primary = hit_in(network, test.primary, point, threshold)?;
    if primary.is_some_and(|hit| hit.found) {
        return Ok(primary);
    }

    // On a double miss the remaining candidate is reported, unless that index is empty.
    match test.remaining {
        Some(remaining) => Ok(hit_in(network, remaining, point, REMAINING_THRESHOLD)?.or(primary)),
        None => Ok(primary),
    }
}

fn hit_in(
    network: &Network,
    index: &SpatialIndex,
    point: Vec2,
    threshold: f32,
) -> Result<Option<Hit>, InteractionError> {
    let Some(node) = index.find(point) else {
        return Ok(None);
    };
    let candidate = network
        .nodes
        .get(node)
        .ok_or(InteractionError::StaleNode(node))?;
    let distance = (candidate.pos - point).length();
    Ok(Some(Hit {
        node,
        distance,
        found: distance < candidate.r + threshold,
    }))
}

use contributor_network::layout::{FontRole, TextMeasure, TextMetrics};
use eframe::egui::{Color32, FontId, Painter};

/// Share of the row height above the baseline.
const ASCENT_SHARE: f32 = 0.8;

/// Measures labels with the fonts the canvas draws them in.
pub(super) struct PainterTextMeasure<'a> {
    painter: &'a Painter,
}

impl<'a> PainterTextMeasure<'a> {
    pub(super) fn new(painter: &'a Painter) -> Self {
        Self { painter }
    }
}

impl TextMeasure for PainterTextMeasure<'_> {
    fn measure(&self, text: &str, role: FontRole) -> TextMetrics {
        let galley = self.painter.layout_no_wrap(
            text.to_string(),
            FontId::proportional(role.size()),
            Color32::WHITE,
        );
        let size = galley.size();
        TextMetrics {
            width: size.x,
            ascent: size.y * ASCENT_SHARE,
            descent: size.y * (1.0 - ASCENT_SHARE),
        }
    }
}

use std::time::Instant;

use eframe::egui::{self, Rect, Ui};

use super::super::NetworkView;

impl NetworkView {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);

        self.interaction.begin_gesture();
        self.interaction.scale_by(zoom_factor, pointer - rect.min);
        self.interaction.end_gesture(Instant::now());
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let dragging = response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle);

        if dragging {
            if !self.interaction.is_panning() {
                self.interaction.begin_gesture();
            }
            self.interaction.pan_by(response.drag_delta());
        } else if self.interaction.is_panning() {
            self.interaction.end_gesture(Instant::now());
        }
    }

    /// Feeds pointer position and primary clicks into the hover/click state.
    pub(in crate::app) fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let network = &self.layout.network;
        match ui.input(|input| input.pointer.hover_pos()) {
            Some(pointer) if rect.contains(pointer) => {
                self.interaction.pointer_move(network, pointer - rect.min);
            }
            _ => {
                if self.interaction.state.hover_active() {
                    self.interaction.pointer_leave();
                }
            }
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.interaction
                .click(network, pointer - rect.min, Instant::now());
        }
    }
}

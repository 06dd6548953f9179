use contributor_network::interaction::Interaction;
use contributor_network::layout::{TextMeasure, rebuild};
use eframe::egui::{self, Align, Context, Layout};
use tracing::{info, warn};

use super::super::{DataSource, NetworkView, ViewModel};

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &DataSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("contributor-network");
                    ui.separator();
                    ui.label(format!("central: {}", self.central_id));
                    ui.label(format!("data: {}", source.path.display()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Rebuild layout").clicked() {
                        self.layout_dirty = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(summary) = self.summary_text() {
                            ui.label(summary);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if is_loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Reloading contributor network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                } else {
                    self.draw_network(ui);
                }
            });
    }

    fn summary_text(&self) -> Option<String> {
        let view = self.view.as_ref()?;
        let network = &view.layout.network;
        Some(format!(
            "nodes: {}  |  links: {}  |  ring radius: {:.0}",
            network.nodes.len(),
            network.links.len(),
            view.layout.ring.radius
        ))
    }

    /// Filters, prepares and lays out from scratch, then resets pointer state.
    pub(in crate::app) fn rebuild_layout(&mut self, measure: &dyn TextMeasure) {
        self.layout_dirty = false;
        match rebuild(
            &self.raw,
            &self.filters,
            &self.central_id,
            &self.config,
            measure,
        ) {
            Ok(layout) => {
                let viewport = self.canvas.viewport(&layout.ring);
                let interaction = Interaction::new(&layout, &self.config, viewport);
                info!(
                    nodes = layout.network.nodes.len(),
                    links = layout.network.links.len(),
                    radius = layout.ring.radius,
                    filtered = self.filters.is_active(),
                    "layout rebuilt"
                );
                self.view = Some(NetworkView {
                    layout,
                    interaction,
                });
                self.layout_error = None;
            }
            Err(error) => {
                warn!(%error, "layout rebuild failed");
                self.view = None;
                self.layout_error = Some(error.to_string());
            }
        }
    }
}

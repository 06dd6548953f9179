use eframe::egui::{self, Ui, vec2};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Filters");
        ui.separator();
        ui.add_space(4.0);

        let mut filters_changed = false;

        ui.label("Organizations");
        egui::ScrollArea::vertical()
            .id_salt("organization_filters")
            .max_height(260.0)
            .show(ui, |ui| {
                for organization in &self.organizations {
                    let mut active = self.filters.organizations.contains(organization);
                    if ui.checkbox(&mut active, organization.as_str()).changed() {
                        self.filters.set_organization(organization, active);
                        filters_changed = true;
                    }
                }
            });

        ui.separator();

        let mut stars_min = self.filters.stars_min.unwrap_or(0);
        let stars_slider = ui.add(
            egui::Slider::new(&mut stars_min, 0..=self.max_stars.max(1))
                .logarithmic(true)
                .text("min stars"),
        );
        if stars_slider.drag_stopped() || (stars_slider.changed() && !stars_slider.dragged()) {
            self.filters.stars_min = (stars_min > 0).then_some(stars_min);
            filters_changed = true;
        }

        let mut forks_min = self.filters.forks_min.unwrap_or(0);
        let forks_slider = ui.add(
            egui::Slider::new(&mut forks_min, 0..=self.max_forks.max(1))
                .logarithmic(true)
                .text("min forks"),
        );
        if forks_slider.drag_stopped() || (forks_slider.changed() && !forks_slider.dragged()) {
            self.filters.forks_min = (forks_min > 0).then_some(forks_min);
            filters_changed = true;
        }

        if ui
            .add_enabled(self.filters.is_active(), egui::Button::new("Clear filters"))
            .clicked()
        {
            self.filters.clear_all();
            filters_changed = true;
        }

        ui.separator();
        ui.collapsing("Layout tuning", |ui| {
            let padding = ui.add(
                egui::Slider::new(&mut self.config.contributor_padding, 0.0..=200.0)
                    .text("contributor padding"),
            );
            let factor = ui.add(
                egui::Slider::new(&mut self.config.inner_radius_factor, 0.3..=0.95)
                    .text("inner radius factor"),
            );
            let ring = ui.add(
                egui::Slider::new(&mut self.config.ring_width_multiplier, 2.0..=3.0)
                    .text("ring width multiplier"),
            );
            if padding.drag_stopped() || factor.drag_stopped() || ring.drag_stopped() {
                self.layout_dirty = true;
            }

            let mut seeded = self.config.seed.is_some();
            if ui.checkbox(&mut seeded, "Fixed seed").changed() {
                self.config.seed = seeded.then_some(0);
                self.layout_dirty = true;
            }
            if let Some(seed) = self.config.seed.as_mut()
                && ui
                    .add(egui::DragValue::new(seed).prefix("seed "))
                    .drag_stopped()
            {
                self.layout_dirty = true;
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Zoom");
            let center = vec2(self.canvas.width, self.canvas.height) / 2.0;
            let Some(view) = self.view.as_mut() else {
                return;
            };
            if ui.button("+").clicked() {
                view.interaction.zoom_in(center);
            }
            if ui.button("-").clicked() {
                view.interaction.zoom_out(center);
            }
            if ui.button("Reset").clicked() {
                view.interaction.reset_zoom();
            }
        });

        if filters_changed {
            self.layout_dirty = true;
        }
    }
}

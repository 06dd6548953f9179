use contributor_network::network::{Network, NodeData, NodeIndex, neighborhood};
use contributor_network::util::{format_count, short_name};
use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;

const MAX_NEIGHBOR_ROWS: usize = 40;

/// Tooltip rows for a node: label, kind and the headline numbers.
pub(in crate::app) fn tooltip_lines(network: &Network, index: NodeIndex) -> Vec<String> {
    let Some(node) = network.nodes.get(index) else {
        return Vec::new();
    };

    let mut lines = vec![node.label.clone()];
    match &node.data {
        NodeData::Contributor(contributor) => {
            let tier = if node.is_community() { "community" } else { "core" };
            lines.push(format!("{tier} contributor"));
            lines.push(format!(
                "{} commits",
                format_count(contributor.total_commits)
            ));
        }
        NodeData::Repo(repo) => {
            lines.push(format!("repository of {}", repo.owner));
            lines.push(format!(
                "{} stars, {} forks",
                format_count(repo.stars),
                format_count(repo.forks)
            ));
            if !repo.languages.is_empty() {
                lines.push(repo.languages.join(", "));
            }
        }
        NodeData::Owner(owner) => {
            lines.push(format!("owner of {} repositories", owner.repos.len()));
            lines.push(format!(
                "{} stars, {} forks",
                format_count(owner.stars),
                format_count(owner.forks)
            ));
        }
    }
    lines.push(format!("{} links", node.degree));
    lines
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        let Some(view) = self.view.as_mut() else {
            ui.label("No layout yet.");
            return;
        };
        let Some(clicked) = view.interaction.state.clicked else {
            ui.label("Click a node to pin its neighborhood.");
            return;
        };

        let network = &view.layout.network;
        let lines = tooltip_lines(network, clicked);
        let Some((title, rest)) = lines.split_first() else {
            ui.label("Selected node no longer exists in the layout.");
            return;
        };

        ui.label(RichText::new(title).strong());
        for line in rest {
            ui.label(line);
        }

        let neighbors = neighborhood(network, clicked).nodes;
        ui.separator();
        ui.label(RichText::new(format!("Neighbors ({})", neighbors.len())).strong());

        let mut focus = None;
        egui::ScrollArea::vertical()
            .id_salt("neighbor_list")
            .show(ui, |ui| {
                for &index in neighbors.iter().take(MAX_NEIGHBOR_ROWS) {
                    let node = &network.nodes[index];
                    let text = format!("{} ({})", short_name(&node.id), node.kind().label());
                    if ui.link(text).on_hover_text(node.id.as_str()).clicked() {
                        focus = Some(index);
                    }
                }
                if neighbors.len() > MAX_NEIGHBOR_ROWS {
                    ui.small(format!("and {} more", neighbors.len() - MAX_NEIGHBOR_ROWS));
                }
            });

        ui.add_space(6.0);
        if ui.button("Clear selection").clicked() {
            view.interaction.reset_selection(network);
        } else if let Some(index) = focus {
            view.interaction.select(network, index);
        }
    }
}

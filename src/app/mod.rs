use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use contributor_network::interaction::{Interaction, ViewportConfig};
use contributor_network::layout::{Layout, LayoutConfig};
use contributor_network::network::{Filters, RawNetwork, load_raw_network, organizations};
use eframe::egui::{self, Context};

mod graph;
mod render_utils;
mod text;
mod ui;

/// Where the network comes from and how to lay it out.
#[derive(Clone, Debug)]
pub struct DataSource {
    pub path: PathBuf,
    pub central: Option<String>,
    pub config: LayoutConfig,
    /// Canvas size to lay out for until the first frame reports the real one.
    pub viewport: ViewportConfig,
}

pub struct ContributorNetworkApp {
    source: DataSource,
    state: AppState,
    reload_rx: Option<Receiver<Result<LoadedData, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedData, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct LoadedData {
    raw: RawNetwork,
    central_id: String,
}

struct ViewModel {
    raw: RawNetwork,
    central_id: String,
    config: LayoutConfig,
    filters: Filters,
    organizations: Vec<String>,
    max_stars: u64,
    max_forks: u64,
    /// Set when filters or layout settings changed; the next frame rebuilds.
    layout_dirty: bool,
    layout_error: Option<String>,
    view: Option<NetworkView>,
    /// Canvas size in points and pixels per point the view was sized for.
    canvas: ViewportConfig,
}

/// A finished layout and the pointer state over it.
struct NetworkView {
    layout: Layout,
    interaction: Interaction,
}

fn load(source: &DataSource) -> anyhow::Result<LoadedData> {
    let raw = load_raw_network(&source.path)
        .with_context(|| format!("failed to load network from {}", source.path.display()))?;
    let central_id = source
        .central
        .clone()
        .or_else(|| raw.central.clone())
        .context("no central repository: pass --central or set \"central\" in the data file")?;
    Ok(LoadedData { raw, central_id })
}

impl ContributorNetworkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: DataSource) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: DataSource) -> Receiver<Result<LoadedData, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: DataSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }
}

impl eframe::App for ContributorNetworkApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(data) => AppState::Ready(Box::new(ViewModel::new(data, &self.source))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading contributor network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load contributor network");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.source.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(data)) => {
                            transition =
                                Some(AppState::Ready(Box::new(ViewModel::new(data, &self.source))));
                        }
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(data: LoadedData, source: &DataSource) -> Self {
        let organizations = organizations(&data.raw);
        let max_stars = data.raw.repos.iter().map(|repo| repo.stars).max().unwrap_or(0);
        let max_forks = data.raw.repos.iter().map(|repo| repo.forks).max().unwrap_or(0);
        Self {
            raw: data.raw,
            central_id: data.central_id,
            config: source.config.clone(),
            filters: Filters::default(),
            organizations,
            max_stars,
            max_forks,
            layout_dirty: true,
            layout_error: None,
            view: None,
            canvas: source.viewport,
        }
    }
}

mod app;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow};
use clap::Parser;
use contributor_network::LayoutConfig;
use contributor_network::interaction::ViewportConfig;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with contributors, repos and links.
    data: PathBuf,
    /// Central repository id (`owner/name`); defaults to the file's `central`.
    #[arg(long)]
    central: Option<String>,
    /// JSON file with layout settings.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    padding: Option<f32>,
    #[arg(long)]
    inner_radius_factor: Option<f32>,
    #[arg(long)]
    seed: Option<u64>,
    /// Initial window width in points.
    #[arg(long)]
    width: Option<f32>,
    /// Initial window height in points.
    #[arg(long)]
    height: Option<f32>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse layout config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(padding) = args.padding {
        config.contributor_padding = padding;
    }
    if let Some(factor) = args.inner_radius_factor {
        config.inner_radius_factor = factor;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let defaults = ViewportConfig::default();
    let viewport = ViewportConfig {
        width: args.width.unwrap_or(defaults.width),
        height: args.height.unwrap_or(defaults.height),
        ..defaults
    };
    info!(data = %args.data.display(), ?config, ?viewport, "starting viewer");

    let source = app::DataSource {
        path: args.data,
        central: args.central,
        config,
        viewport,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([viewport.width + 600.0, viewport.height]),
        ..Default::default()
    };

    eframe::run_native(
        "contributor-network",
        options,
        Box::new(move |cc| Ok(Box::new(app::ContributorNetworkApp::new(cc, source)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use app::TetanusDashApp;
use clap::Parser;
use eframe::egui;
use state::AppState;
use tetanus_dash::config::DashboardConfig;

#[derive(Parser)]
#[command(name = "tetanus-dash")]
#[command(about = "Dashboard of confirmed tetanus cases", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Case records (.csv or .parquet); overrides `data_path` from the config
    #[arg(short, long)]
    data: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = DashboardConfig::resolve(args.config.as_deref(), args.data.as_deref())
        .context("reading configuration")?;

    // Failing to read the dataset at startup is fatal.
    let mut state = AppState::new(&config);
    state.load()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tetanus Dash – Confirmed Cases",
        options,
        Box::new(|_cc| Ok(Box::new(TetanusDashApp::new(state)))),
    )
    .map_err(|e| anyhow!("{e}"))
}

mod backend_bridge;
mod config;
mod controller;
mod ui;

use std::path::PathBuf;

use anyhow::anyhow;
use backend_bridge::{
    commands::BackendCommand,
    runtime::{start_backend_bridge, BackendConfig},
};
use clap::Parser;
use controller::{events::UiEvent, orchestration::BackendDispatcher};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use ui::{MenuAdminApp, PersistedViewSettings, SETTINGS_STORAGE_KEY};

#[derive(Debug, Parser)]
#[command(name = "menu_admin", about = "Menu administration desktop screen")]
struct Args {
    /// TOML settings file; defaults to ./menu_admin.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    log_filter: Option<String>,
    /// Font file with Japanese glyphs.
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        settings.database_url = config::normalize_database_url(&url);
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size.max(1);
    }
    if let Some(filter) = args.log_filter {
        settings.log_filter = filter;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(
        database_url = %settings.database_url,
        page_size = settings.page_size,
        "starting menu admin"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    start_backend_bridge(
        BackendConfig {
            database_url: settings.database_url.clone(),
            page_size: settings.page_size,
        },
        cmd_rx,
        ui_tx,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("メニュー管理")
            .with_inner_size([1200.0, 760.0])
            .with_min_inner_size([860.0, 540.0]),
        ..Default::default()
    };
    let font = args.font;
    eframe::run_native(
        "menu_admin",
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedViewSettings>(&text).ok())
            });
            Ok(Box::new(MenuAdminApp::new(
                BackendDispatcher::new(cmd_tx),
                ui_rx,
                persisted,
                font,
            )))
        }),
    )
    .map_err(|err| anyhow!("failed to run menu admin window: {err}"))
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use glance_config::ui::UiConfig;
use glance_types::{SelectionRegion, TranslationModel};
use tokio::signal;
use tracing_subscriber::EnvFilter;

pub mod controller;
pub mod io;
pub mod profile;
pub mod state;
pub mod ui;


use self::controller::{AppController, RunOptions};
use self::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Select a screen region, read it with OCR and translate it locally")]
struct Args {
    /// Settings file (default: <config dir>/glance/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Translation model: catalog key, display name or model id
    #[arg(long)]
    model: Option<TranslationModel>,

    /// Overlay font size, snapped to the nearest supported size
    #[arg(long)]
    font_size: Option<u32>,

    /// Write --model / --font-size back to the settings file
    #[arg(long)]
    save: bool,

    /// Translate this region once and exit: x,y,width,height
    #[arg(long, value_parser = ui::parse_region)]
    region: Option<SelectionRegion>,

    /// Do not register global hotkeys
    #[arg(long)]
    no_hotkeys: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.with_ansi(atty::is(atty::Stream::Stderr)).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let settings_path = match &args.config {
        Some(path) => path.clone(),
        None => profile::default_settings_path()?,
    };
    let mut config = profile::load_or_init(&settings_path)?;

    if let Some(model) = args.model {
        config.translator.model = model;
    }
    if let Some(size) = args.font_size {
        config.ui.font_size = UiConfig::snap_font_size(size);
    }
    if args.save {
        profile::save(&settings_path, &config)?;
        tracing::info!("Settings saved to {}", settings_path.display());
    }

    config.apply_env_overrides();
    tracing::info!(
        "glance v{} using {} ({} -> {})",
        env!("CARGO_PKG_VERSION"),
        config.translator.model,
        config.translator.source_language,
        config.translator.target_language
    );

    let state = Arc::new(AppState::new(config, settings_path));
    let controller = AppController::new(state);

    let options = RunOptions {
        hotkeys: !args.no_hotkeys && args.region.is_none(),
        commands: args.region.is_none(),
        one_shot: args.region,
    };
    let mut tasks = controller.spawn_tasks(options).await?;
    let stop = controller.cancel_token();

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
            tracing::info!("Shutdown requested");
        }
        _ = stop.cancelled() => {
            tracing::info!("Stopping");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::warn!("A task exited early"),
                Ok(Err(e)) => tracing::error!("Task failed: {:#}", e),
                Err(e) => tracing::error!("Task panicked: {}", e),
            }
        }
    }

    controller.shutdown();

    let drain = async {
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Err(e)) => tracing::warn!("Task ended with error: {:#}", e),
                Err(e) if e.is_panic() => tracing::error!("Task panicked: {}", e),
                _ => {}
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(2), drain).await.is_err() {
        tracing::warn!("Tasks did not stop in time, aborting");
        tasks.abort_all();
    }

    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trainer_pro::audio::SystemAudioPlayer;
use trainer_pro::clipboard::CommandClipboard;
use trainer_pro::config::Config;
use trainer_pro::gemini::GeminiClient;
use trainer_pro::state::AppState;
use trainer_pro::storage::{FileStore, Persistence};
use trainer_pro::ui::TrainerApp;

#[derive(Parser)]
#[command(author, version, about = "Client roster and workout log for personal trainers")]
struct Args {
    /// Config file (TOML). Defaults to <config_dir>/trainer-pro/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the roster slot
    #[arg(long, env = "TRAINER_PRO_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("cannot open data dir {}", config.data_dir.display()))?;
    info!("Storing roster in {}", store.dir().display());
    let persistence =
        Persistence::with_key(Box::new(store), &config.storage_key).with_background_writer();
    let gateway = GeminiClient::new(&config.gemini)?;

    let state = AppState::new(
        persistence,
        Arc::new(gateway),
        Box::new(SystemAudioPlayer::new()),
        Box::new(CommandClipboard),
    );
    let timer_presets = config.timer_presets.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 860.0])
            .with_min_inner_size([360.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Trainer Pro",
        options,
        Box::new(|cc| Ok(Box::new(TrainerApp::new(cc, state, timer_presets)))),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}

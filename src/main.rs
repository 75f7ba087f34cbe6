use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod media;
mod server;
mod utils;

use config::Config;
use media::ExtractorState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Port to listen on (overrides the config file and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/yt-relay/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/yt-relay/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match get_config_path(args) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    if let Ok(port) = std::env::var("PORT") {
        let port = port
            .parse()
            .with_context(|| format!("Invalid PORT value: {}", port))?;
        config.apply_port_override(port);
    }
    if let Some(port) = args.port {
        config.apply_port_override(port);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.get_logging_format() == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Starting yt-relay...");
    if let Some(path) = get_config_path(&args) {
        info!("Loaded config from: {}", path);
    }

    // Requests are answered with 503 until the extractor is usable.
    let (extractor_tx, extractor_rx) = watch::channel(ExtractorState::Uninitialized);
    let extractor_config = config.extractor.clone();
    tokio::spawn(async move {
        let state = media::provision::initialize(&extractor_config).await;
        extractor_tx.send_replace(state);
    });

    server::serve(server::AppState::new(extractor_rx), &config.server).await
}

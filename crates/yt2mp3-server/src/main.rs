mod http;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use yt2mp3_core::config::Config;
use yt2mp3_core::logging::{init_logging, DEFAULT_FILTER};
use yt2mp3_core::Pipeline;

/// Local HTTP service that downloads YouTube/SoundCloud audio as tagged MP3s.
#[derive(Debug, Parser)]
#[command(name = "yt2mp3-server", version)]
struct Args {
    /// Config file (default: ~/.config/yt2mp3/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overrides the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_logging(&config.paths.server_log, DEFAULT_FILTER);
    eprintln!("Logging to {}", config.paths.server_log.display());

    match &args.config {
        Some(path) => info!("Config loaded from: {:?}", path),
        None => info!("Config loaded from: {:?}", Config::config_path()),
    }

    let pipeline = Pipeline::new(config.pipeline_config());
    let settings = pipeline.config();
    info!("yt-dlp: {:?}", settings.tools.yt_dlp);
    info!("ffmpeg: {:?}", settings.tools.ffmpeg);
    info!("Downloads go to {:?}", settings.download_dir);

    http::serve(
        &config.server.bind_address,
        config.server.port,
        http::HttpState::new(pipeline),
    )
    .await?;

    info!("Server stopped");
    Ok(())
}

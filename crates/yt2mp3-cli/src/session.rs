//! Config, logging and pipeline setup shared by both binaries

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{error, info};
use yt2mp3_core::config::Config;
use yt2mp3_core::logging::{init_logging, DEFAULT_FILTER};
use yt2mp3_core::search::{self, SearchResult};
use yt2mp3_core::{DownloadRequest, Pipeline};

pub struct Session {
    config: Config,
    pipeline: Pipeline,
}

impl Session {
    /// Load config (default location unless `config_path` is given) and
    /// start logging to the CLI log file.
    pub fn start(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        init_logging(&config.paths.cli_log, DEFAULT_FILTER);
        info!("yt2mp3 CLI starting");
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        let pipeline = Pipeline::new(config.pipeline_config());
        Self { config, pipeline }
    }

    pub async fn search(&self, query: &str) -> yt2mp3_core::Result<Vec<SearchResult>> {
        let settings = self.pipeline.config();
        search::search(
            &settings.tools.yt_dlp,
            query,
            self.config.search.results,
            settings.timeouts.search,
        )
        .await
    }

    /// Run one download, reporting progress on `out`.
    pub async fn download<W: Write>(
        &self,
        out: &mut W,
        url: &str,
        title: Option<String>,
    ) -> anyhow::Result<PathBuf> {
        let request = DownloadRequest::new(url, title)?;
        writeln!(
            out,
            "Downloading: {}",
            request.title.as_deref().unwrap_or("Auto-detecting title...")
        )?;
        out.flush()?;

        let outcome = self.pipeline.run(&request).await?;
        writeln!(out, "Downloaded to: {}", outcome.path.display())?;
        Ok(outcome.path)
    }
}

/// `Error: <message>` on stderr and exit code 1 for any failure.
pub fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

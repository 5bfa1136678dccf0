//! Download-and-tag pipeline
//!
//! Runs one request through the stages
//! `Received → MetadataFetching → Downloading → BaseTagging →
//! [ThumbnailTagging] → Cleanup → Done | Failed`.
//! A fatal error in any stage skips straight to cleanup. Thumbnail embedding
//! is best effort and never fails the request.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, info_span, warn, Instrument};

pub mod artifacts;
pub mod cleanup;
pub mod download;
pub mod metadata;
pub mod tagging;

use crate::error::{PipelineError, Result};
use crate::request::DownloadRequest;
use crate::sanitize::file_stem_for;
use artifacts::{TempArtifacts, AUDIO_EXT};
use metadata::Metadata;
use tagging::TagSet;

/// Locations of the external tools
#[derive(Debug, Clone, PartialEq)]
pub struct Tools {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
}

/// Upper bound on each external invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    pub metadata: Duration,
    pub search: Duration,
    /// Per download attempt
    pub download: Duration,
    pub convert: Duration,
    pub tag: Duration,
    pub embed: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(45),
            search: Duration::from_secs(30),
            download: Duration::from_secs(300),
            convert: Duration::from_secs(30),
            tag: Duration::from_secs(60),
            embed: Duration::from_secs(60),
        }
    }
}

/// Everything the pipeline needs, passed in explicitly
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub download_dir: PathBuf,
    /// Where request-scoped temp files live
    pub work_dir: PathBuf,
    pub tools: Tools,
    pub timeouts: Timeouts,
}

/// Pipeline stages, used in log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    MetadataFetching,
    Downloading,
    BaseTagging,
    ThumbnailTagging,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::MetadataFetching => "metadata",
            Stage::Downloading => "downloading",
            Stage::BaseTagging => "base-tagging",
            Stage::ThumbnailTagging => "thumbnail-tagging",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a successful request
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub thumbnail_embedded: bool,
    pub elapsed: Duration,
}

/// Immutable once built; share it behind an `Arc` across concurrent requests.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a request end to end inside a `request{id=..}` span.
    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadOutcome> {
        let span = info_span!("request", id = %request.id);
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &DownloadRequest) -> Result<DownloadOutcome> {
        let started = Instant::now();
        info!(
            stage = %Stage::Received,
            "url={} platform={} title={:?}",
            request.url,
            request.platform,
            request.title
        );

        let artifacts = TempArtifacts::new(
            &self.config.work_dir,
            &self.config.download_dir,
            &request.id,
        );
        let result = self.execute(request, &artifacts, started).await;

        info!(stage = %Stage::Cleanup, "removing temp files");
        cleanup::cleanup(&artifacts).await;

        match &result {
            Ok(outcome) => info!(
                stage = %Stage::Done,
                "saved {} in {:.2}s",
                outcome.path.display(),
                outcome.elapsed.as_secs_f64()
            ),
            Err(e) => warn!(
                stage = %Stage::Failed,
                "after {:.2}s: {}",
                started.elapsed().as_secs_f64(),
                e
            ),
        }
        result
    }

    async fn execute(
        &self,
        request: &DownloadRequest,
        artifacts: &TempArtifacts,
        started: Instant,
    ) -> Result<DownloadOutcome> {
        let cfg = &self.config;
        ensure_dir(&cfg.download_dir).await?;
        ensure_dir(&cfg.work_dir).await?;

        let url = metadata::clean_url(&request.url);
        info!(stage = %Stage::MetadataFetching, "querying {}", url);
        let meta = metadata::fetch_metadata(&cfg.tools.yt_dlp, &url, cfg.timeouts.metadata).await?;

        let tags = tag_set(request, &meta);
        let final_path = self.final_path(&tags.title);

        info!(stage = %Stage::Downloading, "fetching audio and thumbnail");
        let strategies = download::strategies_for(request.platform, cfg.timeouts.download);
        let downloaded =
            download::download_audio(&cfg.tools.yt_dlp, &url, artifacts, &strategies).await?;

        // Convert up front: a broken thumbnail fails the request before the
        // final file is written.
        let cover = match &downloaded.thumbnail {
            Some(thumb) => Some(
                tagging::prepare_cover(&cfg.tools.ffmpeg, thumb, artifacts, cfg.timeouts.convert)
                    .await?,
            ),
            None => None,
        };

        let staged = artifacts.staged_output();
        info!(stage = %Stage::BaseTagging, "writing tags for {}", final_path.display());
        tagging::write_base_tags(
            &cfg.tools.ffmpeg,
            &downloaded.audio,
            &staged,
            &tags,
            cfg.timeouts.tag,
        )
        .await?;

        let mut thumbnail_embedded = false;
        if let Some(cover) = cover {
            info!(stage = %Stage::ThumbnailTagging, "embedding {}", cover.display());
            match tagging::embed_cover(
                &cfg.tools.ffmpeg,
                &staged,
                &cover,
                artifacts,
                cfg.timeouts.embed,
            )
            .await
            {
                Ok(()) => thumbnail_embedded = true,
                Err(e) => warn!("skipping cover art, keeping tagged file: {}", e),
            }
        }

        // Only a fully tagged file ever lands under the final name
        tagging::publish(&staged, &final_path).await?;

        match tagging::apply_release_mtime(&final_path, meta.release_date.as_deref()) {
            Ok(true) => info!("mtime set to release date {:?}", meta.release_date),
            Ok(false) => {}
            Err(e) => warn!("could not set mtime on {}: {}", final_path.display(), e),
        }

        Ok(DownloadOutcome {
            path: final_path,
            title: tags.title,
            artist: tags.artist,
            thumbnail_embedded,
            elapsed: started.elapsed(),
        })
    }

    /// `{download_dir}/{sanitized title}.mp3`
    pub fn final_path(&self, title: &str) -> PathBuf {
        self.config
            .download_dir
            .join(format!("{}.{}", file_stem_for(title), AUDIO_EXT))
    }
}

/// Title precedence: override, then fetched title, then `untitled`.
fn tag_set(request: &DownloadRequest, meta: &Metadata) -> TagSet {
    let title = request
        .title
        .clone()
        .or_else(|| meta.title.clone().filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| "untitled".to_string());
    TagSet {
        title,
        artist: meta.uploader.clone().filter(|a| !a.trim().is_empty()),
        year: meta.year(),
    }
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| PipelineError::DirectoryCreateFailed {
            path: path.to_path_buf(),
            source,
        })
}

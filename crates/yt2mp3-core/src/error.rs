//! Error taxonomy for the download-and-tag pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every way a request can fail between receiving a URL and finishing cleanup.
///
/// `ThumbnailEmbedFailed` is the only variant the pipeline swallows; it is
/// logged as a warning and the base-tagged file is kept.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported platform. Only YouTube and SoundCloud are supported: {0}")]
    UnsupportedPlatform(String),

    #[error("Metadata fetch timed out after {0}s")]
    MetadataTimeout(u64),

    #[error("Metadata fetch failed (exit code {}): {stderr}", fmt_code(.code))]
    MetadataFetchFailed { code: Option<i32>, stderr: String },

    #[error("Could not parse metadata: {0}")]
    MetadataParseError(String),

    #[error("Download failed after {attempts} attempt(s) (last exit code {})", fmt_code(.code))]
    DownloadFailed { attempts: usize, code: Option<i32> },

    #[error("Audio file missing after download: {}", .0.display())]
    AudioFileMissing(PathBuf),

    #[error("Thumbnail conversion failed: {0}")]
    ThumbnailConvertFailed(String),

    #[error("Thumbnail embedding failed: {0}")]
    ThumbnailEmbedFailed(String),

    #[error("Writing tags failed: {0}")]
    TaggingFailed(String),

    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Search failed (exit code {})", fmt_code(.code))]
    SearchFailed { code: Option<i32> },

    #[error("Search timed out after {0}s")]
    SearchTimeout(u64),

    #[error("Failed to run {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

fn fmt_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none".to_string(),
    }
}

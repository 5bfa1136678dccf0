//! Metadata lookup via `yt-dlp --dump-json`

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{PipelineError, Result};
use crate::process::{self, RunError};

/// Track metadata as reported by the extractor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    /// `YYYYMMDD`, when the extractor knows it
    #[serde(default)]
    pub release_date: Option<String>,
}

impl Metadata {
    /// Parse the JSON object printed by `--dump-json`. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json.trim()).map_err(|e| PipelineError::MetadataParseError(e.to_string()))
    }

    /// Release date as a calendar day; `None` for absent or malformed dates.
    pub fn release_day(&self) -> Option<NaiveDate> {
        parse_release_date(self.release_date.as_deref()?)
    }

    /// Four-digit year for the `date` tag.
    pub fn year(&self) -> Option<String> {
        self.release_day().map(|d| d.format("%Y").to_string())
    }
}

/// Parse an 8-digit `YYYYMMDD` date.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

/// Strip playlist context and tracking parameters.
///
/// YouTube keeps only `v`; SoundCloud loses its whole query string. Anything
/// that does not parse as a URL is passed through untouched.
pub fn clean_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.to_string();
    };
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

    if host.ends_with("youtube.com") || host.ends_with("youtu.be") {
        let video_id = url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned());
        url.set_query(None);
        if let Some(id) = video_id {
            url.query_pairs_mut().append_pair("v", &id);
        }
    } else if host.ends_with("soundcloud.com") {
        url.set_query(None);
    } else {
        return raw.to_string();
    }

    url.set_fragment(None);
    url.to_string()
}

/// Ask the extractor for title, uploader and release date.
pub async fn fetch_metadata(yt_dlp: &Path, url: &str, timeout: Duration) -> Result<Metadata> {
    let args = [
        "--quiet",
        "--no-warnings",
        "--skip-download",
        "--no-playlist",
        "--dump-json",
        url,
    ];

    let output = match process::run_captured(yt_dlp, args, timeout).await {
        Ok(output) => output,
        Err(RunError::TimedOut { after, .. }) => {
            return Err(PipelineError::MetadataTimeout(after.as_secs()))
        }
        Err(RunError::Spawn { program, source }) => {
            return Err(PipelineError::ToolSpawn {
                tool: program,
                source,
            })
        }
    };

    if !output.success() {
        return Err(PipelineError::MetadataFetchFailed {
            code: output.code(),
            stderr: output.stderr_tail(),
        });
    }

    // --dump-json prints one object per line; a stray playlist would give several
    let first = output.stdout.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let metadata = Metadata::from_json(first)?;
    debug!(
        "metadata: title={:?} uploader={:?} release_date={:?}",
        metadata.title, metadata.uploader, metadata.release_date
    );
    Ok(metadata)
}

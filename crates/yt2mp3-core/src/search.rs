//! YouTube search through yt-dlp's `ytsearchN:` pseudo-URLs

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::process::{self, RunError};

/// One hit from a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub uploader: String,
    pub url: String,
}

/// Search YouTube for `query`, returning at most `limit` results.
pub async fn search(
    yt_dlp: &Path,
    query: &str,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<SearchResult>> {
    let default_search = format!("ytsearch{}", limit.max(1));
    let args = [
        "--quiet",
        "--no-warnings",
        "--flat-playlist",
        "--skip-download",
        "--default-search",
        default_search.as_str(),
        "--print",
        "%(title)s\t%(uploader)s\t%(url)s",
        query,
    ];

    let output = match process::run_captured(yt_dlp, args, timeout).await {
        Ok(output) => output,
        Err(RunError::TimedOut { after, .. }) => {
            return Err(PipelineError::SearchTimeout(after.as_secs()))
        }
        Err(RunError::Spawn { program, source }) => {
            return Err(PipelineError::ToolSpawn {
                tool: program,
                source,
            })
        }
    };

    if !output.success() {
        return Err(PipelineError::SearchFailed {
            code: output.code(),
        });
    }

    let results = parse_search_output(&output.stdout);
    debug!("search {:?} returned {} result(s)", query, results.len());
    Ok(results)
}

/// Parse `title\tuploader\turl` lines. Lines without three fields are skipped.
pub fn parse_search_output(stdout: &str) -> Vec<SearchResult> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let title = parts.next()?;
            let uploader = parts.next()?;
            let url = parts.next()?.trim();
            if url.is_empty() {
                return None;
            }
            Some(SearchResult {
                title: title.to_string(),
                uploader: uploader.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

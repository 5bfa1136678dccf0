//! yt-dlp audio + thumbnail download with a declarative fallback list

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use super::artifacts::{TempArtifacts, AUDIO_EXT};
use super::cleanup;
use crate::error::{PipelineError, Result};
use crate::process::{self, RunError};
use crate::request::Platform;

const RETRY_ARGS: &[&str] = &[
    "--retries",
    "3",
    "--fragment-retries",
    "3",
    "--retry-sleep",
    "exp=1:8",
];

/// One way of invoking the extractor. Strategies are tried in order until one
/// succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadStrategy {
    pub name: &'static str,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Ordered attempts for a platform: the plain invocation, then a fallback
/// with a different client identity over IPv4.
pub fn strategies_for(platform: Platform, timeout: Duration) -> Vec<DownloadStrategy> {
    let base: Vec<String> = RETRY_ARGS.iter().map(|s| s.to_string()).collect();

    let mut fallback = base.clone();
    fallback.push("--force-ipv4".to_string());
    if platform == Platform::Youtube {
        fallback.push("--extractor-args".to_string());
        fallback.push("youtube:player_client=android,web".to_string());
    }

    vec![
        DownloadStrategy {
            name: "default",
            args: base,
            timeout,
        },
        DownloadStrategy {
            name: "fallback",
            args: fallback,
            timeout,
        },
    ]
}

/// Files the extractor left behind for a request
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub audio: PathBuf,
    pub thumbnail: Option<PathBuf>,
}

fn common_args(url: &str, artifacts: &TempArtifacts) -> Vec<String> {
    [
        "--no-playlist",
        "--extract-audio",
        "--audio-format",
        AUDIO_EXT,
        "--audio-quality",
        "0",
        "--write-thumbnail",
        "--no-progress",
        "--output",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain([artifacts.output_template(), url.to_string()])
    .collect()
}

/// Run the strategies in order until the extractor exits cleanly.
///
/// A clean exit without the expected audio file is `AudioFileMissing` and
/// ends the stage; only failed or timed-out runs move on to the next
/// strategy.
pub async fn download_audio(
    yt_dlp: &Path,
    url: &str,
    artifacts: &TempArtifacts,
    strategies: &[DownloadStrategy],
) -> Result<Downloaded> {
    let mut last_code = None;

    for (idx, strategy) in strategies.iter().enumerate() {
        let attempt = idx + 1;
        if attempt > 1 {
            cleanup::sweep(artifacts).await;
        }
        info!(
            "download attempt {}/{} ({})",
            attempt,
            strategies.len(),
            strategy.name
        );

        let mut args = strategy.args.clone();
        args.extend(common_args(url, artifacts));

        match process::run_logged(yt_dlp, &args, strategy.timeout).await {
            Ok(status) if status.success() => {
                let audio = artifacts.audio();
                if !tokio::fs::try_exists(&audio).await.unwrap_or(false) {
                    return Err(PipelineError::AudioFileMissing(audio));
                }
                let thumbnail = find_thumbnail(artifacts).await;
                info!(
                    "download complete: audio={} thumbnail={:?}",
                    audio.display(),
                    thumbnail
                );
                return Ok(Downloaded { audio, thumbnail });
            }
            Ok(status) => {
                warn!(
                    "attempt {} ({}) exited with status {:?}",
                    attempt,
                    strategy.name,
                    status.code()
                );
                last_code = status.code();
            }
            Err(e @ RunError::TimedOut { .. }) => {
                warn!("attempt {} ({}) failed: {}", attempt, strategy.name, e);
                last_code = None;
            }
            Err(RunError::Spawn { program, source }) => {
                return Err(PipelineError::ToolSpawn {
                    tool: program,
                    source,
                });
            }
        }
    }

    Err(PipelineError::DownloadFailed {
        attempts: strategies.len(),
        code: last_code,
    })
}

/// First thumbnail that exists, trying extensions in priority order.
pub async fn find_thumbnail(artifacts: &TempArtifacts) -> Option<PathBuf> {
    for candidate in artifacts.thumbnail_candidates() {
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestId;

    #[test]
    fn test_youtube_fallback_changes_client_and_forces_ipv4() {
        let strategies = strategies_for(Platform::Youtube, Duration::from_secs(300));
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].name, "default");
        assert!(!strategies[0].args.contains(&"--force-ipv4".to_string()));

        let fallback = &strategies[1].args;
        assert!(fallback.contains(&"--force-ipv4".to_string()));
        assert!(fallback.contains(&"youtube:player_client=android,web".to_string()));
        assert!(strategies.iter().all(|s| s.timeout == Duration::from_secs(300)));
    }

    #[test]
    fn test_soundcloud_fallback_has_no_youtube_args() {
        let strategies = strategies_for(Platform::Soundcloud, Duration::from_secs(10));
        assert!(!strategies[1].args.iter().any(|a| a.contains("youtube")));
        assert!(strategies[1].args.contains(&"--force-ipv4".to_string()));
    }

    #[test]
    fn test_common_args_end_with_template_and_url() {
        let id = RequestId::derive("https://youtu.be/x", None);
        let artifacts = TempArtifacts::new(Path::new("/tmp/w"), Path::new("/tmp/w"), &id);
        let args = common_args("https://youtu.be/x", &artifacts);
        assert_eq!(
            args[..9],
            [
                "--no-playlist",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
                "--write-thumbnail",
                "--no-progress",
                "--output",
            ]
        );
        assert_eq!(args[9], artifacts.output_template());
        assert_eq!(args[10], "https://youtu.be/x");
        assert_eq!(args.len(), 11);
    }

    #[tokio::test]
    async fn test_find_thumbnail_prefers_jpg() {
        let dir = tempfile::TempDir::new().unwrap();
        let id = RequestId::derive("https://youtu.be/x", None);
        let artifacts = TempArtifacts::new(dir.path(), dir.path(), &id);
        assert!(find_thumbnail(&artifacts).await.is_none());

        let candidates: Vec<PathBuf> = artifacts.thumbnail_candidates().collect();
        std::fs::write(&candidates[2], b"png").unwrap();
        std::fs::write(&candidates[1], b"webp").unwrap();
        assert_eq!(find_thumbnail(&artifacts).await, Some(candidates[1].clone()));

        std::fs::write(&candidates[0], b"jpg").unwrap();
        assert_eq!(find_thumbnail(&artifacts).await, Some(candidates[0].clone()));
    }
}

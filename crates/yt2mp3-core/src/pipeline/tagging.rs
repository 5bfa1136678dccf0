//! ffmpeg remux stages: cover conversion, base tags, cover embedding

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use super::artifacts::TempArtifacts;
use super::metadata::parse_release_date;
use crate::error::{PipelineError, Result};
use crate::process::{self, RunError};

/// Tags written into the final file
#[derive(Debug, Clone, PartialEq)]
pub struct TagSet {
    pub title: String,
    pub artist: Option<String>,
    pub year: Option<String>,
}

impl TagSet {
    fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-metadata".to_string(), format!("title={}", self.title)];
        if let Some(artist) = &self.artist {
            args.push("-metadata".to_string());
            args.push(format!("artist={artist}"));
        }
        if let Some(year) = &self.year {
            args.push("-metadata".to_string());
            args.push(format!("date={year}"));
        }
        args
    }
}

async fn run_ffmpeg(ffmpeg: &Path, args: &[String], timeout: Duration) -> std::result::Result<(), String> {
    let output = process::run_captured(ffmpeg, args, timeout)
        .await
        .map_err(|e: RunError| e.to_string())?;
    if output.success() {
        Ok(())
    } else {
        Err(format!(
            "ffmpeg exited with status {:?}: {}",
            output.code(),
            output.stderr_tail()
        ))
    }
}

/// Make sure the cover is a jpg, converting it when the extractor wrote
/// webp/png.
pub async fn prepare_cover(
    ffmpeg: &Path,
    thumbnail: &Path,
    artifacts: &TempArtifacts,
    timeout: Duration,
) -> Result<PathBuf> {
    let is_jpg = thumbnail
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg"));
    if is_jpg {
        return Ok(thumbnail.to_path_buf());
    }

    let converted = artifacts.converted_cover();
    debug!("converting cover {} -> {}", thumbnail.display(), converted.display());
    let args = vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        thumbnail.display().to_string(),
        converted.display().to_string(),
    ];
    run_ffmpeg(ffmpeg, &args, timeout)
        .await
        .map_err(PipelineError::ThumbnailConvertFailed)?;

    if !tokio::fs::try_exists(&converted).await.unwrap_or(false) {
        return Err(PipelineError::ThumbnailConvertFailed(format!(
            "ffmpeg produced no output at {}",
            converted.display()
        )));
    }
    Ok(converted)
}

/// Copy-codec remux of the downloaded audio into `output` with
/// title/artist/date tags.
///
/// `output` is a request-scoped staging file; [`publish`] moves it onto the
/// final name once every stage is through.
pub async fn write_base_tags(
    ffmpeg: &Path,
    audio: &Path,
    output: &Path,
    tags: &TagSet,
    timeout: Duration,
) -> Result<()> {
    let mut args = vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-map".to_string(),
        "0:a".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-id3v2_version".to_string(),
        "3".to_string(),
    ];
    args.extend(tags.ffmpeg_args());
    args.push(output.display().to_string());

    run_ffmpeg(ffmpeg, &args, timeout)
        .await
        .map_err(PipelineError::TaggingFailed)?;

    if !tokio::fs::try_exists(output).await.unwrap_or(false) {
        return Err(PipelineError::TaggingFailed(format!(
            "ffmpeg produced no output at {}",
            output.display()
        )));
    }
    debug!("tagged {}", output.display());
    Ok(())
}

/// Mux the cover into a scratch copy of `tagged` and swap it in.
///
/// On any failure `tagged` is left as it was and the scratch output is
/// removed.
pub async fn embed_cover(
    ffmpeg: &Path,
    tagged: &Path,
    cover: &Path,
    artifacts: &TempArtifacts,
    timeout: Duration,
) -> Result<()> {
    let scratch = artifacts.cover_mux_output();
    let args = vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        tagged.display().to_string(),
        "-i".to_string(),
        cover.display().to_string(),
        "-map".to_string(),
        "0:a".to_string(),
        "-map".to_string(),
        "1".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-id3v2_version".to_string(),
        "3".to_string(),
        "-metadata:s:v".to_string(),
        "title=Album cover".to_string(),
        "-metadata:s:v".to_string(),
        "comment=Cover (front)".to_string(),
        scratch.display().to_string(),
    ];

    let result = match run_ffmpeg(ffmpeg, &args, timeout).await {
        Ok(()) if tokio::fs::try_exists(&scratch).await.unwrap_or(false) => {
            tokio::fs::rename(&scratch, tagged)
                .await
                .map_err(|e| format!("could not replace {}: {}", tagged.display(), e))
        }
        Ok(()) => Err(format!("ffmpeg produced no output at {}", scratch.display())),
        Err(e) => Err(e),
    };

    if result.is_err() {
        let _ = tokio::fs::remove_file(&scratch).await;
    }
    result.map_err(PipelineError::ThumbnailEmbedFailed)
}

/// Move the finished staging file onto its final name, replacing any
/// earlier download of the same title.
pub async fn publish(staged: &Path, final_path: &Path) -> Result<()> {
    tokio::fs::rename(staged, final_path).await.map_err(|e| {
        PipelineError::TaggingFailed(format!(
            "could not move {} to {}: {}",
            staged.display(),
            final_path.display(),
            e
        ))
    })?;
    info!("saved {}", final_path.display());
    Ok(())
}

fn local_midnight(day: NaiveDate) -> Option<SystemTime> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    let local = midnight.and_local_timezone(Local).earliest()?;
    Some(SystemTime::from(local))
}

/// Set the file's mtime (and atime) to the release date at local midnight.
///
/// Returns `Ok(false)` without touching the file when the date is absent or
/// malformed.
pub fn apply_release_mtime(path: &Path, release_date: Option<&str>) -> std::io::Result<bool> {
    let Some(time) = release_date.and_then(parse_release_date).and_then(local_midnight) else {
        return Ok(false);
    };
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_times(std::fs::FileTimes::new().set_accessed(time).set_modified(time))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_args_skip_missing_fields() {
        let tags = TagSet {
            title: "Song".to_string(),
            artist: None,
            year: None,
        };
        assert_eq!(tags.ffmpeg_args(), ["-metadata", "title=Song"]);

        let tags = TagSet {
            title: "Song".to_string(),
            artist: Some("Band".to_string()),
            year: Some("2023".to_string()),
        };
        assert_eq!(
            tags.ffmpeg_args(),
            ["-metadata", "title=Song", "-metadata", "artist=Band", "-metadata", "date=2023"]
        );
    }

    #[test]
    fn test_release_mtime_is_local_midnight() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"audio").unwrap();

        assert!(apply_release_mtime(&path, Some("20230615")).unwrap());

        let expected = local_midnight(NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()).unwrap();
        let actual = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_release_mtime_untouched_for_bad_dates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"audio").unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        assert!(!apply_release_mtime(&path, None).unwrap());
        assert!(!apply_release_mtime(&path, Some("2023")).unwrap());
        assert!(!apply_release_mtime(&path, Some("2023-06-15")).unwrap());

        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_publish_replaces_previous_download() {
        let dir = tempfile::TempDir::new().unwrap();
        let staged = dir.path().join("yt2mp3-x.tagged.mp3");
        let final_path = dir.path().join("Song.mp3");
        std::fs::write(&staged, b"new").unwrap();
        std::fs::write(&final_path, b"old").unwrap();

        publish(&staged, &final_path).await.unwrap();

        assert_eq!(std::fs::read(&final_path).unwrap(), b"new");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_publish_missing_staged_file_is_tagging_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = publish(&dir.path().join("missing.mp3"), &dir.path().join("Song.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::TaggingFailed(_)), "{err}");
    }
}

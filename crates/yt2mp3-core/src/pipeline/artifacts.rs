//! Request-scoped temp file naming

use std::path::{Path, PathBuf};

use crate::request::RequestId;

/// Extension the extractor is asked to produce.
pub const AUDIO_EXT: &str = "mp3";

/// Thumbnail extensions the extractor may write, in the order they are tried.
pub const THUMBNAIL_EXTS: &[&str] = &["jpg", "webp", "png"];

const PREFIX: &str = "yt2mp3-";

/// Temp paths for one request. Every name starts with `yt2mp3-{id}`, which
/// is what the cleanup sweep matches on.
///
/// Extractor output lives in the work dir. The remux outputs are staged in
/// the output dir so they can be renamed onto the final file without
/// crossing filesystems.
#[derive(Debug, Clone)]
pub struct TempArtifacts {
    work_dir: PathBuf,
    output_dir: PathBuf,
    stem: String,
}

impl TempArtifacts {
    pub fn new(work_dir: &Path, output_dir: &Path, id: &RequestId) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            stem: format!("{PREFIX}{id}"),
        }
    }

    /// Directories that may hold this request's files, without duplicates.
    pub fn dirs(&self) -> Vec<&Path> {
        if self.work_dir == self.output_dir {
            vec![&self.work_dir]
        } else {
            vec![&self.work_dir, &self.output_dir]
        }
    }

    /// Prefix shared by every file this request creates.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// `--output` template handed to yt-dlp. A literal `%` in the directory
    /// is doubled so it isn't read as a template field.
    pub fn output_template(&self) -> String {
        let dir = self.work_dir.display().to_string().replace('%', "%%");
        format!("{}/{}.%(ext)s", dir, self.stem)
    }

    pub fn audio(&self) -> PathBuf {
        self.work_dir.join(format!("{}.{}", self.stem, AUDIO_EXT))
    }

    pub fn thumbnail_candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        THUMBNAIL_EXTS
            .iter()
            .map(move |ext| self.work_dir.join(format!("{}.{}", self.stem, ext)))
    }

    /// Thumbnail converted to jpg for embedding.
    pub fn converted_cover(&self) -> PathBuf {
        self.work_dir.join(format!("{}.cover.jpg", self.stem))
    }

    /// Tagged copy of the audio, renamed onto the final file once complete.
    pub fn staged_output(&self) -> PathBuf {
        self.output_dir.join(format!("{}.tagged.{}", self.stem, AUDIO_EXT))
    }

    /// Scratch output of the cover mux, renamed over the staged file on
    /// success.
    pub fn cover_mux_output(&self) -> PathBuf {
        self.output_dir.join(format!("{}.withcover.{}", self.stem, AUDIO_EXT))
    }

    /// Every exact path this request may create.
    pub fn known_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.audio()];
        paths.extend(self.thumbnail_candidates());
        paths.push(self.converted_cover());
        paths.push(self.staged_output());
        paths.push(self.cover_mux_output());
        paths
    }

    /// Glob-style `yt2mp3-{id}*` match on a bare file name.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.stem)
    }
}

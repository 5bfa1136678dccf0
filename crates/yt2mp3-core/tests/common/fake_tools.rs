#![allow(dead_code)]

//! Stand-in `yt-dlp` and `ffmpeg` shell scripts for driving the pipeline
//! without network access or real media tools.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use yt2mp3_core::pipeline::{PipelineConfig, Timeouts, Tools};
use yt2mp3_core::Pipeline;

pub const SONG_JSON: &str =
    r#"{"id":"abc123","title":"My: Song","uploader":"Uploader","release_date":"20230615"}"#;

/// How the fake metadata call behaves
#[derive(Debug, Clone)]
pub enum MetaMode {
    Json(String),
    Fail(i32),
    Garbage,
    Hang,
}

/// Behaviour switches for the fake extractor
#[derive(Debug, Clone)]
pub struct FakeYtDlp {
    pub meta: MetaMode,
    /// Exit 1 on the first (non-IPv4) strategy
    pub fail_default: bool,
    /// Exit 2 on every strategy
    pub fail_all: bool,
    /// Leave a partial file and sleep on every download attempt
    pub hang_download: bool,
    pub write_audio: bool,
    pub thumbnail_ext: Option<&'static str>,
}

impl Default for FakeYtDlp {
    fn default() -> Self {
        Self {
            meta: MetaMode::Json(SONG_JSON.to_string()),
            fail_default: false,
            fail_all: false,
            hang_download: false,
            write_audio: true,
            thumbnail_ext: Some("webp"),
        }
    }
}

/// Behaviour switches for the fake transcoder
#[derive(Debug, Clone, Default)]
pub struct FakeFfmpeg {
    pub fail_convert: bool,
    /// Write a truncated file to the base-tag output, then exit 1
    pub fail_tag: bool,
    pub fail_embed: bool,
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

fn yt_dlp_script(cfg: &FakeYtDlp, log: &Path) -> String {
    let meta = match &cfg.meta {
        MetaMode::Json(json) => format!("cat <<'JSON'\n{json}\nJSON\nexit 0"),
        MetaMode::Fail(code) => format!("echo 'ERROR: Video unavailable' >&2\nexit {code}"),
        MetaMode::Garbage => "echo 'this is not json'\nexit 0".to_string(),
        MetaMode::Hang => "sleep 5\nexit 0".to_string(),
    };
    format!(
        r#"#!/bin/sh
out=""
mode=download
fallback=0
prev=""
last=""
for a in "$@"; do
  case "$a" in
    --dump-json) mode=meta ;;
    --force-ipv4) fallback=1 ;;
  esac
  if [ "$prev" = "--output" ]; then out="$a"; fi
  prev="$a"
  last="$a"
done
echo "$mode fallback=$fallback url=$last" >> "{log}"
if [ "$mode" = meta ]; then
{meta}
fi
base="${{out%'.%(ext)s'}}"
if [ {hang_download} = 1 ]; then
  printf 'partial' > "$base.webm.part"
  exec sleep 5
fi
if [ {fail_all} = 1 ]; then
  printf 'partial' > "$base.webm.part"
  echo 'ERROR: giving up' >&2
  exit 2
fi
if [ "$fallback" = 0 ] && [ {fail_default} = 1 ]; then
  printf 'partial' > "$base.webm.part"
  echo 'ERROR: HTTP Error 403: Forbidden' >&2
  exit 1
fi
if [ {write_audio} = 1 ]; then
  printf 'ID3audio' > "$base.mp3"
fi
if [ -n "{thumb}" ]; then
  printf 'img' > "$base.{thumb}"
fi
exit 0
"#,
        log = log.display(),
        meta = meta,
        fail_all = flag(cfg.fail_all),
        hang_download = flag(cfg.hang_download),
        fail_default = flag(cfg.fail_default),
        write_audio = flag(cfg.write_audio),
        thumb = cfg.thumbnail_ext.unwrap_or(""),
    )
}

fn ffmpeg_script(cfg: &FakeFfmpeg, log: &Path) -> String {
    format!(
        r#"#!/bin/sh
echo "$*" >> "{log}"
inputs=0
first=""
prev=""
last=""
for a in "$@"; do
  if [ "$prev" = "-i" ]; then
    inputs=$((inputs + 1))
    if [ "$inputs" = 1 ]; then first="$a"; fi
  fi
  prev="$a"
  last="$a"
done
case "$first" in
  *.webp|*.png)
    if [ {fail_convert} = 1 ]; then echo 'Invalid data found' >&2; exit 1; fi
    cp "$first" "$last"
    exit 0
    ;;
esac
if [ "$inputs" = 2 ]; then
  if [ {fail_embed} = 1 ]; then
    printf 'partial' > "$last"
    echo 'Could not write header' >&2
    exit 1
  fi
  cat "$first" > "$last"
  printf 'COVER' >> "$last"
  exit 0
fi
if [ {fail_tag} = 1 ]; then
  printf 'trunc' > "$last"
  echo 'Error writing trailer' >&2
  exit 1
fi
cat "$first" > "$last"
printf 'TAGGED' >> "$last"
exit 0
"#,
        log = log.display(),
        fail_convert = flag(cfg.fail_convert),
        fail_tag = flag(cfg.fail_tag),
        fail_embed = flag(cfg.fail_embed),
    )
}

/// A scratch world: fake tools, a work dir and a download dir.
pub struct Sandbox {
    pub root: TempDir,
    /// Work dir kept outside `root`, possibly on another filesystem
    pub separate_work: Option<TempDir>,
    pub tools: Tools,
    pub yt_dlp_log: PathBuf,
    pub ffmpeg_log: PathBuf,
}

impl Sandbox {
    pub fn new(yt_dlp: FakeYtDlp, ffmpeg: FakeFfmpeg) -> Self {
        let root = TempDir::new().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin).unwrap();

        let yt_dlp_log = root.path().join("yt-dlp.log");
        let ffmpeg_log = root.path().join("ffmpeg.log");
        let yt_dlp_path = bin.join("yt-dlp");
        let ffmpeg_path = bin.join("ffmpeg");
        write_script(&yt_dlp_path, &yt_dlp_script(&yt_dlp, &yt_dlp_log));
        write_script(&ffmpeg_path, &ffmpeg_script(&ffmpeg, &ffmpeg_log));

        Self {
            root,
            separate_work: None,
            tools: Tools {
                yt_dlp: yt_dlp_path,
                ffmpeg: ffmpeg_path,
            },
            yt_dlp_log,
            ffmpeg_log,
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.path().join("downloads")
    }

    pub fn work_dir(&self) -> PathBuf {
        match &self.separate_work {
            Some(dir) => dir.path().to_path_buf(),
            None => self.root.path().join("work"),
        }
    }

    /// Move the work dir to tmpfs when the host has one, so the work and
    /// download dirs sit on different filesystems.
    pub fn with_work_dir_on_other_fs(mut self) -> Self {
        let shm = Path::new("/dev/shm");
        let dir = if shm.is_dir() {
            TempDir::new_in(shm).unwrap()
        } else {
            TempDir::new().unwrap()
        };
        self.separate_work = Some(dir);
        self
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with(Timeouts::default())
    }

    pub fn pipeline_with(&self, timeouts: Timeouts) -> Pipeline {
        Pipeline::new(PipelineConfig {
            download_dir: self.download_dir(),
            work_dir: self.work_dir(),
            tools: self.tools.clone(),
            timeouts,
        })
    }

    pub fn short_metadata_timeout() -> Timeouts {
        Timeouts {
            metadata: Duration::from_millis(300),
            ..Timeouts::default()
        }
    }

    pub fn short_download_timeout() -> Timeouts {
        Timeouts {
            download: Duration::from_millis(300),
            ..Timeouts::default()
        }
    }

    pub fn yt_dlp_calls(&self) -> Vec<String> {
        read_lines(&self.yt_dlp_log)
    }

    pub fn ffmpeg_calls(&self) -> Vec<String> {
        read_lines(&self.ffmpeg_log)
    }

    /// Names of `yt2mp3-*` files still in the work or download dir.
    pub fn leftover_temp_files(&self) -> Vec<String> {
        [self.work_dir(), self.download_dir()]
            .iter()
            .filter_map(|dir| fs::read_dir(dir).ok())
            .flat_map(|entries| entries.flatten())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("yt2mp3-"))
            .collect()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

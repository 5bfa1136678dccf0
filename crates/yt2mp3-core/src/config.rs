use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;
use crate::pipeline::{PipelineConfig, Timeouts, Tools};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// User-configurable paths for downloads, temp files and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory finished files land in.
    /// Defaults to `~/Documents/Spotify`.
    #[serde(default = "platform::downloads_dir")]
    pub downloads_dir: PathBuf,
    /// Directory for request-scoped temp files. Falls back to
    /// `downloads_dir` so the final rename stays on one filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    #[serde(default = "default_server_log")]
    pub server_log: PathBuf,
    #[serde(default = "default_cli_log")]
    pub cli_log: PathBuf,
}

/// Explicit tool locations; unset entries are discovered at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yt_dlp: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_metadata_secs")]
    pub metadata_secs: u64,
    #[serde(default = "default_search_secs")]
    pub search_secs: u64,
    #[serde(default = "default_download_secs")]
    pub download_secs: u64,
    #[serde(default = "default_convert_secs")]
    pub convert_secs: u64,
    #[serde(default = "default_tag_secs")]
    pub tag_secs: u64,
    #[serde(default = "default_embed_secs")]
    pub embed_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_results")]
    pub results: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: platform::downloads_dir(),
            work_dir: None,
            server_log: default_server_log(),
            cli_log: default_cli_log(),
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            metadata_secs: default_metadata_secs(),
            search_secs: default_search_secs(),
            download_secs: default_download_secs(),
            convert_secs: default_convert_secs(),
            tag_secs: default_tag_secs(),
            embed_secs: default_embed_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results: default_search_results(),
        }
    }
}

fn default_bind_address() -> String {
    platform::DEFAULT_SERVER_HOST.to_string()
}

fn default_port() -> u16 {
    platform::DEFAULT_SERVER_PORT
}

fn default_server_log() -> PathBuf {
    platform::temp_dir().join("yt2mp3-server.log")
}

fn default_cli_log() -> PathBuf {
    platform::data_dir().join("cli.log")
}

fn default_metadata_secs() -> u64 {
    45
}

fn default_search_secs() -> u64 {
    30
}

fn default_download_secs() -> u64 {
    300
}

fn default_convert_secs() -> u64 {
    30
}

fn default_tag_secs() -> u64 {
    60
}

fn default_embed_secs() -> u64 {
    60
}

fn default_search_results() -> usize {
    10
}

impl TimeoutsConfig {
    pub fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            metadata: Duration::from_secs(self.metadata_secs),
            search: Duration::from_secs(self.search_secs),
            download: Duration::from_secs(self.download_secs),
            convert: Duration::from_secs(self.convert_secs),
            tag: Duration::from_secs(self.tag_secs),
            embed: Duration::from_secs(self.embed_secs),
        }
    }
}

impl ToolsConfig {
    /// Resolve tool paths: explicit config first, then discovery, then the
    /// bare program name so the OS can still find it on PATH at spawn time.
    pub fn resolve(&self) -> Tools {
        Tools {
            yt_dlp: self
                .yt_dlp
                .clone()
                .or_else(platform::find_yt_dlp_binary)
                .unwrap_or_else(|| PathBuf::from("yt-dlp")),
            ffmpeg: self
                .ffmpeg
                .clone()
                .or_else(platform::find_ffmpeg_binary)
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
        }
    }
}

impl Config {
    /// Load from the default location, writing a default file on first run.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path; missing keys take their defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.paths
            .work_dir
            .clone()
            .unwrap_or_else(|| self.paths.downloads_dir.clone())
    }

    /// Turn the file config into the explicit settings the pipeline runs on.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            download_dir: self.paths.downloads_dir.clone(),
            work_dir: self.work_dir(),
            tools: self.tools.resolve(),
            timeouts: self.timeouts.to_timeouts(),
        }
    }
}

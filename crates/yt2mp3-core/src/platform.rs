use std::path::PathBuf;

pub const DEFAULT_SERVER_PORT: u16 = 5000;
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/yt2mp3/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("yt2mp3")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yt2mp3")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("yt2mp3")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yt2mp3")
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Where finished downloads land unless the config says otherwise.
pub fn downloads_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("Spotify")
}

#[cfg(unix)]
fn ffmpeg_binary_names() -> &'static [&'static str] {
    &["ffmpeg"]
}

#[cfg(windows)]
fn ffmpeg_binary_names() -> &'static [&'static str] {
    &["ffmpeg.exe", "ffmpeg"]
}

#[cfg(unix)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp", "yt-dlp_linux", "yt-dlp_macos"]
}

#[cfg(windows)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp.exe", "yt-dlp"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("external").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for name in names {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

fn find_from_env(var: &str) -> Option<PathBuf> {
    let p = PathBuf::from(std::env::var_os(var)?);
    p.exists().then_some(p)
}

/// Find the ffmpeg binary used for cover conversion and remuxing.
///
/// Searches in order:
/// 1. FFMPEG_PATH environment variable
/// 2. Beside current executable (or its `external/` folder)
/// 3. PATH
pub fn find_ffmpeg_binary() -> Option<PathBuf> {
    find_from_env("FFMPEG_PATH")
        .or_else(|| find_beside_exe(ffmpeg_binary_names()))
        .or_else(|| find_on_path(ffmpeg_binary_names()))
}

/// Find yt-dlp binary for metadata, search and audio extraction.
///
/// Searches in order:
/// 1. YT_DLP_PATH environment variable
/// 2. Beside current executable (or its `external/` folder)
/// 3. PATH
pub fn find_yt_dlp_binary() -> Option<PathBuf> {
    find_from_env("YT_DLP_PATH")
        .or_else(|| find_beside_exe(yt_dlp_binary_names()))
        .or_else(|| find_on_path(yt_dlp_binary_names()))
}

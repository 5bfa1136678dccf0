//! Temp file removal for a finished (or failed) request

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use super::artifacts::TempArtifacts;

/// Remove every temp file the request may have created.
///
/// Known paths go first, then a `yt2mp3-{id}*` sweep of the work and output
/// directories catches partial artifacts from failed attempts (`.part`, `.ytdl`, odd
/// thumbnail extensions). Never fails; problems are logged.
pub async fn cleanup(artifacts: &TempArtifacts) -> usize {
    let mut removed = 0;
    for path in artifacts.known_paths() {
        if remove_if_present(&path).await {
            removed += 1;
        }
    }
    removed += sweep(artifacts).await;
    debug!("cleanup removed {} file(s)", removed);
    removed
}

/// Remove files whose name matches the request prefix from every directory
/// the request writes to.
pub async fn sweep(artifacts: &TempArtifacts) -> usize {
    let mut removed = 0;
    for dir in artifacts.dirs() {
        removed += sweep_dir(dir, artifacts).await;
    }
    removed
}

async fn sweep_dir(dir: &Path, artifacts: &TempArtifacts) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                warn!("cleanup: cannot read {}: {}", dir.display(), e);
            }
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("cleanup: error while listing {}: {}", dir.display(), e);
                break;
            }
        };
        let name = entry.file_name();
        if !artifacts.matches(&name.to_string_lossy()) {
            continue;
        }
        if remove_if_present(&entry.path()).await {
            removed += 1;
        }
    }
    removed
}

async fn remove_if_present(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("removed {}", path.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!("cleanup: failed to remove {}: {}", path.display(), e);
            false
        }
    }
}

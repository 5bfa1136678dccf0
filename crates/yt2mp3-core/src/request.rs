//! Request model: platform detection and request ids

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Source platform of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Soundcloud,
}

impl Platform {
    /// Identify the platform by substring match on the URL.
    pub fn detect(url: &str) -> Result<Self> {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            Ok(Platform::Youtube)
        } else if url.contains("soundcloud.com") {
            Ok(Platform::Soundcloud)
        } else {
            Err(PipelineError::UnsupportedPlatform(url.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Soundcloud => "soundcloud",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque token scoping temp filenames and log lines to one in-flight request.
///
/// Only ever contains `[0-9a-f_]`, so it is safe inside file names and as a
/// prefix match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Hash of the url and title plus a random nonce, so two identical
    /// requests in flight at once still get separate temp files.
    pub fn derive(url: &str, title: Option<&str>) -> Self {
        let nonce: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
        Self(format!(
            "{:016x}_{:08x}{:06x}",
            hash_str(url),
            hash_str(title.unwrap_or("notitle")) as u32,
            nonce
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// One download job as it enters the pipeline
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// User-supplied title; wins over the fetched one.
    pub title: Option<String>,
    pub platform: Platform,
    pub id: RequestId,
}

impl DownloadRequest {
    /// Validate the URL's platform and assign a fresh request id.
    ///
    /// A blank title is treated the same as no title.
    pub fn new(url: impl Into<String>, title: Option<String>) -> Result<Self> {
        let url = url.into();
        let id = RequestId::derive(url.trim(), title.as_deref());
        Self::with_id(url, title, id)
    }

    /// Same as [`DownloadRequest::new`] with an id the caller already logged
    /// under.
    pub fn with_id(url: impl Into<String>, title: Option<String>, id: RequestId) -> Result<Self> {
        let url = url.into().trim().to_string();
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let platform = Platform::detect(&url)?;
        Ok(Self {
            url,
            title,
            platform,
            id,
        })
    }
}

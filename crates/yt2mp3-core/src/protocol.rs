use serde::{Deserialize, Serialize};

/// Body of `POST /download`, as sent by the browser extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadBody {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Reply to `POST /download`. Always sent with HTTP 200; `status` carries
/// the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadReply {
    Success { message: String },
    Error { reason: String },
}

impl DownloadReply {
    pub fn success(message: impl Into<String>) -> Self {
        DownloadReply::Success {
            message: message.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        DownloadReply::Error {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadReply::Success { .. })
    }
}

/// Reply to `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthReply {
    pub status: String,
}

impl HealthReply {
    pub fn online() -> Self {
        Self {
            status: "online".to_string(),
        }
    }
}

//! Core of yt2mp3: configuration, the download-and-tag pipeline, search, and
//! the wire types shared by the CLI and the HTTP server.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod protocol;
pub mod request;
pub mod sanitize;
pub mod search;

pub use error::{PipelineError, Result};
pub use pipeline::{DownloadOutcome, Pipeline, PipelineConfig};
pub use request::{DownloadRequest, Platform, RequestId};

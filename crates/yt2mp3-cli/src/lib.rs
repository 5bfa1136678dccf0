//! Shared plumbing for the `yt2mp3` and `yt2mp3-get` binaries.

pub mod prompt;
pub mod session;

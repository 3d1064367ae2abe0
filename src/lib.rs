//! Tubegram - a Telegram bot that turns YouTube links into audio or
//! audio+video files.
//!
//! This library wires a teloxide-based transport to a download pipeline that
//! delegates stream extraction to yt-dlp and audio/video muxing to ffmpeg.

pub mod bot;
pub mod config;
pub mod download;
pub mod provider;
pub mod utils;

pub use config::Config;
pub use download::{DownloadPipeline, DownloadedArtifact};
pub use provider::{BitratePolicy, StreamDescriptor, StreamManifest, StreamProvider};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error taxonomy for the download pipeline
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Stream manifest unavailable for {0}")]
    ManifestUnavailable(String),

    #[error("No audio stream found in manifest")]
    NoAudioStream,

    #[error("No video stream with quality label {0:?}")]
    NoMatchingVideoStream(String),

    #[error("Merge executable could not be started: {0}")]
    MergerUnavailable(String),

    #[error("Merge process exited with status {0}")]
    MergeFailed(i32),

    #[error("Invalid link: {0}")]
    InvalidLink(String),
}

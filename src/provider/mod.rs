use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod ytdlp;

use crate::Result;

/// Kind of track a stream descriptor points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    Audio,
    Video,
}

/// Metadata handle identifying one retrievable track without its bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Audio or video track
    pub kind: StreamKind,

    /// Bitrate in kbit/s
    pub bitrate: u64,

    /// Quality label such as "480p" (video streams only)
    pub quality_label: Option<String>,

    /// Direct media URL for the track
    pub url: String,
}

/// Full set of stream descriptors available for one source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamManifest {
    pub streams: Vec<StreamDescriptor>,
}

impl StreamManifest {
    /// Audio-only streams in manifest order
    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.kind == StreamKind::Audio)
    }

    /// Video streams in manifest order
    pub fn video_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.kind == StreamKind::Video)
    }
}

/// Source-level metadata used to classify a request
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub duration: Duration,
}

/// Audio bitrate preference for stream selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitratePolicy {
    Highest,
    Lowest,
}

/// Collaborator that resolves a source URL into streams and fetches them.
///
/// Constructed once and passed in explicitly so tests can substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Resolve title and duration for a source URL
    async fn video_metadata(&self, url: &str) -> Result<VideoMetadata>;

    /// Fetch the full stream manifest for a source URL
    async fn fetch_manifest(&self, url: &str) -> Result<StreamManifest>;

    /// Download one stream to `dest`, overwriting any existing file.
    /// The token is polled between chunks; cancellation stops the transfer.
    async fn fetch_stream(
        &self,
        descriptor: &StreamDescriptor,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

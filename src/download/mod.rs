use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod merge;
pub mod select;

use crate::config::Config;
use crate::provider::{StreamProvider, VideoMetadata};
use crate::utils;
use crate::Result;
use merge::Merger;
use select::select_streams;

/// What the user asked to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFormat {
    AudioOnly,
    AudioVideo,
}

/// One parsed user request, dropped once the pipeline completes
#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub source_url: String,
    pub format: DeliveryFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Audio,
    Video,
    Merged,
}

/// A local file produced by the pipeline for one request
#[derive(Debug, Clone)]
pub struct DownloadedArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// Drives one request through selection, fetching and merging.
///
/// Files are keyed by an id derived from the source URL: `<id>_aud.mp4` and
/// `<id>_vid.mp4` are transient, `<id>.mp4` is the final merged file and is
/// kept on disk as a never-evicted cache. The exists-check on the final path
/// is not locked; two concurrent requests for the same source can race on it
/// (accepted, per-request isolation).
pub struct DownloadPipeline {
    provider: Arc<dyn StreamProvider>,
    merger: Merger,
    media_dir: PathBuf,
    config: Config,
}

impl DownloadPipeline {
    pub fn new(config: Config, provider: Arc<dyn StreamProvider>) -> Self {
        Self {
            provider,
            merger: Merger::new(config.media.ffmpeg_path.clone()),
            media_dir: config.media.local_path.clone(),
            config,
        }
    }

    /// Resolve source metadata for request classification
    pub async fn video_metadata(&self, url: &str) -> Result<VideoMetadata> {
        self.provider.video_metadata(url).await
    }

    /// Whether a source of this duration is offered the audio+video choice
    pub fn offers_format_choice(&self, duration: std::time::Duration) -> bool {
        duration <= self.config.combined_threshold()
    }

    /// Duration threshold for the audio+video choice, for user-facing text
    pub fn combined_threshold(&self) -> std::time::Duration {
        self.config.combined_threshold()
    }

    /// Run one request to completion and return the produced artifact
    pub async fn run(
        &self,
        request: &MediaRequest,
        cancel: &CancellationToken,
    ) -> Result<DownloadedArtifact> {
        let id = utils::video_id(&request.source_url)?;
        let want_video = request.format == DeliveryFormat::AudioVideo;

        tracing::info!("Downloading {} (video: {})", request.source_url, want_video);

        let manifest = self.provider.fetch_manifest(&request.source_url).await?;
        let selection = select_streams(
            &manifest,
            want_video,
            self.config.download.bitrate_policy,
            &self.config.download.target_quality_label,
        )?;

        let audio_path = self.media_dir.join(format!("{}_aud.mp4", id));
        self.provider
            .fetch_stream(&selection.audio, &audio_path, cancel)
            .await?;

        let Some(video_stream) = selection.video else {
            return Ok(DownloadedArtifact {
                path: audio_path,
                kind: ArtifactKind::Audio,
            });
        };

        let video_path = self.media_dir.join(format!("{}_vid.mp4", id));
        self.provider
            .fetch_stream(&video_stream, &video_path, cancel)
            .await?;

        let final_path = self.media_dir.join(format!("{}.mp4", id));

        // Merge is skipped when a previous request already produced the
        // file; the fresh intermediates are left in place in that case.
        if final_path.exists() {
            tracing::info!("Reusing existing merged file {}", final_path.display());
            return Ok(DownloadedArtifact {
                path: final_path,
                kind: ArtifactKind::Merged,
            });
        }

        self.merger
            .merge(&audio_path, &video_path, &final_path)
            .await?;

        fs_err::remove_file(&audio_path)?;
        fs_err::remove_file(&video_path)?;

        Ok(DownloadedArtifact {
            path: final_path,
            kind: ArtifactKind::Merged,
        })
    }
}

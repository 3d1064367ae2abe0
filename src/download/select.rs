use crate::provider::{BitratePolicy, StreamDescriptor, StreamManifest};
use crate::{PipelineError, Result};

/// One audio stream and, when requested, one video stream picked from a
/// manifest.
#[derive(Debug, Clone)]
pub struct Selection {
    pub audio: StreamDescriptor,
    pub video: Option<StreamDescriptor>,
}

/// Pick streams from a manifest.
///
/// Audio: highest or lowest bitrate among audio-only streams per `policy`.
/// Video: the first stream whose quality label equals `target_label`
/// exactly. There is deliberately no nearest-quality fallback; sources
/// without the exact label fail.
pub fn select_streams(
    manifest: &StreamManifest,
    want_video: bool,
    policy: BitratePolicy,
    target_label: &str,
) -> Result<Selection> {
    let audio = match policy {
        BitratePolicy::Highest => manifest.audio_streams().max_by_key(|s| s.bitrate),
        BitratePolicy::Lowest => manifest.audio_streams().min_by_key(|s| s.bitrate),
    }
    .cloned()
    .ok_or(PipelineError::NoAudioStream)?;

    let video = if want_video {
        let stream = manifest
            .video_streams()
            .find(|s| s.quality_label.as_deref() == Some(target_label))
            .cloned()
            .ok_or_else(|| PipelineError::NoMatchingVideoStream(target_label.to_string()))?;
        Some(stream)
    } else {
        None
    };

    Ok(Selection { audio, video })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StreamKind;

    fn audio(bitrate: u64) -> StreamDescriptor {
        StreamDescriptor {
            kind: StreamKind::Audio,
            bitrate,
            quality_label: None,
            url: format!("https://cdn.example.com/a{}", bitrate),
        }
    }

    fn video(label: &str) -> StreamDescriptor {
        StreamDescriptor {
            kind: StreamKind::Video,
            bitrate: 700,
            quality_label: Some(label.to_string()),
            url: format!("https://cdn.example.com/v{}", label),
        }
    }

    fn manifest(streams: Vec<StreamDescriptor>) -> StreamManifest {
        StreamManifest { streams }
    }

    #[test]
    fn highest_policy_picks_max_bitrate() {
        let m = manifest(vec![audio(96), audio(160), audio(128)]);
        let selection = select_streams(&m, false, BitratePolicy::Highest, "480p").unwrap();
        assert_eq!(selection.audio.bitrate, 160);
        assert!(selection.video.is_none());
    }

    #[test]
    fn lowest_policy_picks_min_bitrate() {
        let m = manifest(vec![audio(96), audio(160), audio(128)]);
        let selection = select_streams(&m, false, BitratePolicy::Lowest, "480p").unwrap();
        assert_eq!(selection.audio.bitrate, 96);
    }

    #[test]
    fn missing_audio_fails() {
        let m = manifest(vec![video("480p")]);
        let err = select_streams(&m, false, BitratePolicy::Highest, "480p").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoAudioStream)
        ));
    }

    #[test]
    fn video_label_match_is_exact() {
        let m = manifest(vec![audio(128), video("720p"), video("480p60")]);
        let err = select_streams(&m, true, BitratePolicy::Highest, "480p").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoMatchingVideoStream(label)) if label == "480p"
        ));
    }

    #[test]
    fn first_matching_video_is_taken() {
        let m = manifest(vec![audio(128), video("480p"), video("480p")]);
        let selection = select_streams(&m, true, BitratePolicy::Highest, "480p").unwrap();
        let video = selection.video.unwrap();
        assert_eq!(video.quality_label.as_deref(), Some("480p"));
        assert_eq!(video.url, "https://cdn.example.com/v480p");
    }

    #[test]
    fn audio_only_ignores_missing_video() {
        let m = manifest(vec![audio(128)]);
        assert!(select_streams(&m, false, BitratePolicy::Highest, "480p").is_ok());
    }
}

use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::{PipelineError, Result};

/// Combines a downloaded audio track and video track into one container
/// file by invoking an external ffmpeg executable.
pub struct Merger {
    ffmpeg_path: String,
}

impl Merger {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Mux `audio` and `video` into `output`: video stream copied as-is,
    /// audio re-encoded to AAC.
    ///
    /// Both child pipes are drained on independent tasks until EOF and
    /// joined before the exit wait. Skipping either drain can block the
    /// child forever on a full pipe.
    pub async fn merge(&self, audio: &Path, video: &Path, output: &Path) -> Result<()> {
        tracing::info!(
            "Merging {} + {} -> {}",
            video.display(),
            audio.display(),
            output.display()
        );

        let mut child = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy", "-c:a", "aac", "-strict", "experimental"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::MergerUnavailable(e.to_string()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let out_task = tokio::spawn(drain_lines(stdout, "stdout"));
        let err_task = tokio::spawn(drain_lines(stderr, "stderr"));

        let (out_res, err_res) = tokio::join!(out_task, err_task);
        out_res?;
        err_res?;

        let status = child.wait().await?;

        if !status.success() {
            return Err(PipelineError::MergeFailed(status.code().unwrap_or(-1)).into());
        }

        Ok(())
    }
}

/// Read a child pipe to EOF, logging each line at trace level.
async fn drain_lines<R>(pipe: Option<R>, name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(pipe) = pipe else { return };

    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::trace!("ffmpeg {}: {}", name, line),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("ffmpeg {} read error: {}", name, e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dummy_paths() -> (PathBuf, PathBuf, PathBuf) {
        (
            PathBuf::from("a.mp4"),
            PathBuf::from("v.mp4"),
            PathBuf::from("out.mp4"),
        )
    }

    #[tokio::test]
    async fn missing_executable_is_merger_unavailable() {
        let merger = Merger::new("/nonexistent/ffmpeg-binary");
        let (a, v, o) = dummy_paths();
        let err = merger.merge(&a, &v, &o).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MergerUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn nonzero_exit_is_merge_failed() {
        // `false` ignores its arguments and exits 1
        let merger = Merger::new("false");
        let (a, v, o) = dummy_paths();
        let err = merger.merge(&a, &v, &o).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MergeFailed(1))
        ));
    }

    #[tokio::test]
    async fn zero_exit_is_ok() {
        let merger = Merger::new("true");
        let (a, v, o) = dummy_paths();
        assert!(merger.merge(&a, &v, &o).await.is_ok());
    }
}

use anyhow::Result;
use url::Url;

use crate::PipelineError;

/// Validate a URL and return normalized version
pub fn validate_and_normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| PipelineError::InvalidLink(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PipelineError::InvalidLink(url.to_string()).into());
    }

    Ok(parsed.to_string())
}

/// Derive the local file id for a source URL from its query parameters.
///
/// Prefers the `v` parameter (YouTube watch URLs); falls back to the first
/// query value so share links with a different key still resolve.
pub fn video_id(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| PipelineError::InvalidLink(url.to_string()))?;

    if let Some((_, value)) = parsed.query_pairs().find(|(key, _)| key == "v") {
        if !value.is_empty() {
            return Ok(value.into_owned());
        }
    }

    if let Some((_, value)) = parsed.query_pairs().next() {
        if !value.is_empty() {
            return Ok(value.into_owned());
        }
    }

    Err(PipelineError::InvalidLink(url.to_string()).into())
}

/// Format a duration as whole minutes for user-facing text
pub fn format_minutes(duration: std::time::Duration) -> String {
    let minutes = duration.as_secs() / 60;
    format!("{} minutes", minutes)
}

/// Check if the current environment has required tools
pub async fn check_dependencies(ffmpeg_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available("yt-dlp").await {
        missing.push("yt-dlp - required for stream extraction".to_string());
    }

    if !check_command_available(ffmpeg_path).await {
        missing.push(format!("{} - required for audio/video merging", ffmpeg_path));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_and_normalize_url() {
        assert!(validate_and_normalize_url("https://example.com").is_ok());
        assert!(validate_and_normalize_url("http://example.com").is_ok());
        assert!(validate_and_normalize_url("ftp://example.com").is_err());
        assert!(validate_and_normalize_url("not-a-url").is_err());
    }

    #[test]
    fn test_video_id_from_watch_url() {
        assert_eq!(
            video_id("https://example.com/watch?v=abc123").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_video_id_prefers_v_parameter() {
        assert_eq!(
            video_id("https://example.com/watch?list=xyz&v=abc123").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_video_id_falls_back_to_first_query_value() {
        assert_eq!(
            video_id("https://example.com/watch?clip=qq11").unwrap(),
            "qq11"
        );
    }

    #[test]
    fn test_video_id_rejects_urls_without_query() {
        assert!(video_id("https://example.com/watch").is_err());
        assert!(video_id("nonsense").is_err());
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(std::time::Duration::from_secs(600)), "10 minutes");
        assert_eq!(format_minutes(std::time::Duration::from_secs(59)), "0 minutes");
    }
}

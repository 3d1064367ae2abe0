use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::provider::BitratePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram settings
    pub telegram: TelegramConfig,

    /// Local media handling
    pub media: MediaConfig,

    /// Download and selection policy
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory for downloaded and merged files
    pub local_path: PathBuf,

    /// Path to the ffmpeg executable used for merging
    pub ffmpeg_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Audio bitrate preference
    pub bitrate_policy: BitratePolicy,

    /// Exact quality label a video stream must carry to be selected
    pub target_quality_label: String,

    /// Sources at or below this duration are offered the audio+video choice;
    /// longer sources are delivered audio-only. Also shown in the /start text.
    pub max_combined_duration_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: "".to_string(),
            },
            media: MediaConfig {
                local_path: PathBuf::from("media"),
                ffmpeg_path: "ffmpeg".to_string(),
            },
            download: DownloadConfig {
                bitrate_policy: BitratePolicy::Highest,
                target_quality_label: "480p".to_string(),
                max_combined_duration_secs: 600,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            anyhow::bail!(
                "Wrote a default config to {}; fill in telegram.bot_token and run again",
                config_path.display()
            );
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tubegram").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            anyhow::bail!("Telegram bot token must be configured");
        }

        if self.media.ffmpeg_path.is_empty() {
            anyhow::bail!("ffmpeg path must be configured");
        }

        if self.download.max_combined_duration_secs == 0 {
            anyhow::bail!("max_combined_duration_secs must be positive");
        }

        Ok(())
    }

    /// Duration threshold for offering the audio+video choice
    pub fn combined_threshold(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.download.max_combined_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_policy() {
        let config = Config::default();
        assert_eq!(config.download.target_quality_label, "480p");
        assert_eq!(config.combined_threshold().as_secs(), 600);
    }

    #[test]
    fn validate_rejects_empty_token() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_complete_config() {
        let mut config = Config::default();
        config.telegram.bot_token = "123:abc".to_string();
        assert!(config.validate().is_ok());
    }
}

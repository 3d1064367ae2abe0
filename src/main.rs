use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubegram::{bot, utils, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubegram=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    // Check for required external tools (non-fatal, they may appear later)
    let missing_deps = utils::check_dependencies(&config.media.ffmpeg_path).await;
    for dep in missing_deps {
        tracing::warn!("Missing dependency: {}", dep);
    }

    fs_err::create_dir_all(&config.media.local_path)?;

    tracing::info!("Starting bot");
    bot::run(config).await
}

use std::sync::Arc;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tokio_util::sync::CancellationToken;

pub mod keyboard;

use crate::config::Config;
use crate::download::{DeliveryFormat, DownloadPipeline, MediaRequest};
use crate::provider::ytdlp::YtDlpProvider;
use crate::utils;
use crate::Result;

const UPLOADING_TEXT: &str = "Uploading started. Please, wait a little";
const CHOOSE_FORMAT_TEXT: &str = "Please, specify the format";
const INVALID_LINK_TEXT: &str = "You provided an invalid link";

/// Build the dispatcher and poll updates until shutdown.
///
/// Each update is handled on its own task; a single process-wide
/// cancellation token threads into in-flight downloads and is cancelled on
/// ctrl-c.
pub async fn run(config: Config) -> Result<()> {
    let bot = Bot::new(config.telegram.bot_token.clone());
    let provider = Arc::new(YtDlpProvider::new());
    let pipeline = Arc::new(DownloadPipeline::new(config, provider));
    let shutdown = CancellationToken::new();

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline, shutdown])
        .default_handler(|_| async {})
        .error_handler(LoggingErrorHandler::with_custom_text("Update handler failed"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Handle /start and plain-text links
async fn handle_message(
    bot: Bot,
    msg: Message,
    pipeline: Arc<DownloadPipeline>,
    shutdown: CancellationToken,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    if text == "/start" {
        bot.send_message(chat_id, start_text(&msg, &pipeline)).await?;
        return Ok(());
    }

    // Any other text is treated as a source link
    let url = match utils::validate_and_normalize_url(text.trim()) {
        Ok(url) => url,
        Err(error) => return notify_failure(&bot, chat_id, &error).await,
    };
    let metadata = match pipeline.video_metadata(&url).await {
        Ok(metadata) => metadata,
        Err(error) => return notify_failure(&bot, chat_id, &error).await,
    };

    if pipeline.offers_format_choice(metadata.duration) {
        bot.send_message(chat_id, CHOOSE_FORMAT_TEXT)
            .reply_markup(keyboard::format_choice_markup(&url))
            .await?;
        return Ok(());
    }

    // Too long for the combined choice: deliver audio straight away
    let status = bot.send_message(chat_id, UPLOADING_TEXT).await?;
    let request = MediaRequest {
        source_url: url,
        format: DeliveryFormat::AudioOnly,
    };

    match pipeline.run(&request, &shutdown).await {
        Ok(artifact) => {
            bot.send_audio(chat_id, InputFile::file(artifact.path)).await?;
            bot.delete_message(chat_id, status.id).await?;
            Ok(())
        }
        Err(error) => notify_failure(&bot, chat_id, &error).await,
    }
}

/// Handle an inline-keyboard format choice
async fn handle_callback(
    bot: Bot,
    query: CallbackQuery,
    pipeline: Arc<DownloadPipeline>,
    shutdown: CancellationToken,
) -> Result<()> {
    // Malformed or unexpected payloads are ignored without an answer
    let Some(request) = query.data.as_deref().and_then(keyboard::parse_payload) else {
        return Ok(());
    };
    let Some(message) = query.message else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.id;

    bot.edit_message_text(chat_id, message_id, UPLOADING_TEXT).await?;

    match pipeline.run(&request, &shutdown).await {
        Ok(artifact) => {
            let file = InputFile::file(artifact.path);
            match request.format {
                DeliveryFormat::AudioOnly => {
                    bot.send_audio(chat_id, file).await?;
                }
                DeliveryFormat::AudioVideo => {
                    bot.send_video(chat_id, file).supports_streaming(true).await?;
                }
            }
            bot.delete_message(chat_id, message_id).await?;
        }
        Err(error) => {
            notify_failure(&bot, chat_id, &error).await?;
        }
    }

    bot.answer_callback_query(query.id).await?;
    Ok(())
}

fn start_text(msg: &Message, pipeline: &DownloadPipeline) -> String {
    let limit = utils::format_minutes(pipeline.combined_threshold());
    let greeting = match msg.from().and_then(|user| user.username.as_deref()) {
        Some(username) => format!("Hi, @{}!", username),
        None => "Hi!".to_string(),
    };
    format!(
        "{} Provide a YouTube link to download video. \
         Up to {} you could download video with audio, \
         over {} - only audio",
        greeting, limit, limit
    )
}

/// Single user-facing failure path: generic text to the chat, detail to the
/// log only.
async fn notify_failure(bot: &Bot, chat_id: ChatId, error: &anyhow::Error) -> Result<()> {
    tracing::error!("Request for chat {} failed: {:#}", chat_id, error);
    bot.send_message(chat_id, INVALID_LINK_TEXT).await?;
    Ok(())
}

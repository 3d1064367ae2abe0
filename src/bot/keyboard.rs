use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::download::{DeliveryFormat, MediaRequest};

/// Callback tag for an audio-only delivery
pub const AUDIO_TAG: &str = "mp3_choice";

/// Callback tag for an audio+video delivery
pub const VIDEO_TAG: &str = "mp4_choice";

/// Two mutually exclusive buttons, each round-tripping the format tag and
/// the original URL through the callback payload.
pub fn format_choice_markup(url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            ".mp3",
            format!("{}|{}", AUDIO_TAG, url),
        )],
        vec![InlineKeyboardButton::callback(
            ".mp4",
            format!("{}|{}", VIDEO_TAG, url),
        )],
    ])
}

/// Parse a `tag|url` callback payload into a request.
///
/// Payloads with the wrong arity or an unknown tag yield `None`; callers
/// ignore them silently.
pub fn parse_payload(data: &str) -> Option<MediaRequest> {
    let mut parts = data.split('|');
    let tag = parts.next()?;
    let url = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let format = match tag {
        AUDIO_TAG => DeliveryFormat::AudioOnly,
        VIDEO_TAG => DeliveryFormat::AudioVideo,
        _ => return None,
    };

    Some(MediaRequest {
        source_url: url.to_string(),
        format,
    })
}

use serenity::builder::CreateMessage;
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};

/// Maximum characters per Discord message (2000 is the limit; we use 1950 for safety).
const CHUNK_MAX: usize = 1950;

/// Largest char boundary in `s` that is `<= at`.
fn floor_boundary(s: &str, at: usize) -> usize {
    let mut idx = at.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Split `text` into pieces of at most [`CHUNK_MAX`] bytes, breaking on the
/// last newline or space in each window when there is one.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.len() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > CHUNK_MAX {
        let limit = floor_boundary(remaining, CHUNK_MAX);
        let window = &remaining[..limit];
        let split_at = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(0) | None => limit,
            Some(idx) => idx,
        };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

/// Send `text` to `channel_id` in chunks.
pub async fn send_chunked(http: &Http, channel_id: ChannelId, text: &str) -> Result<(), serenity::Error> {
    for chunk in split_chunks(text) {
        channel_id.say(http, &chunk).await?;
    }
    Ok(())
}

/// Like [`send_chunked`], with the first chunk posted as a reply to `reply_to`.
pub async fn reply_chunked(
    http: &Http,
    channel_id: ChannelId,
    reply_to: MessageId,
    text: &str,
) -> Result<(), serenity::Error> {
    for (i, chunk) in split_chunks(text).into_iter().enumerate() {
        let mut msg = CreateMessage::new().content(chunk);
        if i == 0 {
            msg = msg.reference_message((channel_id, reply_to));
        }
        channel_id.send_message(http, msg).await?;
    }
    Ok(())
}

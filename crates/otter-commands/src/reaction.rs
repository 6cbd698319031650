use otter_core::{InboundReaction, Platform};
use tracing::{debug, warn};

use crate::canned;

pub const LANGUAGE_EMOJI: &str = "language";

/// Answer a `language` reaction with a reply to the reacted message.
///
/// Only the first such reaction on a message triggers a reply. Returns
/// whether a reply was sent.
pub async fn handle_reaction(platform: &dyn Platform, reaction: &InboundReaction, bot_id: u64) -> bool {
    if reaction.user_id == bot_id || reaction.emoji_name != LANGUAGE_EMOJI {
        return false;
    }
    if reaction.same_emoji_count > 1 {
        debug!(message_id = reaction.message_id, "language reaction already answered");
        return false;
    }

    match platform
        .reply_to(reaction.channel_id, reaction.message_id, canned::language())
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(channel_id = reaction.channel_id, error = %e, "language reply failed");
            false
        }
    }
}

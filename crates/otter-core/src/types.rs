use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-neutral view of a "message created" event.
///
/// Built by the channel adapter at receipt time and handed to the router;
/// it is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: u64,
    pub text: String,
    pub author_id: u64,
    pub author_name: String,
    /// `None` for direct messages.
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    /// Creation time reported by the platform; reminder offsets start here.
    pub timestamp: DateTime<Utc>,
}

/// Platform-neutral view of a "reaction added" event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundReaction {
    pub user_id: u64,
    pub emoji_name: String,
    pub channel_id: u64,
    pub message_id: u64,
    /// How many reactions with the same emoji the message now carries.
    pub same_emoji_count: u64,
}

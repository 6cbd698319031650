use async_trait::async_trait;

use crate::error::Result;

/// Messaging-platform collaborator used by the router and the reminder poller.
///
/// Implemented over serenity's REST client in `otter-discord`; tests use
/// in-memory fakes.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Names of the roles held by `user_id` in `guild_id`, in the member's order.
    async fn member_roles(&self, guild_id: u64, user_id: u64) -> Result<Vec<String>>;

    /// Display name of a guild member.
    async fn member_name(&self, guild_id: u64, user_id: u64) -> Result<String>;

    /// Post `text` to `channel_id`.
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<()>;

    /// Post `text` to `channel_id` as a reply referencing `message_id`.
    async fn reply_to(&self, channel_id: u64, message_id: u64, text: &str) -> Result<()>;
}

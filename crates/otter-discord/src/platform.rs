use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use otter_core::config::EXTERNAL_CALL_TIMEOUT_SECS;
use otter_core::{OtterError, Platform};
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use tracing::debug;

use crate::error::DiscordError;
use crate::send;

fn guild(id: u64) -> Result<GuildId, DiscordError> {
    (id != 0).then(|| GuildId::new(id)).ok_or(DiscordError::ZeroId { kind: "guild" })
}

fn user(id: u64) -> Result<UserId, DiscordError> {
    (id != 0).then(|| UserId::new(id)).ok_or(DiscordError::ZeroId { kind: "user" })
}

fn channel(id: u64) -> Result<ChannelId, DiscordError> {
    (id != 0).then(|| ChannelId::new(id)).ok_or(DiscordError::ZeroId { kind: "channel" })
}

fn message(id: u64) -> Result<MessageId, DiscordError> {
    (id != 0).then(|| MessageId::new(id)).ok_or(DiscordError::ZeroId { kind: "message" })
}

/// Bound a REST round trip by `limit`.
async fn deadline<T, F>(limit: Duration, call: F) -> otter_core::Result<T>
where
    F: Future<Output = otter_core::Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| OtterError::Timeout {
            ms: limit.as_millis() as u64,
        })?
}

/// [`Platform`] over serenity's REST client.
///
/// Uses `Arc<Http>` only, so it keeps working across gateway reconnects and
/// can be handed to the reminder poller before the gateway is up.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
    timeout: Duration,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            timeout: Duration::from_secs(EXTERNAL_CALL_TIMEOUT_SECS),
        }
    }

    pub fn from_token(token: &str) -> Result<Self, DiscordError> {
        if token.trim().is_empty() {
            return Err(DiscordError::NoToken);
        }
        Ok(Self::new(Arc::new(Http::new(token))))
    }

    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }

    async fn roles_of(&self, guild_id: u64, user_id: u64) -> Result<Vec<String>, DiscordError> {
        let gid = guild(guild_id)?;
        let member = gid.member(&*self.http, user(user_id)?).await?;
        let guild_roles = gid.roles(&*self.http).await?;
        let names = member
            .roles
            .iter()
            .filter_map(|rid| guild_roles.get(rid).map(|r| r.name.clone()))
            .collect::<Vec<_>>();
        debug!(guild_id, user_id, count = names.len(), "member roles resolved");
        Ok(names)
    }

    async fn name_of(&self, guild_id: u64, user_id: u64) -> Result<String, DiscordError> {
        let member = guild(guild_id)?
            .member(&*self.http, user(user_id)?)
            .await?;
        Ok(member.user.name.clone())
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    async fn member_roles(&self, guild_id: u64, user_id: u64) -> otter_core::Result<Vec<String>> {
        deadline(self.timeout, async {
            self.roles_of(guild_id, user_id).await.map_err(OtterError::from)
        })
        .await
    }

    async fn member_name(&self, guild_id: u64, user_id: u64) -> otter_core::Result<String> {
        deadline(self.timeout, async {
            match self.name_of(guild_id, user_id).await {
                Ok(name) => Ok(name),
                Err(DiscordError::ZeroId { .. }) => {
                    Err(OtterError::MemberNotFound { guild_id, user_id })
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn send_message(&self, channel_id: u64, text: &str) -> otter_core::Result<()> {
        let cid = channel(channel_id)?;
        deadline(self.timeout, async {
            send::send_chunked(&self.http, cid, text)
                .await
                .map_err(|e| OtterError::from(DiscordError::from(e)))
        })
        .await
    }

    async fn reply_to(&self, channel_id: u64, message_id: u64, text: &str) -> otter_core::Result<()> {
        let cid = channel(channel_id)?;
        let mid = message(message_id)?;
        deadline(self.timeout, async {
            send::reply_chunked(&self.http, cid, mid, text)
                .await
                .map_err(|e| OtterError::from(DiscordError::from(e)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ids_are_rejected() {
        assert!(matches!(guild(0), Err(DiscordError::ZeroId { kind: "guild" })));
        assert_eq!(channel(5).unwrap().get(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_calls_time_out() {
        let err = deadline(Duration::from_secs(10), std::future::pending::<otter_core::Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, OtterError::Timeout { ms: 10_000 }));
        assert!(err.is_retryable());
    }

    #[test]
    fn blank_token_is_refused() {
        assert!(matches!(DiscordPlatform::from_token("  "), Err(DiscordError::NoToken)));
    }

    #[tokio::test]
    async fn direct_message_names_are_not_found() {
        let platform = DiscordPlatform::from_token("not-a-real-token").unwrap();
        let err = platform.member_name(0, 42).await.unwrap_err();
        assert!(matches!(err, OtterError::MemberNotFound { guild_id: 0, user_id: 42 }));
    }
}

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use otter_commands::{handle_reaction, CommandRouter, DispatchOutcome};
use otter_core::{InboundMessage, InboundReaction, Platform};
use serenity::all::ActivityData;
use serenity::async_trait;
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::gateway::Ready;
use serenity::model::id::UserId;
use serenity::model::user::OnlineStatus;
use serenity::prelude::{Context, EventHandler};
use tracing::{debug, info, warn};

/// Serenity event handler feeding the command router.
pub struct OtterHandler {
    pub router: Arc<CommandRouter>,
    pub platform: Arc<dyn Platform>,
    pub activity_name: Option<String>,
    pub bot_id: OnceLock<UserId>,
}

impl OtterHandler {
    fn is_self(&self, id: UserId) -> bool {
        self.bot_id.get() == Some(&id)
    }
}

fn emoji_name(emoji: &ReactionType) -> Option<&str> {
    match emoji {
        ReactionType::Custom { name, .. } => name.as_deref(),
        ReactionType::Unicode(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Message creation time at full precision. Falls back to whole seconds if
/// the RFC 3339 rendering cannot be parsed.
fn message_time(rfc3339: &str, unix_secs: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| DateTime::<Utc>::from_timestamp(unix_secs, 0))
        .unwrap_or_else(Utc::now)
}

fn to_inbound(msg: &Message) -> InboundMessage {
    let timestamp = message_time(&msg.timestamp.to_string(), msg.timestamp.unix_timestamp());
    InboundMessage {
        message_id: msg.id.get(),
        text: msg.content.clone(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        guild_id: msg.guild_id.map(|g| g.get()),
        channel_id: msg.channel_id.get(),
        timestamp,
    }
}

#[async_trait]
impl EventHandler for OtterHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.bot_id.set(ready.user.id).ok();
        let activity = self.activity_name.as_deref().map(ActivityData::playing);
        ctx.set_presence(activity, OnlineStatus::Online);
        info!(name = %ready.user.name, guilds = ready.guilds.len(), "Discord bot connected");
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let from_self = self.is_self(msg.author.id);
        if from_self || !msg.content.starts_with(self.router.prefix()) {
            return;
        }

        let inbound = to_inbound(&msg);
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            match router.dispatch(&inbound, from_self).await {
                DispatchOutcome::Replied { command } => {
                    debug!(%command, channel_id = inbound.channel_id, "command handled")
                }
                DispatchOutcome::Failed { command, error } => {
                    debug!(%command, %error, "command failed")
                }
                _ => {}
            }
        });
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        let Some(user_id) = reaction.user_id else {
            return;
        };
        if self.is_self(user_id) {
            return;
        }
        let Some(name) = emoji_name(&reaction.emoji).map(str::to_string) else {
            return;
        };
        if name != otter_commands::reaction::LANGUAGE_EMOJI {
            return;
        }

        let original = match reaction.message(&ctx).await {
            Ok(m) => m,
            Err(e) => {
                warn!(channel_id = %reaction.channel_id, error = %e, "reacted message lookup failed");
                return;
            }
        };
        let same_emoji_count = original
            .reactions
            .iter()
            .filter(|r| emoji_name(&r.reaction_type) == Some(name.as_str()))
            .map(|r| r.count)
            .sum();

        let inbound = InboundReaction {
            user_id: user_id.get(),
            emoji_name: name,
            channel_id: reaction.channel_id.get(),
            message_id: reaction.message_id.get(),
            same_emoji_count,
        };
        let bot_id = self.bot_id.get().map(|id| id.get()).unwrap_or(0);
        let platform = Arc::clone(&self.platform);
        tokio::spawn(async move {
            handle_reaction(platform.as_ref(), &inbound, bot_id).await;
        });
    }
}

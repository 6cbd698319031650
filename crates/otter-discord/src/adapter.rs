use std::sync::{Arc, OnceLock};
use std::time::Duration;

use otter_commands::CommandRouter;
use otter_core::config::DiscordConfig;
use otter_core::Platform;
use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tracing::{error, info, warn};

use crate::error::DiscordError;
use crate::handler::OtterHandler;

/// Discord channel adapter.
///
/// Wraps a serenity `Client` and reconnects whenever the gateway drops.
pub struct DiscordAdapter {
    token: String,
    activity_name: Option<String>,
    router: Arc<CommandRouter>,
    platform: Arc<dyn Platform>,
}

impl DiscordAdapter {
    pub fn new(
        config: &DiscordConfig,
        router: Arc<CommandRouter>,
        platform: Arc<dyn Platform>,
    ) -> Result<Self, DiscordError> {
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(DiscordError::NoToken)?
            .to_string();
        Ok(Self {
            token,
            activity_name: config.activity_name.clone(),
            router,
            platform,
        })
    }

    /// Connect and keep reconnecting. Never returns.
    pub async fn run(self) {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MESSAGE_REACTIONS;

        loop {
            let mut client = loop {
                match self.build_client(intents).await {
                    Ok(c) => break c,
                    Err(e) => {
                        error!(error = %e, "Discord: connect failed, retrying in 30s");
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            };

            info!("Discord: gateway connecting");
            match client.start().await {
                Err(e) => warn!(error = %e, "Discord: gateway error, reconnecting in 5s"),
                Ok(()) => info!("Discord: gateway stopped, reconnecting in 5s"),
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    async fn build_client(&self, intents: GatewayIntents) -> Result<Client, DiscordError> {
        let handler = OtterHandler {
            router: Arc::clone(&self.router),
            platform: Arc::clone(&self.platform),
            activity_name: self.activity_name.clone(),
            bot_id: OnceLock::new(),
        };

        Ok(Client::builder(&self.token, intents)
            .event_handler(handler)
            .await?)
    }
}

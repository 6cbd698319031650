use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use otter_core::Platform;
use otter_scheduler::{ListScope, ReminderRequest, ReminderService};

use crate::error::Result;
use crate::router::{CommandHandler, Invocation};

/// `remindme help`, `remindme list [all]`, or `remindme <text with duration>`.
pub struct RemindMe {
    pub service: Arc<ReminderService>,
    pub platform: Arc<dyn Platform>,
}

#[async_trait]
impl CommandHandler for RemindMe {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        let args = inv.args.trim();
        let lowered = args.to_lowercase();

        if lowered == "help" {
            return Ok(ReminderService::help_text().to_string());
        }
        if lowered == "list" || lowered.starts_with("list ") {
            let scope = if lowered == "list all" {
                ListScope::All
            } else {
                ListScope::Mine
            };
            let listing = self
                .service
                .list(
                    self.platform.as_ref(),
                    inv.server(),
                    inv.message.author_id,
                    scope,
                    Utc::now(),
                )
                .await?;
            return Ok(listing);
        }

        let request = ReminderRequest {
            text: inv.args.clone(),
            server: inv.server(),
            creator: inv.message.author_id,
            channel: inv.message.channel_id,
            source_message: inv.message.message_id,
            source_timestamp: inv.message.timestamp,
        };
        Ok(self.service.create(&request).await?)
    }
}

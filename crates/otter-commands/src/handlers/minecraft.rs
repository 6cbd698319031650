use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::{CommandError, Result};
use crate::rcon::RconClient;
use crate::router::{CommandHandler, Invocation};

pub const WHITELIST_FLAG: &str = "mc-commands";
pub const ADMIN_FLAG: &str = "mc-admin";

/// Whitelist management has its own, wider flag; everything else is admin.
pub fn flag_for(args: &str) -> &'static str {
    match args.split_whitespace().next() {
        Some(first) if first.eq_ignore_ascii_case("whitelist") => WHITELIST_FLAG,
        _ => ADMIN_FLAG,
    }
}

pub struct Minecraft {
    pub rcon: Option<Arc<RconClient>>,
}

#[async_trait]
impl CommandHandler for Minecraft {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        if inv.args.is_empty() {
            return Err(CommandError::usage("No minecraft command specified"));
        }
        let rcon = self
            .rcon
            .as_ref()
            .ok_or(CommandError::NotConfigured("minecraft server"))?;
        info!(author_id = inv.message.author_id, command = %inv.args, "running rcon command");
        rcon.execute(&inv.args).await
    }
}

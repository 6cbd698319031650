use std::time::Duration;

use async_trait::async_trait;

use crate::canned;
use crate::error::{CommandError, Result};
use crate::router::{CommandHandler, Invocation};

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        Ok("pong".to_string())
    }
}

/// Replies after a pause; used to check concurrent dispatch.
pub struct Delayed {
    pub delay: Duration,
}

#[async_trait]
impl CommandHandler for Delayed {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok("test success".to_string())
    }
}

pub struct Split;

#[async_trait]
impl CommandHandler for Split {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        Ok(inv.args.split_whitespace().collect::<Vec<_>>().join("-"))
    }
}

pub struct Help {
    pub prefix: String,
}

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        Ok(canned::help(&self.prefix))
    }
}

pub struct Source;

#[async_trait]
impl CommandHandler for Source {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        Ok(canned::SOURCE.to_string())
    }
}

pub struct Kevin;

#[async_trait]
impl CommandHandler for Kevin {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        Ok(canned::kevin().to_string())
    }
}

pub struct Language;

#[async_trait]
impl CommandHandler for Language {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        Ok(canned::language().to_string())
    }
}

pub struct FeatureRequest;

#[async_trait]
impl CommandHandler for FeatureRequest {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        Ok(canned::feature_request(inv.message.author_id))
    }
}

pub struct Lunch {
    pub link: Option<String>,
}

#[async_trait]
impl CommandHandler for Lunch {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        let link = self
            .link
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .ok_or(CommandError::NotConfigured("lunch link"))?;
        Ok(format!("{link} please don't share this publicly"))
    }
}

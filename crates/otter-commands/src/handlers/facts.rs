use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::FactSource;
use crate::error::Result;
use crate::router::{CommandHandler, Invocation};

pub struct CatFact {
    pub source: Arc<dyn FactSource>,
}

#[async_trait]
impl CommandHandler for CatFact {
    async fn handle(&self, _inv: &Invocation) -> Result<String> {
        Ok(self.source.cat_fact().await?.fact)
    }
}

pub struct Relationships {
    pub source: Arc<dyn FactSource>,
}

#[async_trait]
impl CommandHandler for Relationships {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        let quip = self.source.relationship().await?;
        Ok(quip.pick(&inv.args).to_string())
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::mtg::{self, CardLookup};
use crate::router::{CommandHandler, Invocation};

pub struct Mtg {
    pub lookup: Arc<dyn CardLookup>,
    pub search_url: String,
}

#[async_trait]
impl CommandHandler for Mtg {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        mtg::search(&inv.args, &self.search_url, self.lookup.as_ref()).await
    }
}

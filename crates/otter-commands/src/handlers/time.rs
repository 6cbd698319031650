use async_trait::async_trait;
use chrono::Utc;

use crate::error::Result;
use crate::router::{CommandHandler, Invocation};
use crate::timezone::MemberClock;

pub struct Time {
    pub clock: MemberClock,
}

#[async_trait]
impl CommandHandler for Time {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        self.clock.local_time(Utc::now(), &inv.args)
    }
}

use async_trait::async_trait;

use crate::dice::{self, RandDie};
use crate::error::Result;
use crate::router::{CommandHandler, Invocation};

pub struct Roll;

fn roll_with_thread_rng(args: &str) -> Result<String> {
    let mut die = RandDie(rand::thread_rng());
    dice::roll_command(args, &mut die)
}

#[async_trait]
impl CommandHandler for Roll {
    async fn handle(&self, inv: &Invocation) -> Result<String> {
        if inv.args.trim().eq_ignore_ascii_case("help") {
            return Ok(dice::HELP.to_string());
        }
        roll_with_thread_rng(&inv.args)
    }
}

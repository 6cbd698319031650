//! Built-in command handlers and their registration table.

pub mod basic;
pub mod facts;
pub mod magic;
pub mod minecraft;
pub mod remind;
pub mod roll;
pub mod time;

use std::sync::Arc;
use std::time::Duration;

use otter_core::{OtterConfig, Platform};
use otter_scheduler::ReminderService;

use crate::clients::{FactSource, HttpFactSource};
use crate::error::{CommandError, Result};
use crate::mtg::{CardLookup, ScryfallLookup};
use crate::rcon::RconClient;
use crate::router::{CommandRouter, Gate};
use crate::timezone::MemberClock;

/// Collaborators the built-in handlers need.
pub struct CommandDeps {
    pub prefix: String,
    pub facts: Arc<dyn FactSource>,
    pub cards: Arc<dyn CardLookup>,
    pub scryfall_search_url: String,
    pub clock: MemberClock,
    pub reminders: Arc<ReminderService>,
    pub platform: Arc<dyn Platform>,
    pub minecraft: Option<Arc<RconClient>>,
    pub lunch_link: Option<String>,
    pub test_delay: Duration,
}

impl CommandDeps {
    /// Production collaborators for `config`.
    pub fn from_config(
        config: &OtterConfig,
        platform: Arc<dyn Platform>,
        reminders: Arc<ReminderService>,
    ) -> Result<Self> {
        let zones = config
            .member_timezones
            .resolve()
            .map_err(|e| CommandError::Config(format!("member timezones: {e}")))?;
        let minecraft = match (&config.minecraft.address, &config.minecraft.password) {
            (Some(addr), Some(pass)) if !addr.trim().is_empty() => {
                Some(Arc::new(RconClient::new(addr.trim(), pass.clone())))
            }
            _ => None,
        };
        Ok(Self {
            prefix: config.prefix.clone(),
            facts: Arc::new(HttpFactSource::new(&config.apis)?),
            cards: Arc::new(ScryfallLookup::new(config.apis.scryfall_api_url.clone())?),
            scryfall_search_url: config.apis.scryfall_search_url.clone(),
            clock: MemberClock::new(zones),
            reminders,
            platform,
            minecraft,
            lunch_link: config.lunch_link.clone(),
            test_delay: Duration::from_secs(3),
        })
    }
}

/// Register every built-in command on `router`.
///
/// | command          | gate                    |
/// |------------------|-------------------------|
/// | catfact          | `catfact-command`       |
/// | relationships    | `relationship-command`  |
/// | mc               | `mc-commands`/`mc-admin`|
/// | time             | `timezone-command`      |
/// | remindme         | `reminder-command`      |
/// | lunch, link      | `lunch-command`         |
/// | everything else  | open                    |
pub fn register_builtin(router: &mut CommandRouter, deps: CommandDeps) {
    let CommandDeps {
        prefix,
        facts,
        cards,
        scryfall_search_url,
        clock,
        reminders,
        platform,
        minecraft: rcon,
        lunch_link,
        test_delay,
    } = deps;

    let lunch = Arc::new(basic::Lunch { link: lunch_link });

    router
        .register("ping", Gate::Open, Arc::new(basic::Ping))
        .register("test", Gate::Open, Arc::new(basic::Delayed { delay: test_delay }))
        .register("split", Gate::Open, Arc::new(basic::Split))
        .register("help", Gate::Open, Arc::new(basic::Help { prefix }))
        .register("source", Gate::Open, Arc::new(basic::Source))
        .register("kevin", Gate::Open, Arc::new(basic::Kevin))
        .register("language", Gate::Open, Arc::new(basic::Language))
        .register("featurerequest", Gate::Open, Arc::new(basic::FeatureRequest))
        .register("roll", Gate::Open, Arc::new(roll::Roll))
        .register(
            "mtg",
            Gate::Open,
            Arc::new(magic::Mtg {
                lookup: cards,
                search_url: scryfall_search_url,
            }),
        )
        .register(
            "catfact",
            Gate::Flag("catfact-command"),
            Arc::new(facts::CatFact {
                source: facts.clone(),
            }),
        )
        .register(
            "relationships",
            Gate::Flag("relationship-command"),
            Arc::new(facts::Relationships { source: facts }),
        )
        .register(
            "mc",
            Gate::ByArgs(minecraft::flag_for),
            Arc::new(minecraft::Minecraft { rcon }),
        )
        .register(
            "time",
            Gate::Flag("timezone-command"),
            Arc::new(time::Time { clock }),
        )
        .register(
            "remindme",
            Gate::Flag("reminder-command"),
            Arc::new(remind::RemindMe {
                service: reminders,
                platform,
            }),
        )
        .register("lunch", Gate::Flag("lunch-command"), lunch.clone())
        .register("link", Gate::Flag("lunch-command"), lunch);
}

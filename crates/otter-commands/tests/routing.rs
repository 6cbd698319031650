use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use otter_commands::clients::{CatFact, FactSource, Relationship};
use otter_commands::mtg::CardLookup;
use otter_commands::timezone::MemberClock;
use otter_commands::{
    register_builtin, CommandDeps, CommandError, CommandRouter, DispatchOutcome, FeatureGate,
    FlagBackend,
};
use otter_core::{InboundMessage, OtterError, Platform};
use otter_scheduler::{ReminderService, SqliteReminderStore};

#[derive(Default)]
struct FakePlatform {
    roles: HashMap<u64, Vec<String>>,
    sent: Mutex<Vec<(u64, String)>>,
}

#[async_trait]
impl Platform for FakePlatform {
    async fn member_roles(&self, guild_id: u64, user_id: u64) -> otter_core::Result<Vec<String>> {
        self.roles
            .get(&user_id)
            .cloned()
            .ok_or(OtterError::MemberNotFound { guild_id, user_id })
    }
    async fn member_name(&self, _g: u64, user_id: u64) -> otter_core::Result<String> {
        Ok(format!("user{user_id}"))
    }
    async fn send_message(&self, channel_id: u64, text: &str) -> otter_core::Result<()> {
        self.sent.lock().unwrap().push((channel_id, text.to_string()));
        Ok(())
    }
    async fn reply_to(&self, channel_id: u64, _m: u64, text: &str) -> otter_core::Result<()> {
        self.send_message(channel_id, text).await
    }
}

/// Flags are granted per (flag, role) pair.
struct GrantTable(Vec<(&'static str, &'static str)>);

#[async_trait]
impl FlagBackend for GrantTable {
    async fn evaluate(&self, flag: &str, _user: u64, role: &str) -> otter_commands::Result<bool> {
        Ok(self.0.iter().any(|(f, r)| *f == flag && *r == role))
    }
}

struct Facts {
    fail: bool,
}

#[async_trait]
impl FactSource for Facts {
    async fn cat_fact(&self) -> otter_commands::Result<CatFact> {
        if self.fail {
            return Err(CommandError::Upstream {
                message: "error getting cat fact",
                status: 502,
            });
        }
        Ok(CatFact {
            fact: "Cats have five toes on their front paws.".to_string(),
        })
    }
    async fn relationship(&self) -> otter_commands::Result<Relationship> {
        Ok(Relationship {
            objective: "Maximise otter throughput".to_string(),
            synergy: "Otters holding hands".to_string(),
        })
    }
}

struct Cards;

#[async_trait]
impl CardLookup for Cards {
    async fn colour_identity(&self, _name: &str) -> otter_commands::Result<String> {
        Ok("W".to_string())
    }
}

const ADMIN: u64 = 1;
const MEMBER: u64 = 2;
const STRANGER: u64 = 3;

struct Harness {
    _dir: tempfile::TempDir,
    platform: Arc<FakePlatform>,
    router: CommandRouter,
}

fn harness(cat_facts_fail: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut roles = HashMap::new();
    roles.insert(ADMIN, vec!["everyone".to_string(), "admins".to_string()]);
    roles.insert(MEMBER, vec!["everyone".to_string()]);
    let platform = Arc::new(FakePlatform {
        roles,
        ..FakePlatform::default()
    });

    let gate = FeatureGate::new(Arc::new(GrantTable(vec![
        ("catfact-command", "everyone"),
        ("reminder-command", "everyone"),
        ("timezone-command", "everyone"),
        ("mc-commands", "everyone"),
        ("mc-admin", "admins"),
        ("lunch-command", "admins"),
    ])));

    let store = Arc::new(SqliteReminderStore::new(dir.path().join("reminders.db")));
    let mut zones = HashMap::new();
    zones.insert("dave".to_string(), "Australia/Perth".to_string());

    let deps = CommandDeps {
        prefix: "!".to_string(),
        facts: Arc::new(Facts {
            fail: cat_facts_fail,
        }),
        cards: Arc::new(Cards),
        scryfall_search_url: "https://scryfall.com/search?as=grid&order=name&q=".to_string(),
        clock: MemberClock::new(zones),
        reminders: Arc::new(ReminderService::new(store)),
        platform: platform.clone(),
        minecraft: None,
        lunch_link: Some("https://meet.example/lunch".to_string()),
        test_delay: Duration::from_millis(50),
    };

    let mut router = CommandRouter::new("!", gate, platform.clone());
    register_builtin(&mut router, deps);
    Harness {
        _dir: dir,
        platform,
        router,
    }
}

fn message(author_id: u64, text: &str) -> InboundMessage {
    InboundMessage {
        message_id: 500,
        text: text.to_string(),
        author_id,
        author_name: format!("user{author_id}"),
        guild_id: Some(9),
        channel_id: 77,
        timestamp: Utc.with_ymd_and_hms(2030, 5, 1, 8, 0, 0).unwrap(),
    }
}

impl Harness {
    async fn say(&self, author_id: u64, text: &str) -> DispatchOutcome {
        self.router.dispatch(&message(author_id, text), false).await
    }

    fn replies(&self) -> Vec<String> {
        self.platform
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[tokio::test]
async fn every_builtin_is_registered() {
    let h = harness(false);
    let names = h.router.command_names();
    for expected in [
        "catfact",
        "featurerequest",
        "help",
        "kevin",
        "language",
        "link",
        "lunch",
        "mc",
        "mtg",
        "ping",
        "relationships",
        "remindme",
        "roll",
        "source",
        "split",
        "test",
        "time",
    ] {
        assert!(names.contains(&expected), "missing {expected}");
    }

    let gate_of = |name: &str| h.router.descriptor(name).unwrap().gate.flag_for("");
    assert_eq!(gate_of("catfact"), Some("catfact-command"));
    assert_eq!(gate_of("lunch"), Some("lunch-command"));
    assert_eq!(gate_of("ping"), None);
    assert!(h.router.descriptor("nope").is_none());
}

#[tokio::test]
async fn open_commands_need_no_roles() {
    let h = harness(false);
    h.say(STRANGER, "!ping").await;
    h.say(STRANGER, "!split otters are great").await;
    assert_eq!(h.replies(), vec!["pong", "otters-are-great"]);
}

#[tokio::test]
async fn each_invocation_replies_exactly_once() {
    let h = harness(true);
    let messages = [
        "!ping",
        "!catfact",
        "!relationships objective",
        "!time nobody",
        "!remindme no duration here",
        "!mc op steve",
        "!roll lots",
        "!help",
    ];
    for text in messages {
        h.say(MEMBER, text).await;
    }
    assert_eq!(h.replies().len(), messages.len());
}

#[tokio::test]
async fn unknown_commands_are_silent() {
    let h = harness(false);
    h.say(ADMIN, "!frobnicate").await;
    h.say(ADMIN, "!").await;
    h.say(ADMIN, "not a command").await;
    assert!(h.replies().is_empty());
}

#[tokio::test]
async fn gated_commands_follow_roles() {
    let h = harness(false);
    h.say(MEMBER, "!catfact").await;
    h.say(MEMBER, "!lunch").await;
    h.say(ADMIN, "!LUNCH").await;
    h.say(MEMBER, "!relationships").await;
    assert_eq!(
        h.replies(),
        vec![
            "Cats have five toes on their front paws.",
            "Command not allowed",
            "https://meet.example/lunch please don't share this publicly",
            "Command not allowed",
        ]
    );
}

#[tokio::test]
async fn unresolvable_roles_deny_gated_commands() {
    let h = harness(false);
    let outcome = h.say(STRANGER, "!catfact").await;
    assert!(matches!(outcome, DispatchOutcome::Denied { flag: "catfact-command", .. }));
    assert_eq!(h.replies(), vec!["Command not allowed"]);
}

#[tokio::test]
async fn minecraft_flag_depends_on_subcommand() {
    let h = harness(false);
    let whitelist = h.say(MEMBER, "!mc whitelist add steve").await;
    let admin = h.say(MEMBER, "!mc op steve").await;
    assert!(matches!(whitelist, DispatchOutcome::Failed { .. }));
    assert!(matches!(admin, DispatchOutcome::Denied { flag: "mc-admin", .. }));
    assert_eq!(
        h.replies(),
        vec!["minecraft server is not configured", "Command not allowed"]
    );
}

#[tokio::test]
async fn upstream_failure_is_a_single_bounded_reply() {
    let h = harness(true);
    h.say(MEMBER, "!catfact").await;
    assert_eq!(h.replies(), vec!["error getting cat fact"]);
}

#[tokio::test]
async fn reminders_round_trip_through_commands() {
    let h = harness(false);
    h.say(MEMBER, "!remindme feed the otters 2h").await;
    h.say(MEMBER, "!remindme stretch").await;
    h.say(MEMBER, "!remindme list").await;
    h.say(ADMIN, "!remindme list").await;

    let replies = h.replies();
    assert_eq!(replies[0], "Reminder added.");
    assert_eq!(replies[1], "No interval specified");
    assert_eq!(
        replies[2],
        "From: user2 Due: 2030-05-01T10:00:00Z Message: feed the otters \n"
    );
    assert_eq!(replies[3], "No remaining reminders");
}

#[tokio::test]
async fn time_and_mtg_handlers() {
    let h = harness(false);
    h.say(MEMBER, "!time").await;
    h.say(MEMBER, "!time nobody").await;
    h.say(STRANGER, "!mtg linvala creature 2/2").await;
    assert_eq!(
        h.replies(),
        vec![
            "no user specified",
            "User not found",
            "https://scryfall.com/search?as=grid&order=name&q=commander%3AW+pow%3D2+tou%3D2+type%3Acreature",
        ]
    );
}

#[tokio::test]
async fn slow_handlers_run_concurrently() {
    let h = Arc::new(harness(false));
    let started = std::time::Instant::now();
    let mut tasks = Vec::new();
    for _ in 0..5 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            h.say(STRANGER, "!test").await;
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(h.replies(), vec!["test success"; 5]);
}

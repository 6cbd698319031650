use std::collections::HashMap;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{OtterError, Result};

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_REMINDER_INTERVAL_MINUTES: u64 = 5;
/// Longest accepted poll interval (one week).
pub const MAX_REMINDER_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
/// Deadline applied to every store, HTTP and RCON round trip.
pub const EXTERNAL_CALL_TIMEOUT_SECS: u64 = 10;

/// Top-level config (otter.toml + legacy env names + OTTER_* overrides).
///
/// Built once at startup and shared by `Arc`; nothing below the gateway reads
/// the process environment directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtterConfig {
    /// Leading character that marks a message as a bot command.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub flags: FlagsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    /// Username -> IANA timezone for the `time` command.
    #[serde(default)]
    pub member_timezones: TimezoneSetting,
    #[serde(default)]
    pub lunch_link: Option<String>,
    #[serde(default)]
    pub minecraft: MinecraftConfig,
    #[serde(default)]
    pub apis: ApiConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

impl Default for OtterConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            discord: DiscordConfig::default(),
            flags: FlagsConfig::default(),
            store: StoreConfig::default(),
            reminders: ReminderConfig::default(),
            member_timezones: TimezoneSetting::default(),
            lunch_link: None,
            minecraft: MinecraftConfig::default(),
            apis: ApiConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Mandatory at startup; the gateway refuses to run without it.
    pub token: Option<String>,
    /// Optional "Playing …" presence text.
    pub activity_name: Option<String>,
}

/// Feature-flag backend settings. A missing key means every flag-gated
/// command is denied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagsConfig {
    pub key: Option<String>,
    /// Evaluation endpoint of the flag service.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `sqlite://<path>` or a bare filesystem path.
    #[serde(default = "default_store_uri")]
    pub uri: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_store_uri(),
        }
    }
}

impl StoreConfig {
    /// Filesystem path of the reminder database.
    pub fn path(&self) -> &str {
        self.uri.strip_prefix("sqlite://").unwrap_or(&self.uri)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default)]
    pub interval_minutes: Option<MinutesSetting>,
}

impl ReminderConfig {
    /// Poll interval in minutes. Unset, unparseable, zero or values above
    /// [`MAX_REMINDER_INTERVAL_MINUTES`] fall back to
    /// [`DEFAULT_REMINDER_INTERVAL_MINUTES`].
    pub fn interval_minutes(&self) -> u64 {
        let parsed = match &self.interval_minutes {
            Some(MinutesSetting::Number(n)) => u64::try_from(*n).ok(),
            Some(MinutesSetting::Text(s)) => s.trim().parse::<u64>().ok(),
            None => None,
        };
        match parsed {
            Some(n) if n > 0 && n <= MAX_REMINDER_INTERVAL_MINUTES => n,
            _ => DEFAULT_REMINDER_INTERVAL_MINUTES,
        }
    }

    /// [`Self::interval_minutes`] as a `Duration`.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_minutes().saturating_mul(60))
    }
}

/// Env values arrive as either numbers or free text; both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinutesSetting {
    Number(i64),
    Text(String),
}

/// `MEMBER_TIMEZONES` is a JSON object in the environment but a table in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimezoneSetting {
    Table(HashMap<String, String>),
    Json(String),
}

impl Default for TimezoneSetting {
    fn default() -> Self {
        TimezoneSetting::Table(HashMap::new())
    }
}

impl TimezoneSetting {
    /// Resolve to a username -> zone map with lower-cased usernames.
    pub fn resolve(&self) -> Result<HashMap<String, String>> {
        let raw = match self {
            TimezoneSetting::Table(map) => map.clone(),
            TimezoneSetting::Json(s) if s.trim().is_empty() => HashMap::new(),
            TimezoneSetting::Json(s) => serde_json::from_str(s)?,
        };
        Ok(raw
            .into_iter()
            .map(|(name, zone)| (name.to_lowercase(), zone))
            .collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinecraftConfig {
    /// `host:port` of the RCON listener.
    pub address: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_catfact_url")]
    pub catfact_url: String,
    /// Relationship quip service; the command reports an error when unset.
    #[serde(default)]
    pub relationships_url: Option<String>,
    #[serde(default = "default_scryfall_api_url")]
    pub scryfall_api_url: String,
    #[serde(default = "default_scryfall_search_url")]
    pub scryfall_search_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            catfact_url: default_catfact_url(),
            relationships_url: None,
            scryfall_api_url: default_scryfall_api_url(),
            scryfall_search_url: default_scryfall_search_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthConfig {
    /// `host:port` for `GET /health`; disabled when unset.
    pub bind: Option<String>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
fn default_store_uri() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("sqlite://{}/.otter/reminders.db", home)
}
fn default_catfact_url() -> String {
    "https://catfact.ninja/fact".to_string()
}
fn default_scryfall_api_url() -> String {
    "https://api.scryfall.com".to_string()
}
fn default_scryfall_search_url() -> String {
    "https://scryfall.com/search?as=grid&order=name&q=".to_string()
}

/// Map the bot's historical environment variable names onto config keys.
fn legacy_env_key(name: &str) -> Option<&'static str> {
    let key = match name.to_ascii_uppercase().as_str() {
        "DISCORD_TOKEN" => "discord.token",
        "FLAG_KEY" | "LAUNCHDARKLY_KEY" => "flags.key",
        "FLAG_URL" => "flags.url",
        "STORE_URI" | "COSMOSDB_URI" => "store.uri",
        "REMINDER_INTERVAL" => "reminders.interval_minutes",
        "MEMBER_TIMEZONES" => "member_timezones",
        "LUNCH_LINK" => "lunch_link",
        "RCON_ADDRESS" => "minecraft.address",
        "RCON_PASSWORD" => "minecraft.password",
        _ => return None,
    };
    Some(key)
}

impl OtterConfig {
    /// Load config from a TOML file, the legacy env names, then `OTTER_*`
    /// overrides (`OTTER_DISCORD__TOKEN` sets `discord.token`).
    ///
    /// File lookup order:
    ///   1. Explicit path argument
    ///   2. ~/.otter/otter.toml
    ///
    /// A missing file is not an error.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: OtterConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::raw().filter_map(|key| legacy_env_key(key.as_str()).map(Into::into)))
            .merge(Env::prefixed("OTTER_").split("__"))
            .extract()
            .map_err(|e| OtterError::Config(e.to_string()))?;

        Ok(config)
    }

    /// The bot token, or a config error when it is missing or blank.
    pub fn require_token(&self) -> Result<&str> {
        match self.discord.token.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(OtterError::Config(
                "discord token is required (set DISCORD_TOKEN)".to_string(),
            )),
        }
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.otter/otter.toml", home)
}

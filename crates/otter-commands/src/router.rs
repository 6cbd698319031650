//! Table-driven command dispatch.
//!
//! One [`CommandRouter::dispatch`] call handles one inbound message and
//! sends at most one reply. The steps run in a fixed order: parse, lookup,
//! role resolution, flag gate, handler, reply.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use otter_core::{CommandEvent, InboundMessage, NoopObserver, Observer, Platform};
use tracing::{debug, warn};

use crate::error::Result;
use crate::flags::FeatureGate;
use crate::grammar;

pub const NOT_ALLOWED: &str = "Command not allowed";
/// Sent in place of an empty handler reply.
pub const EMPTY_REPLY: &str = "Nothing to report.";

/// Everything a handler knows about the message it is answering.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub message: InboundMessage,
    pub command: String,
    pub args: String,
    /// Resolved once per invocation; empty when lookup failed.
    pub roles: Vec<String>,
}

impl Invocation {
    /// Guild id, or `0` for direct messages.
    pub fn server(&self) -> u64 {
        self.message.guild_id.unwrap_or(0)
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, invocation: &Invocation) -> Result<String>;
}

/// How a command is gated.
#[derive(Clone, Copy)]
pub enum Gate {
    /// Always allowed.
    Open,
    /// Allowed when the named flag is on for one of the caller's roles.
    Flag(&'static str),
    /// Flag chosen from the argument text.
    ByArgs(fn(&str) -> &'static str),
}

impl Gate {
    pub fn flag_for(&self, args: &str) -> Option<&'static str> {
        match self {
            Gate::Open => None,
            Gate::Flag(name) => Some(*name),
            Gate::ByArgs(select) => Some(select(args)),
        }
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gate::Open => write!(f, "Open"),
            Gate::Flag(name) => write!(f, "Flag({name})"),
            Gate::ByArgs(_) => write!(f, "ByArgs"),
        }
    }
}

#[derive(Clone)]
pub struct CommandDescriptor {
    pub gate: Gate,
    pub handler: Arc<dyn CommandHandler>,
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not addressed to the bot.
    Ignored,
    /// Prefix present but no such command. No reply sent.
    Unknown(String),
    /// Gate refused. `Command not allowed` sent.
    Denied { command: String, flag: &'static str },
    /// Handler succeeded and its reply was sent.
    Replied { command: String },
    /// Handler failed and its error text was sent.
    Failed { command: String, error: String },
}

pub struct CommandRouter {
    prefix: String,
    commands: HashMap<&'static str, CommandDescriptor>,
    gate: FeatureGate,
    platform: Arc<dyn Platform>,
    observer: Arc<dyn Observer>,
}

impl CommandRouter {
    pub fn new(prefix: impl Into<String>, gate: FeatureGate, platform: Arc<dyn Platform>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: HashMap::new(),
            gate,
            platform,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Register `handler` under `name` (lower-case). Re-registering a name
    /// replaces the earlier entry.
    pub fn register(
        &mut self,
        name: &'static str,
        gate: Gate,
        handler: Arc<dyn CommandHandler>,
    ) -> &mut Self {
        if self
            .commands
            .insert(name, CommandDescriptor { gate, handler })
            .is_some()
        {
            warn!(command = name, "command registered twice, keeping the latest");
        }
        self
    }

    pub fn descriptor(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Route one inbound message.
    pub async fn dispatch(&self, message: &InboundMessage, authored_by_self: bool) -> DispatchOutcome {
        let Some(parsed) = grammar::parse(&message.text, &self.prefix, authored_by_self) else {
            return DispatchOutcome::Ignored;
        };

        let Some(descriptor) = self.commands.get(parsed.name.as_str()) else {
            self.observer.record(&CommandEvent::Unknown {
                command: parsed.name.clone(),
            });
            debug!(command = %parsed.name, "unknown command");
            return DispatchOutcome::Unknown(parsed.name);
        };

        self.observer.record(&CommandEvent::Received {
            command: parsed.name.clone(),
            author_id: message.author_id,
        });

        let roles = self.resolve_roles(message).await;
        let invocation = Invocation {
            message: message.clone(),
            command: parsed.name,
            args: parsed.args,
            roles,
        };

        if let Some(flag) = descriptor.gate.flag_for(&invocation.args) {
            let allowed = self
                .gate
                .is_enabled(message.author_id, &invocation.roles, flag)
                .await;
            if !allowed {
                self.observer.record(&CommandEvent::Denied {
                    command: invocation.command.clone(),
                    flag: flag.to_string(),
                });
                self.reply(message, NOT_ALLOWED).await;
                return DispatchOutcome::Denied {
                    command: invocation.command,
                    flag,
                };
            }
        }

        let started = Instant::now();
        match descriptor.handler.handle(&invocation).await {
            Ok(text) => {
                let text = if text.trim().is_empty() {
                    EMPTY_REPLY.to_string()
                } else {
                    text
                };
                self.reply(message, &text).await;
                self.observer.record(&CommandEvent::Completed {
                    command: invocation.command.clone(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
                DispatchOutcome::Replied {
                    command: invocation.command,
                }
            }
            Err(e) => {
                let shown = e.to_string();
                warn!(
                    command = %invocation.command,
                    error = %e.detail(),
                    retryable = e.is_retryable(),
                    "command failed"
                );
                self.reply(message, &shown).await;
                self.observer.record(&CommandEvent::Failed {
                    command: invocation.command.clone(),
                    error: e.detail(),
                });
                DispatchOutcome::Failed {
                    command: invocation.command,
                    error: shown,
                }
            }
        }
    }

    /// Role names of the author, or an empty list when they cannot be
    /// resolved. Direct messages have no guild and therefore no roles.
    async fn resolve_roles(&self, message: &InboundMessage) -> Vec<String> {
        let Some(guild_id) = message.guild_id else {
            return Vec::new();
        };
        match self.platform.member_roles(guild_id, message.author_id).await {
            Ok(roles) => roles,
            Err(e) => {
                self.observer.record(&CommandEvent::RolesUnavailable {
                    author_id: message.author_id,
                    reason: e.to_string(),
                });
                warn!(author_id = message.author_id, guild_id, error = %e, "role lookup failed");
                Vec::new()
            }
        }
    }

    async fn reply(&self, message: &InboundMessage, text: &str) {
        if let Err(e) = self.platform.send_message(message.channel_id, text).await {
            warn!(channel_id = message.channel_id, error = %e, "reply failed");
        }
    }
}

//! Command handling for the otter bot.
//!
//! An inbound message flows through [`grammar::parse`], then the
//! [`router::CommandRouter`] looks the command up, resolves the author's
//! roles, checks the [`flags::FeatureGate`] and runs the handler. Every
//! handled command produces exactly one reply.

pub mod canned;
pub mod clients;
pub mod dice;
pub mod error;
pub mod flags;
pub mod grammar;
pub mod handlers;
pub mod mtg;
pub mod rcon;
pub mod reaction;
pub mod router;
pub mod timezone;

pub use error::{CommandError, Result};
pub use flags::{backend_from_config, DenyAll, FeatureGate, FlagBackend, HttpFlagBackend};
pub use handlers::{register_builtin, CommandDeps};
pub use reaction::handle_reaction;
pub use router::{
    CommandDescriptor, CommandHandler, CommandRouter, DispatchOutcome, Gate, Invocation,
};

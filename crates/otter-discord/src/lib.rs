//! Discord transport for the otter bot: serenity event handling, the
//! [`DiscordPlatform`] used by commands and reminders, and chunked sends.

pub mod adapter;
pub mod error;
pub mod handler;
pub mod platform;
pub mod send;

pub use adapter::DiscordAdapter;
pub use error::DiscordError;
pub use platform::DiscordPlatform;

//! Shared building blocks for the otter bot: configuration, the platform
//! collaborator interface, inbound message types and the command observer.

pub mod config;
pub mod error;
pub mod observe;
pub mod platform;
pub mod types;

pub use config::OtterConfig;
pub use error::{OtterError, Result};
pub use observe::{CommandEvent, NoopObserver, Observer, TracingObserver};
pub use platform::Platform;
pub use types::{InboundMessage, InboundReaction};

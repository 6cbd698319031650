use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use otter_commands::{backend_from_config, register_builtin, CommandDeps, CommandRouter, FeatureGate};
use otter_core::{OtterConfig, Platform, TracingObserver};
use otter_discord::{DiscordAdapter, DiscordPlatform};
use otter_scheduler::{ReminderPoller, ReminderService, ReminderStore, SqliteReminderStore};
use tracing::{info, warn};

mod http;

/// Discord community bot: prefix commands and scheduled reminders.
#[derive(Debug, Parser)]
#[command(name = "otter-gateway", version)]
struct Cli {
    /// Path to otter.toml (defaults to ~/.otter/otter.toml).
    #[arg(long, env = "OTTER_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "otter_gateway=info,otter_commands=info,otter_scheduler=info,otter_discord=info"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = OtterConfig::load(cli.config.as_deref()).context("loading config")?;
    let token = config.require_token()?.to_string();

    // reminder store: schema is created up front so a bad path fails startup
    let store = SqliteReminderStore::new(config.store.path());
    store
        .ensure_schema()
        .await
        .with_context(|| format!("opening reminder store at {}", config.store.path()))?;
    info!(path = %config.store.path(), "reminder store ready");
    let store: Arc<dyn ReminderStore> = Arc::new(store);

    let platform: Arc<dyn Platform> = Arc::new(DiscordPlatform::from_token(&token)?);
    let observer = Arc::new(TracingObserver);

    let gate = FeatureGate::new(backend_from_config(&config.flags)?);
    let reminders = Arc::new(ReminderService::new(Arc::clone(&store)));
    let mut router = CommandRouter::new(config.prefix.clone(), gate, Arc::clone(&platform))
        .with_observer(observer.clone());
    let deps = CommandDeps::from_config(&config, Arc::clone(&platform), reminders)?;
    register_builtin(&mut router, deps);
    let commands = router.command_names().len();
    info!(prefix = %config.prefix, commands, "command router ready");
    let router = Arc::new(router);

    // spawn reminder poller in background
    let interval_minutes = config.reminders.interval_minutes();
    let poller = ReminderPoller::new(
        Arc::clone(&store),
        Arc::clone(&platform),
        config.reminders.interval(),
    )
    .with_observer(observer);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller_task = tokio::spawn(async move { poller.run(shutdown_rx).await });

    let adapter = DiscordAdapter::new(&config.discord, Arc::clone(&router), Arc::clone(&platform))?;
    tokio::spawn(async move { adapter.run().await });
    info!("Discord bot started");

    if let Some(bind) = config.health.bind.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        let state = Arc::new(http::health::HealthState {
            prefix: config.prefix.clone(),
            commands,
            reminder_interval_minutes: interval_minutes,
        });
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .with_context(|| format!("binding health endpoint to {bind}"))?;
        info!("health endpoint listening on {}", bind);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, http::health::router(state)).await {
                warn!(error = %e, "health endpoint stopped");
            }
        });
    }

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("shutting down");

    // signal poller to stop and let an in-flight tick finish
    let _ = shutdown_tx.send(true);
    let _ = poller_task.await;
    Ok(())
}

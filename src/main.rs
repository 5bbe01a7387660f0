//! Racetrack - Application Entry Point
//!
//! This is the main entry point for the Racetrack server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use racetrack::{
    config::CONFIG,
    create_router,
    race::Race,
    services::{
        notification::BackoffPolicy, spawn_heartbeat, LogNotifier, NotificationDispatcher,
        NotificationSink, RaceService,
    },
    state::AppState,
    utils::SystemClock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(race = %CONFIG.race.name, "Starting Racetrack server...");

    // Result notifications
    let (sender, receiver) = mpsc::unbounded_channel();
    NotificationDispatcher::new(
        Arc::new(LogNotifier),
        BackoffPolicy::from_config(&CONFIG.notify),
        &CONFIG.race.name,
        &CONFIG.race.email_from,
    )
    .spawn(receiver);

    let race = Race::new(Arc::new(SystemClock))
        .with_notifications(NotificationSink::new(sender, &CONFIG.race.email_field));
    let state = AppState::new(race, CONFIG.clone());

    // Prize table
    RaceService::load_prize_file(state.race(), &CONFIG.race.prizes_path).await?;

    spawn_heartbeat(state.race().clone());

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        handler_limit = CONFIG.server.effective_handler_limit(),
        "Server listening on http://{}",
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}

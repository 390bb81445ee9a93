use anyhow::Context;
use clap::Parser;
use lobby_relay::{RelayArgs, TopicHub, router, start_turn};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = RelayArgs::parse();

    let turn = match args.turn() {
        Some(config) => Some(start_turn(&config).await?),
        None => None,
    };

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!("Relay listening on {}", listener.local_addr()?);

    axum::serve(listener, router(TopicHub::new()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(turn) = turn {
        turn.close().await?;
    }

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}

//! Broadcast Sequencer - Binary Entry Point
//!
//! Parses the command line, binds the WebSocket server and waits for the
//! first client to start the sequence.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use broadcast_sequencer::api::http;
use broadcast_sequencer::config::{Cli, ServerConfig, DRAIN_TIMEOUT};
use broadcast_sequencer::{AppState, Sequencer, ServerResult};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "broadcast_sequencer=info,sequencer_server=info,tower_http=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let config = ServerConfig::try_from(cli)?;
    let script = config.load_script()?;
    info!(
        addr = %config.addr,
        mode = %config.mode,
        schema = %config.schema,
        events = script.len(),
        "setting up websocket server"
    );

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::new(
        Arc::new(Sequencer::new(script)),
        config.joined_notice()?,
        shutdown.clone(),
    ));

    let listener = http::bind(config.addr).await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    http::serve(listener, Arc::clone(&state)).await?;

    if !state.sessions.drain(DRAIN_TIMEOUT).await {
        warn!(
            remaining = state.sessions.session_count().await,
            "clients still connected at exit"
        );
    }
    if let Some(outcome) = state.trigger.join().await {
        info!(?outcome, emitted = state.trigger.sequencer().emitted(), "sequencer stopped");
    }

    Ok(())
}

//! WebSocket application state

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::broadcaster::FrameBroadcaster;
use super::events::{StatusReport, WsFrame};
use super::session::{ClientSession, SessionManager};
use crate::sequencer::{ConnectTrigger, Sequencer, TriggerDecision};

/// Shared application state for WebSocket connections
pub struct AppState {
    /// Fan-out channel to every connected client
    pub broadcaster: Arc<FrameBroadcaster>,

    /// Connected clients
    pub sessions: SessionManager,

    /// Starts the sequencer on the first connection
    pub trigger: ConnectTrigger,

    /// Cancelled on Ctrl+C or when a run-once sequence completes
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create state around a sequencer. `joined_notice` is broadcast on
    /// every connect.
    pub fn new(
        sequencer: Arc<Sequencer>,
        joined_notice: String,
        shutdown: CancellationToken,
    ) -> Self {
        let broadcaster = Arc::new(FrameBroadcaster::default());
        let trigger = ConnectTrigger::new(
            sequencer,
            broadcaster.clone(),
            joined_notice,
            shutdown.clone(),
        );

        Self {
            broadcaster,
            sessions: SessionManager::new(),
            trigger,
            shutdown,
        }
    }

    /// Subscribe to receive broadcast frames
    pub fn subscribe(&self) -> broadcast::Receiver<WsFrame> {
        self.broadcaster.subscribe()
    }

    /// Register a client and run the connect trigger. The caller must
    /// already hold a subscription so the client sees its own join notice.
    pub async fn on_client_connected(
        &self,
        peer: Option<SocketAddr>,
    ) -> (ClientSession, TriggerDecision) {
        let session = self.sessions.create_session(peer).await;
        info!(
            client_id = %session.client_id,
            peer = ?session.peer,
            "new client has joined"
        );
        let decision = self.trigger.on_client_connected(&session.client_id);
        (session, decision)
    }

    /// Forget a disconnected client
    pub async fn on_client_left(&self, client_id: &str) {
        self.sessions.remove_session(client_id).await;
        self.trigger.on_client_left(client_id);
    }

    /// Snapshot for `GET /status`
    pub async fn status(&self) -> StatusReport {
        let sequencer = self.trigger.sequencer();
        StatusReport {
            sequencer: sequencer.state(),
            connected_clients: self.sessions.session_count().await,
            events_emitted: sequencer.emitted(),
            passes: sequencer.passes(),
            current_sequence_id: self.broadcaster.current_sequence_id(),
        }
    }
}

//! Broadcast Sequencer
//!
//! A local WebSocket test server that plays a timed script of status
//! messages to every connected client, either once or in an endless loop.
//!
//! # Features
//!
//! - **Declarative scripts**: ordered events with fixed or random pacing
//! - **Two wire schemas**: flat (`{"marker":1}`) and tagged
//!   (`{"type":"marker","data":1}`)
//! - **Single trigger**: the first client connection starts the sequence
//! - **Cooperative shutdown**: every wait point honours a cancellation token
//!
//! # Modules
//!
//! - `types`: Core data structures (Event, Pacing, Script)
//! - `script`: Message schemas, reveal pacing, built-in and file scripts
//! - `sequencer`: The sequencer and its connect trigger
//! - `api`: WebSocket transport and HTTP endpoints
//! - `config`: Command-line configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use broadcast_sequencer::api::http;
//! use broadcast_sequencer::{AppState, RunMode, ScriptBuilder, Sequencer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let script = ScriptBuilder::new(RunMode::Loop).build()?;
//!     let shutdown = CancellationToken::new();
//!     let state = Arc::new(AppState::new(
//!         Arc::new(Sequencer::new(script)),
//!         "A new client has joined".to_string(),
//!         shutdown,
//!     ));
//!     let listener = http::bind("127.0.0.1:5000".parse()?).await?;
//!     http::serve(listener, state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod script;
pub mod sequencer;
pub mod types;

// Re-export commonly used items at crate root
pub use api::websocket::AppState;
pub use config::{Cli, ServerConfig};
pub use error::{BroadcastError, ServerError, ServerResult};
pub use script::{Message, MessageSchema, RevealPacing, ScriptBuilder, ScriptFile};
pub use sequencer::{
    Broadcast, ConnectTrigger, SequenceOutcome, Sequencer, SequencerState, TriggerDecision,
};
pub use types::{Event, Pacing, RunMode, Script};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

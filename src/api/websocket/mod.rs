//! WebSocket transport
//!
//! Accepts clients on `/` and `/ws`, tracks them as sessions, and forwards
//! every broadcast frame to each of them.
//!
//! ## Features
//! - One broadcast channel, one receiver per connection
//! - Join notice and sequencer trigger on connect
//! - Queued frames are flushed and a Close frame sent on shutdown

pub mod broadcaster;
pub mod events;
pub mod handler;
pub mod session;
pub mod state;

// Re-export commonly used items
pub use broadcaster::FrameBroadcaster;
pub use events::{StatusReport, WsFrame};
pub use session::{ClientSession, SessionManager};
pub use state::AppState;

//! API module for HTTP and WebSocket endpoints
//!
//! This module provides the WebSocket transport the sequencer broadcasts
//! through, plus health and status endpoints.

pub mod http;
pub mod websocket;

//! Frames and status payloads exchanged over the transport

use serde::Serialize;

use crate::sequencer::SequencerState;

/// One outbound text frame with its broadcast sequence id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WsFrame {
    /// Monotonically increasing id, used for log correlation only
    pub sequence_id: u64,

    /// Text sent to the client verbatim
    pub text: String,
}

impl WsFrame {
    pub fn new(sequence_id: u64, text: impl Into<String>) -> Self {
        Self {
            sequence_id,
            text: text.into(),
        }
    }
}

/// Body of `GET /status`
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub sequencer: SequencerState,
    pub connected_clients: usize,
    pub events_emitted: u64,
    pub passes: u64,
    pub current_sequence_id: u64,
}

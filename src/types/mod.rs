//! Data types for the broadcast sequencer
//!
//! This module contains the declarative script model: events, their pacing,
//! and the script that orders them.

mod event;
mod script;

pub use event::{Event, Pacing};
pub use script::{RunMode, Script};

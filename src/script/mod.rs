//! Script construction
//!
//! - `schema`: wire format of the status messages (flat or tagged)
//! - `pacing`: marker-to-reveal delay policies
//! - `builder`: the built-in run-once and loop scripts
//! - `file`: custom scripts loaded from TOML

pub mod builder;
pub mod file;
pub mod pacing;
pub mod schema;

pub use builder::ScriptBuilder;
pub use file::ScriptFile;
pub use pacing::{shrinking_window, RevealPacing};
pub use schema::{Message, MessageSchema};

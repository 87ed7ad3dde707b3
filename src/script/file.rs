//! Custom scripts loaded from TOML
//!
//! ```toml
//! inter_loop_delay_ms = 2000
//!
//! [[events]]
//! payload = '{"series":"series1"}'
//! delay_after_ms = 500
//!
//! [[events]]
//! payload = '{"marker":1}'
//! delay_after_ms = 1000
//! jitter_max_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};
use crate::types::{Event, Pacing, RunMode, Script};

/// One event as written in a script file
#[derive(Debug, Clone, Deserialize)]
pub struct EventSpec {
    pub payload: String,

    /// Fixed delay, or the lower bound when `jitter_max_ms` is set
    #[serde(default)]
    pub delay_after_ms: u64,

    /// Upper bound of a uniform random delay
    #[serde(default)]
    pub jitter_max_ms: Option<u64>,
}

impl EventSpec {
    fn pacing(&self) -> Pacing {
        match self.jitter_max_ms {
            Some(max) => Pacing::uniform(self.delay_after_ms, max),
            None => Pacing::fixed(self.delay_after_ms),
        }
    }
}

/// Script file contents
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFile {
    /// Overrides the `--delay` flag when present
    #[serde(default)]
    pub inter_loop_delay_ms: Option<u64>,

    #[serde(default)]
    pub events: Vec<EventSpec>,
}

impl ScriptFile {
    /// Load a script file from disk
    pub fn load(path: &Path) -> ServerResult<Self> {
        if !path.is_file() {
            return Err(ServerError::ScriptFile {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ServerError::ScriptFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Parse a script from TOML text
    pub fn from_toml_str(source: &str) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::string(source)).extract()
    }

    /// Turn the file into a script for the given mode.
    ///
    /// A looping script must wait somewhere, otherwise the sequencer would
    /// flood every client without pause.
    pub fn into_script(
        self,
        mode: RunMode,
        default_inter_loop_delay: Duration,
    ) -> ServerResult<Script> {
        let inter_loop_delay = self
            .inter_loop_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(default_inter_loop_delay);

        let events = self
            .events
            .iter()
            .map(|spec| Event::with_pacing(spec.payload.clone(), spec.pacing()))
            .collect();

        let script = Script::new(events, mode, inter_loop_delay);
        if mode == RunMode::Loop
            && !script.is_empty()
            && script.min_pass_duration() + script.inter_loop_delay() == Duration::ZERO
        {
            return Err(ServerError::Config(
                "looping script never pauses: every delay and the inter-loop delay are 0"
                    .to_string(),
            ));
        }
        Ok(script)
    }
}

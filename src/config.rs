//! Command-line configuration
//!
//! The CLI is parsed with clap and turned into an immutable [`ServerConfig`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::{ServerError, ServerResult};
use crate::script::{Message, MessageSchema, RevealPacing, ScriptBuilder, ScriptFile};
use crate::types::{RunMode, Script};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// How long to wait for clients to disconnect after shutdown starts
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// `--run` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunArg {
    /// Run the sequence one time, then exit
    #[value(name = "1", alias = "once")]
    Once,
    /// Loop the sequence until interrupted
    Loop,
}

impl From<RunArg> for RunMode {
    fn from(arg: RunArg) -> Self {
        match arg {
            RunArg::Once => RunMode::Once,
            RunArg::Loop => RunMode::Loop,
        }
    }
}

/// Local WebSocket test server that broadcasts a timed status sequence
#[derive(Debug, Clone, Parser)]
#[command(name = "sequencer-server", version, about)]
pub struct Cli {
    /// Server port to bind to
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// 1: run one time, loop: loop
    #[arg(long, value_enum)]
    pub run: RunArg,

    /// Loop delay in seconds
    #[arg(long, default_value_t = 1.0, value_parser = parse_delay)]
    pub delay: f64,

    /// Message schema sent to clients
    #[arg(long, value_enum, default_value_t = MessageSchema::Flat)]
    pub schema: MessageSchema,

    /// Series per loop pass
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub series: u32,

    /// Random reveal delays that shrink as markers progress
    #[arg(long)]
    pub random_reveal: bool,

    /// TOML file with a custom event script
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,
}

fn parse_delay(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("{raw:?} is not a number of seconds"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("delay must be a non-negative number, got {raw}"));
    }
    Ok(secs)
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub mode: RunMode,
    pub inter_loop_delay: Duration,
    pub schema: MessageSchema,
    pub series_count: u32,
    pub reveal_pacing: RevealPacing,
    pub script_path: Option<PathBuf>,
}

impl TryFrom<Cli> for ServerConfig {
    type Error = ServerError;

    fn try_from(cli: Cli) -> ServerResult<Self> {
        let ip = resolve_host(&cli.host)?;
        let inter_loop_delay = Duration::try_from_secs_f64(cli.delay)
            .map_err(|e| ServerError::Config(format!("invalid delay {}: {e}", cli.delay)))?;

        Ok(Self {
            addr: SocketAddr::new(ip, cli.port),
            mode: cli.run.into(),
            inter_loop_delay,
            schema: cli.schema,
            series_count: cli.series,
            reveal_pacing: if cli.random_reveal {
                RevealPacing::Shrinking
            } else {
                RevealPacing::default()
            },
            script_path: cli.script,
        })
    }
}

impl ServerConfig {
    /// Builder for the built-in script
    pub fn script_builder(&self) -> ScriptBuilder {
        ScriptBuilder::new(self.mode)
            .schema(self.schema)
            .series_count(self.series_count)
            .reveal_pacing(self.reveal_pacing)
            .inter_loop_delay(self.inter_loop_delay)
    }

    /// The script to play: the `--script` file if given, the built-in one
    /// otherwise
    pub fn load_script(&self) -> ServerResult<Script> {
        match &self.script_path {
            Some(path) => ScriptFile::load(path)?.into_script(self.mode, self.inter_loop_delay),
            None => Ok(self.script_builder().build()?),
        }
    }

    /// Notice broadcast whenever a client connects
    pub fn joined_notice(&self) -> ServerResult<String> {
        Ok(self.schema.render(&Message::ClientJoined)?)
    }
}

fn resolve_host(host: &str) -> ServerResult<IpAddr> {
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
    host.parse().map_err(|_| ServerError::InvalidAddress(host.to_string()))
}

//! Wire schemas for the status messages
//!
//! Two message shapes are in use by existing clients. The flat schema keys
//! each message by its kind (`{"marker":1}`); the tagged schema wraps the
//! value in a `type`/`data` pair (`{"type":"marker","data":1}`).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Text of the join notice
pub const CLIENT_JOINED_TEXT: &str = "A new client has joined";

/// A status message before rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    /// A client connected
    ClientJoined,
    /// Start of series `n`, with its display label
    SeriesStart(u32),
    /// Series `n` announced by id only
    Series(u32),
    /// Marker `j` inside a series
    Marker(u32),
    /// Reveal value for marker `j`
    Reveal(u32),
    /// End of one pass; the next starts after the given delay
    LoopFinished(Duration),
}

impl Message {
    /// Numeric value revealed for marker `j`, rounded to two places
    pub fn reveal_value(marker: u32) -> f64 {
        (f64::from(marker) * 0.1 * 100.0).round() / 100.0
    }
}

/// Flat schema frames
#[derive(Serialize)]
#[serde(untagged)]
enum FlatFrame {
    Series {
        series: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Marker { marker: u32 },
    Reveal { reveal: f64 },
}

/// Tagged schema frames
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedFrame {
    Series {
        data: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Marker { data: u32 },
    Reveal { data: f64 },
}

#[derive(Serialize)]
struct Notice<'a> {
    message: &'a str,
}

/// Selectable message schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MessageSchema {
    /// `{"series":"series1","label":"Series 1"}`, `{"marker":1}`, `{"reveal":0.1}`
    #[default]
    Flat,
    /// `{"type":"series","data":"series1","label":"Series 1"}`, `{"type":"marker","data":1}`
    Tagged,
}

impl MessageSchema {
    /// Render a message as the text frame sent to clients
    pub fn render(&self, message: &Message) -> Result<String, serde_json::Error> {
        match (self, *message) {
            (MessageSchema::Flat, Message::ClientJoined) => Ok(CLIENT_JOINED_TEXT.to_string()),
            (MessageSchema::Tagged, Message::ClientJoined) => serde_json::to_string(&Notice {
                message: CLIENT_JOINED_TEXT,
            }),
            // Plain text in both schemas
            (_, Message::LoopFinished(delay)) => Ok(format!(
                "Finished loop - restarting in {:?} seconds",
                delay.as_secs_f64()
            )),
            (MessageSchema::Flat, Message::SeriesStart(n)) => {
                serde_json::to_string(&FlatFrame::Series {
                    series: series_id(n),
                    label: Some(series_label(n)),
                })
            }
            (MessageSchema::Flat, Message::Series(n)) => serde_json::to_string(&FlatFrame::Series {
                series: series_id(n),
                label: None,
            }),
            (MessageSchema::Flat, Message::Marker(j)) => {
                serde_json::to_string(&FlatFrame::Marker { marker: j })
            }
            (MessageSchema::Flat, Message::Reveal(j)) => serde_json::to_string(&FlatFrame::Reveal {
                reveal: Message::reveal_value(j),
            }),
            (MessageSchema::Tagged, Message::SeriesStart(n)) => {
                serde_json::to_string(&TaggedFrame::Series {
                    data: series_id(n),
                    label: Some(series_label(n)),
                })
            }
            (MessageSchema::Tagged, Message::Series(n)) => {
                serde_json::to_string(&TaggedFrame::Series {
                    data: series_id(n),
                    label: None,
                })
            }
            (MessageSchema::Tagged, Message::Marker(j)) => {
                serde_json::to_string(&TaggedFrame::Marker { data: j })
            }
            (MessageSchema::Tagged, Message::Reveal(j)) => {
                serde_json::to_string(&TaggedFrame::Reveal {
                    data: Message::reveal_value(j),
                })
            }
        }
    }
}

impl fmt::Display for MessageSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSchema::Flat => write!(f, "flat"),
            MessageSchema::Tagged => write!(f, "tagged"),
        }
    }
}

fn series_id(n: u32) -> String {
    format!("series{n}")
}

fn series_label(n: u32) -> String {
    format!("Series {n}")
}

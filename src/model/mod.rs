// File: ./src/model/mod.rs
pub mod color;
pub mod event;
pub mod time;

pub use color::EventColor;
pub use event::{CalendarEvent, EventTime, MARKER_TITLE, RawEvent, parse_event, parse_events};
pub use time::{ViewKind, Window, round_to_half_hour};

/// A calendar visible to an account, as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

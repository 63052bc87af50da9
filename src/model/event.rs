// Raw provider events and their normalization into grid-ready records.
use crate::error::{SourceError, SourceResult};
use crate::model::color::EventColor;
use crate::model::time::slot_duration;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Title reserved for the synthetic "current time" marker.
pub const MARKER_TITLE: &str = "CURRENT TIME";

/// One side of a provider event: either an RFC 3339 instant or a bare date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventTime {
    pub fn timed(rfc3339: &str) -> Self {
        Self {
            date_time: Some(rfc3339.to_string()),
            date: None,
        }
    }

    pub fn all_day(date: &str) -> Self {
        Self {
            date_time: None,
            date: Some(date.to_string()),
        }
    }
}

/// An event as returned by the remote calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
}

impl RawEvent {
    pub fn new(summary: &str, start: EventTime, end: EventTime) -> Self {
        Self {
            summary: Some(summary.to_string()),
            status: None,
            start,
            end,
        }
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

/// A normalized event. Start and end are wall-clock times in the single
/// display frame chosen for the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: EventColor,
}

impl CalendarEvent {
    pub fn new(title: &str, start: NaiveDateTime, end: NaiveDateTime, color: EventColor) -> Self {
        Self {
            title: title.to_string(),
            start,
            end,
            color,
        }
    }

    /// The "current time" marker: one slot long, highlight colour.
    pub fn marker(at: NaiveDateTime) -> Self {
        Self::new(MARKER_TITLE, at, at + slot_duration(), EventColor::HIGHLIGHT)
    }

    pub fn is_marker(&self) -> bool {
        self.title == MARKER_TITLE && self.end - self.start == slot_duration()
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

fn parse_error(event: &RawEvent, reason: String) -> SourceError {
    SourceError::Parse {
        event: event.title().to_string(),
        reason,
    }
}

fn parse_instant(event: &RawEvent, which: &str, value: &str) -> SourceResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| parse_error(event, format!("bad {} time '{}': {}", which, value, e)))
}

fn parse_date(event: &RawEvent, which: &str, value: &str) -> SourceResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| parse_error(event, format!("bad {} date '{}': {}", which, value, e)))
}

/// Projects both ends of `raw` into the display frame.
///
/// Timed events are converted to `offset`; both ends receive the same
/// correction. All-day dates are already wall-clock values, so they only get
/// the exclusive-end adjustment: the end becomes one nanosecond before the
/// start of the provider's end date.
fn interval(raw: &RawEvent, offset: FixedOffset) -> SourceResult<(NaiveDateTime, NaiveDateTime)> {
    match (&raw.start.date_time, &raw.start.date) {
        (Some(start), _) => {
            let end = raw
                .end
                .date_time
                .as_deref()
                .ok_or_else(|| parse_error(raw, "timed event without end time".into()))?;
            let start = parse_instant(raw, "start", start)?;
            let end = parse_instant(raw, "end", end)?;
            Ok((
                start.with_timezone(&offset).naive_local(),
                end.with_timezone(&offset).naive_local(),
            ))
        }
        (None, Some(start)) => {
            let end = raw
                .end
                .date
                .as_deref()
                .ok_or_else(|| parse_error(raw, "all-day event without end date".into()))?;
            let start = parse_date(raw, "start", start)?;
            let end = parse_date(raw, "end", end)?;
            Ok((
                start.and_time(NaiveTime::MIN),
                end.and_time(NaiveTime::MIN) - Duration::nanoseconds(1),
            ))
        }
        (None, None) => Err(parse_error(raw, "no start or end time/date".into())),
    }
}

fn build(
    raw: &RawEvent,
    color: EventColor,
    (start, end): (NaiveDateTime, NaiveDateTime),
) -> SourceResult<CalendarEvent> {
    if end <= start {
        return Err(parse_error(
            raw,
            format!("end {} is not after start {}", end, start),
        ));
    }
    Ok(CalendarEvent {
        title: raw.title().to_string(),
        start,
        end,
        color,
    })
}

/// Converts one raw event. The result always satisfies `start < end`.
pub fn parse_event(
    raw: &RawEvent,
    color: EventColor,
    offset: FixedOffset,
) -> SourceResult<CalendarEvent> {
    build(raw, color, interval(raw, offset)?)
}

/// Converts a calendar's event set. Any malformed event fails the whole set.
///
/// Zero-length events cover no slot, so they are left out rather than
/// treated as malformed; an end before the start is still an error.
pub fn parse_events(
    raw: &[RawEvent],
    color: EventColor,
    offset: FixedOffset,
) -> SourceResult<Vec<CalendarEvent>> {
    let mut events = Vec::with_capacity(raw.len());
    for e in raw.iter().filter(|e| !e.is_cancelled()) {
        let span = interval(e, offset)?;
        if span.0 == span.1 {
            log::debug!("Skipping zero-length event '{}' at {}", e.title(), span.0);
            continue;
        }
        events.push(build(e, color, span)?);
    }
    Ok(events)
}

// Next-meeting selection and countdown wording.
use crate::model::{CalendarEvent, EventColor};
use chrono::NaiveDateTime;

/// Earliest event starting strictly after `now`. The current-time marker
/// never counts.
pub fn next_meeting(events: &[CalendarEvent], now: NaiveDateTime) -> Option<&CalendarEvent> {
    events
        .iter()
        .filter(|e| !e.is_marker() && e.start > now)
        .min_by_key(|e| e.start)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Human countdown from `now` to `t`.
pub fn format_time_until(now: NaiveDateTime, t: NaiveDateTime) -> String {
    let d = t - now;
    if d < chrono::Duration::zero() {
        return "Event has already started".to_string();
    }

    let days = d.num_days();
    let hours = d.num_hours() % 24;
    let minutes = d.num_minutes() % 60;

    if days > 0 {
        if hours > 0 {
            return format!("{} and {}", plural(days, "day"), plural(hours, "hour"));
        }
        return plural(days, "day");
    }
    if hours > 0 {
        if minutes > 0 {
            return format!("{} and {}", plural(hours, "hour"), plural(minutes, "minute"));
        }
        return plural(hours, "hour");
    }
    if minutes > 0 {
        return plural(minutes, "minute");
    }
    "Less than a minute".to_string()
}

/// Red within 15 minutes, yellow within the hour, green otherwise.
pub fn urgency_color(now: NaiveDateTime, t: NaiveDateTime) -> EventColor {
    let minutes = (t - now).num_minutes();
    if minutes <= 15 {
        EventColor::Red
    } else if minutes <= 60 {
        EventColor::Yellow
    } else {
        EventColor::Green
    }
}

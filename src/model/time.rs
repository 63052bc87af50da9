// Time helpers: display windows, half-hour rounding and the local wall clock.
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Timelike,
    Utc,
};

/// Length of one grid slot.
pub const SLOT_MINUTES: i64 = 30;

pub fn slot_duration() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

/// Rounds to the closest half-hour boundary using fixed thresholds:
/// `[0, 15)` floors to `:00`, `[15, 45)` goes to `:30`, `[45, 60)` ceils
/// to the next hour.
pub fn round_to_half_hour(t: NaiveDateTime) -> NaiveDateTime {
    let hour_start = t
        .date()
        .and_hms_opt(t.hour(), 0, 0)
        .unwrap_or(t);
    let past_hour = t - hour_start;

    if past_hour >= Duration::minutes(45) {
        hour_start + Duration::hours(1)
    } else if past_hour >= Duration::minutes(15) {
        hour_start + Duration::minutes(30)
    } else {
        hour_start
    }
}

/// The offset used to project UTC instants onto the user's wall clock.
pub fn local_offset(override_minutes: Option<i32>) -> FixedOffset {
    override_minutes
        .and_then(|m| m.checked_mul(60))
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Local::now().offset().fix())
}

/// Current wall-clock time in the normalized frame.
pub fn now_in(offset: FixedOffset) -> NaiveDateTime {
    Utc::now().with_timezone(&offset).naive_local()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Day,
    Week,
}

impl ViewKind {
    pub fn columns(&self) -> usize {
        match self {
            ViewKind::Day => 1,
            ViewKind::Week => 7,
        }
    }
}

/// The date range fetched and displayed in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub days: u32,
}

impl Window {
    /// Monday-aligned week containing `today`, shifted by `week_offset` weeks.
    pub fn week(today: NaiveDate, week_offset: i64) -> Self {
        let since_monday = today.weekday().num_days_from_monday() as i64;
        let monday = today - Duration::days(since_monday) + Duration::weeks(week_offset);
        Self {
            start: monday,
            days: 7,
        }
    }

    /// Single day `today + day_offset`.
    pub fn day(today: NaiveDate, day_offset: i64) -> Self {
        Self {
            start: today + Duration::days(day_offset),
            days: 1,
        }
    }

    pub fn for_view(view: ViewKind, today: NaiveDate, offset: i64) -> Self {
        match view {
            ViewKind::Day => Self::day(today, offset),
            ViewKind::Week => Self::week(today, offset),
        }
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(self.days as i64)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days as i64).map(move |i| self.start + Duration::days(i))
    }

    /// `[timeMin, timeMax)` for a remote query, taking local midnight as the
    /// window boundary.
    pub fn bounds_utc(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let to_utc = |d: NaiveDate| {
            let local = d.and_time(chrono::NaiveTime::MIN);
            (local - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
        };
        (to_utc(self.start), to_utc(self.end()))
    }
}

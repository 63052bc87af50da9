// Seams between the aggregator and whatever actually talks to a calendar.
use crate::config::AccountConfig;
use crate::error::SourceResult;
use crate::model::RawEvent;
use chrono::{DateTime, Utc};
use std::future::Future;

/// Yields the raw events of one calendar inside `[time_min, time_max)`.
pub trait EventSource: Send + Sync + 'static {
    fn fetch(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> impl Future<Output = SourceResult<Vec<RawEvent>>> + Send;
}

/// Resolves an account's credential reference into an authenticated
/// `EventSource`. Called once per account per pass.
pub trait CalendarProvider: Send + Sync + 'static {
    type Client: EventSource;

    fn connect(
        &self,
        account: &AccountConfig,
    ) -> impl Future<Output = SourceResult<Self::Client>> + Send;
}

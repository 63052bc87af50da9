// Concurrent fetch of every configured calendar for one display window.
//
// One task per account, one sub-task per calendar. Sub-tasks push parsed
// events into a results queue or a tagged error into an errors queue. A
// supervisor closes both queues once every account task has joined, and the
// caller drains both queues at the same time so neither can stall the other.
use crate::config::AccountConfig;
use crate::error::{AggregateError, SourceError};
use crate::model::{CalendarEvent, Window, parse_events, round_to_half_hour};
use crate::source::{CalendarProvider, EventSource};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Sender};
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;

const QUEUE_CAPACITY: usize = 100;

/// Either every event of the pass (plus the marker) or the first error seen.
pub type AggregationResult = Result<Vec<CalendarEvent>, AggregateError>;

/// Inputs of one aggregation pass.
#[derive(Debug, Clone)]
pub struct Pass {
    pub window: Window,
    pub offset: FixedOffset,
    pub now: NaiveDateTime,
}

#[derive(Clone)]
struct Queues {
    results: Sender<Vec<CalendarEvent>>,
    errors: Sender<AggregateError>,
    cancel: CancellationToken,
}

impl Queues {
    async fn fail(&self, err: AggregateError) {
        // First failure makes the remaining work pointless.
        self.cancel.cancel();
        let _ = self.errors.send(err).await;
    }
}

/// Runs one pass. On success the marker event for `pass.now` is appended.
///
/// Dropping the returned future stops every fetch it started.
pub async fn aggregate<P: CalendarProvider>(
    provider: Arc<P>,
    accounts: &[AccountConfig],
    pass: &Pass,
) -> AggregationResult {
    let (time_min, time_max) = pass.window.bounds_utc(pass.offset);
    log::debug!(
        "Aggregating {} account(s) for {} day(s) from {}",
        accounts.len(),
        pass.window.days,
        pass.window.start
    );

    let (results_tx, mut results_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (errors_tx, mut errors_rx) = mpsc::channel(QUEUE_CAPACITY);
    let queues = Queues {
        results: results_tx,
        errors: errors_tx,
        cancel: CancellationToken::new(),
    };
    let _cancel_on_drop = queues.cancel.clone().drop_guard();

    let mut account_tasks = JoinSet::new();
    let mut account_names: HashMap<Id, String> = HashMap::new();
    for account in accounts.iter().cloned() {
        let name = account.name.clone();
        let handle = account_tasks.spawn(run_account(
            provider.clone(),
            account,
            time_min,
            time_max,
            pass.offset,
            queues.clone(),
        ));
        account_names.insert(handle.id(), name);
    }

    // Supervisor: owns the last queue handles and drops them after every
    // account task (and so every calendar task) has finished. Kept in a
    // JoinSet so it is aborted, along with the tasks it owns, if this pass
    // is dropped.
    let mut supervisor = JoinSet::new();
    supervisor.spawn(async move {
        while let Some(joined) = account_tasks.join_next_with_id().await {
            if let Err(e) = joined {
                let account = account_names.get(&e.id()).cloned().unwrap_or_default();
                log::error!("Account task for '{}' aborted: {}", account, e);
                queues
                    .fail(AggregateError::for_account(
                        &account,
                        SourceError::Fetch(format!("task aborted: {}", e)),
                    ))
                    .await;
            }
        }
    });

    let mut events = Vec::new();
    let mut first_error: Option<AggregateError> = None;
    let mut results_open = true;
    let mut errors_open = true;
    while results_open || errors_open {
        tokio::select! {
            batch = results_rx.recv(), if results_open => match batch {
                Some(batch) => events.extend(batch),
                None => results_open = false,
            },
            err = errors_rx.recv(), if errors_open => match err {
                Some(err) => {
                    log::warn!("Aggregation error: {}", err);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                None => errors_open = false,
            },
        }
    }
    if let Some(Err(e)) = supervisor.join_next().await {
        log::error!("Aggregation supervisor failed: {}", e);
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    log::info!("Aggregated {} event(s)", events.len());
    events.push(CalendarEvent::marker(round_to_half_hour(pass.now)));
    Ok(events)
}

async fn run_account<P: CalendarProvider>(
    provider: Arc<P>,
    account: AccountConfig,
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    offset: FixedOffset,
    queues: Queues,
) {
    let connected = tokio::select! {
        _ = queues.cancel.cancelled() => return,
        c = provider.connect(&account) => c,
    };
    let client = match connected {
        Ok(c) => Arc::new(c),
        Err(e) => {
            queues.fail(AggregateError::for_account(&account.name, e)).await;
            return;
        }
    };

    let mut calendar_tasks = JoinSet::new();
    let mut calendar_ids: HashMap<Id, String> = HashMap::new();
    for calendar in account.calendars.iter().cloned() {
        let client = client.clone();
        let queues = queues.clone();
        let account_name = account.name.clone();
        let calendar_id = calendar.id.clone();
        let handle = calendar_tasks.spawn(async move {
            let fetched = tokio::select! {
                _ = queues.cancel.cancelled() => return,
                f = client.fetch(&calendar.id, time_min, time_max) => f,
            };
            let parsed = fetched.and_then(|raw| parse_events(&raw, calendar.color, offset));
            match parsed {
                Ok(events) => {
                    log::debug!(
                        "Calendar '{}' of '{}' returned {} event(s)",
                        calendar.id,
                        account_name,
                        events.len()
                    );
                    let _ = queues.results.send(events).await;
                }
                Err(e) => {
                    queues
                        .fail(AggregateError::for_calendar(&account_name, &calendar.id, e))
                        .await;
                }
            }
        });
        calendar_ids.insert(handle.id(), calendar_id);
    }

    while let Some(joined) = calendar_tasks.join_next_with_id().await {
        if let Err(e) = joined {
            let calendar = calendar_ids.get(&e.id()).cloned().unwrap_or_default();
            queues
                .fail(AggregateError::for_calendar(
                    &account.name,
                    &calendar,
                    SourceError::Fetch(format!("task aborted: {}", e)),
                ))
                .await;
        }
    }
}

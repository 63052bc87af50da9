use crate::client::GoogleProvider;
use crate::config::AccountConfig;
use crate::error::AggregateError;
use crate::model::CalendarListEntry;
use crate::source::CalendarProvider;
use futures::stream::{self, StreamExt};

const CONCURRENT_ACCOUNTS: usize = 4;

/// Calendars visible to one account, or why they could not be listed.
pub type AccountCalendars = (String, Result<Vec<CalendarListEntry>, AggregateError>);

/// Lists the calendars of every account, a few accounts at a time. The
/// output keeps the configured account order.
pub async fn list_all_calendars(
    provider: &GoogleProvider,
    accounts: &[AccountConfig],
) -> Vec<AccountCalendars> {
    stream::iter(accounts)
        .map(|acc| async move {
            let listed = match provider.connect(acc).await {
                Ok(client) => client.list_calendars().await,
                Err(e) => Err(e),
            };
            let listed = listed.map_err(|e| AggregateError::for_account(&acc.name, e));
            (acc.name.clone(), listed)
        })
        .buffered(CONCURRENT_ACCOUNTS)
        .collect()
        .await
}

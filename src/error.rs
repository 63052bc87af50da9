//! Error types for a single aggregation pass.

use thiserror::Error;

/// What went wrong while resolving, connecting to, or reading one calendar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("credential error: {0}")]
    Credential(String),

    #[error("client error: {0}")]
    Client(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("parse error for event '{event}': {reason}")]
    Parse { event: String, reason: String },
}

/// A `SourceError` tagged with the account (and calendar, once known) that
/// produced it. The first one observed terminates the pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("account '{account}'{}: {source}", calendar_suffix(.calendar))]
pub struct AggregateError {
    pub account: String,
    pub calendar: Option<String>,
    pub source: SourceError,
}

fn calendar_suffix(calendar: &Option<String>) -> String {
    match calendar {
        Some(id) => format!(", calendar '{}'", id),
        None => String::new(),
    }
}

impl AggregateError {
    pub fn for_account(account: &str, source: SourceError) -> Self {
        Self {
            account: account.to_string(),
            calendar: None,
            source,
        }
    }

    pub fn for_calendar(account: &str, calendar: &str, source: SourceError) -> Self {
        Self {
            account: account.to_string(),
            calendar: Some(calendar.to_string()),
            source,
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_account_and_calendar() {
        let err = AggregateError::for_calendar(
            "work",
            "team@group.calendar.google.com",
            SourceError::Fetch("HTTP 500".into()),
        );
        assert_eq!(
            err.to_string(),
            "account 'work', calendar 'team@group.calendar.google.com': fetch error: HTTP 500"
        );

        let err = AggregateError::for_account("home", SourceError::Credential("missing".into()));
        assert_eq!(err.to_string(), "account 'home': credential error: missing");
    }
}

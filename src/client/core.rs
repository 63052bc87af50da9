// File: src/client/core.rs
use crate::client::auth;
use crate::config::AccountConfig;
use crate::error::{SourceError, SourceResult};
use crate::model::{CalendarListEntry, RawEvent};
use crate::source::{CalendarProvider, EventSource};

use chrono::{DateTime, SecondsFormat, Utc};
use http::{HeaderValue, Request};
use http::header::ACCEPT;
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use tower_http::auth::AddAuthorization;
use url::Url;

pub const GOOGLE_CALENDAR_BASE: &str = "https://www.googleapis.com/calendar/v3";
const PAGE_SIZE: &str = "250";

pub type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;

/// Builds the shared TLS-capable HTTP client. Plain `http` is allowed so a
/// local test server can stand in for the API.
pub fn build_https_client() -> HttpsClient {
    let mut root_store = rustls::RootCertStore::empty();
    let result = rustls_native_certs::load_native_certs();
    for err in &result.errors {
        log::warn!("Skipping unreadable system certificate: {}", err);
    }
    root_store.add_parsable_certificates(result.certs);
    if root_store.is_empty() {
        log::warn!("No valid system certificates found; HTTPS requests will fail");
    }
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let https_connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new()).build(https_connector)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Authenticated Google Calendar REST client for one account.
#[derive(Clone, Debug)]
pub struct GoogleCalendarClient {
    http: AddAuthorization<HttpsClient>,
    base_url: Url,
}

impl GoogleCalendarClient {
    pub fn new(http: HttpsClient, base_url: &str, access_token: &str) -> SourceResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SourceError::Client(format!("invalid base url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::Client(format!(
                "base url '{}' cannot hold a path",
                base_url
            )));
        }
        let access_token = access_token.trim();
        if access_token.is_empty()
            || HeaderValue::from_str(&format!("Bearer {}", access_token)).is_err()
        {
            return Err(SourceError::Client(
                "access token is not a valid header value".into(),
            ));
        }
        Ok(Self {
            http: AddAuthorization::bearer(http, access_token),
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> SourceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Client("base url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> SourceResult<T> {
        let req = Request::get(url.as_str())
            .header(ACCEPT, "application/json")
            .body(String::new())
            .map_err(|e| SourceError::Fetch(e.to_string()))?;

        let resp = self
            .http
            .clone()
            .oneshot(req)
            .await
            .map_err(|e| SourceError::Fetch(format!("GET {}: {}", url.path(), e)))?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| SourceError::Fetch(format!("GET {}: {}", url.path(), e)))?
            .to_bytes();

        if !status.is_success() {
            let snippet: String = String::from_utf8_lossy(&bytes).chars().take(200).collect();
            return Err(SourceError::Fetch(format!(
                "GET {} returned HTTP {}: {}",
                url.path(),
                status,
                snippet.trim()
            )));
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| SourceError::Fetch(format!("undecodable response: {}", e)))
    }

    /// Follows `nextPageToken` until the listing is exhausted.
    async fn get_all_pages<T: DeserializeOwned>(&self, first: Url) -> SourceResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = first.clone();
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let page: Page<T> = self.get_json(&url).await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(items)
    }

    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> SourceResult<Vec<RawEvent>> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events"])?;
        url.query_pairs_mut()
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("showDeleted", "false")
            .append_pair(
                "timeMin",
                &time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .append_pair(
                "timeMax",
                &time_max.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .append_pair("maxResults", PAGE_SIZE);
        self.get_all_pages(url).await
    }

    pub async fn list_calendars(&self) -> SourceResult<Vec<CalendarListEntry>> {
        let url = self.endpoint(&["users", "me", "calendarList"])?;
        self.get_all_pages(url).await
    }
}

impl EventSource for GoogleCalendarClient {
    async fn fetch(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> SourceResult<Vec<RawEvent>> {
        self.list_events(calendar_id, time_min, time_max).await
    }
}

/// Connects accounts to Google Calendar using their on-disk token files.
#[derive(Clone, Debug)]
pub struct GoogleProvider {
    http: HttpsClient,
    base_url: String,
}

impl GoogleProvider {
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_CALENDAR_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: build_https_client(),
            base_url: base_url.to_string(),
        }
    }
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarProvider for GoogleProvider {
    type Client = GoogleCalendarClient;

    async fn connect(&self, account: &AccountConfig) -> SourceResult<GoogleCalendarClient> {
        let token = auth::access_token(&self.http, &account.credentials).await?;
        GoogleCalendarClient::new(self.http.clone(), &self.base_url, &token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SourceResult<GoogleCalendarClient> {
        GoogleCalendarClient::new(build_https_client(), base, "tok")
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let c = client("https://www.googleapis.com/calendar/v3").unwrap();
        assert_eq!(
            c.endpoint(&["calendars", "primary", "events"]).unwrap().as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
        let c = client("http://127.0.0.1:1234/").unwrap();
        assert_eq!(
            c.endpoint(&["users", "me", "calendarList"]).unwrap().as_str(),
            "http://127.0.0.1:1234/users/me/calendarList"
        );
    }

    #[test]
    fn test_page_without_items_decodes_for_any_item_type() {
        let page: Page<CalendarListEntry> = serde_json::from_str(r#"{"kind": "x"}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());

        let page: Page<RawEvent> =
            serde_json::from_str(r#"{"items": [], "nextPageToken": "n2"}"#).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("n2"));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(client("not a url"), Err(SourceError::Client(_))));
        assert!(matches!(
            client("mailto:someone@example.com"),
            Err(SourceError::Client(_))
        ));
        assert!(matches!(
            GoogleCalendarClient::new(build_https_client(), GOOGLE_CALENDAR_BASE, "bad\ntoken"),
            Err(SourceError::Client(_))
        ));
    }
}

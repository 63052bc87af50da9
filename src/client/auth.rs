// Resolves an account's token file into a usable OAuth access token, and
// creates that file on first run through the installed-app consent flow.
use crate::client::core::HttpsClient;
use crate::context::expand_home;
use crate::error::{SourceError, SourceResult};
use chrono::{DateTime, Duration, Utc};
use http::Request;
use http::header::{ACCEPT, CONTENT_TYPE};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Tokens closer than this to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// On-disk token file for one account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredToken {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'static str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl StoredToken {
    pub fn load(path: &Path) -> SourceResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            SourceError::Credential(format!("cannot read '{}': {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            SourceError::Credential(format!("malformed token file '{}': {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// A usable access token at `now`, if the file already holds one.
    pub fn valid_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        match self.expires_at {
            Some(exp) if exp - Duration::seconds(EXPIRY_MARGIN_SECS) <= now => None,
            _ => Some(token),
        }
    }

    /// Exchanges the refresh token for a new access token and stores it in `self`.
    pub async fn refresh(&mut self, http: &HttpsClient, now: DateTime<Utc>) -> SourceResult<()> {
        let body = serde_json::to_string(&RefreshRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            refresh_token: &self.refresh_token,
            grant_type: "refresh_token",
        })
        .map_err(|e| SourceError::Client(e.to_string()))?;

        let parsed = post_token(http, self.token_uri(), "application/json", body).await?;
        self.access_token = Some(parsed.access_token);
        self.expires_at = parsed.expires_in.map(|s| now + Duration::seconds(s));
        if let Some(rt) = parsed.refresh_token {
            self.refresh_token = rt;
        }
        Ok(())
    }
}

async fn post_token(
    http: &HttpsClient,
    uri: &str,
    content_type: &str,
    body: String,
) -> SourceResult<TokenResponse> {
    let req = Request::post(uri)
        .header(CONTENT_TYPE, content_type)
        .header(ACCEPT, "application/json")
        .body(body)
        .map_err(|e| SourceError::Client(format!("invalid token_uri: {}", e)))?;

    let resp = http
        .request(req)
        .await
        .map_err(|e| SourceError::Client(format!("token request failed: {}", e)))?;
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| SourceError::Client(format!("token request failed: {}", e)))?
        .to_bytes();
    if !status.is_success() {
        return Err(SourceError::Client(format!(
            "token request rejected with HTTP {}",
            status
        )));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| SourceError::Client(format!("bad token response: {}", e)))
}

/// OAuth client registration as downloaded from the Google Cloud console.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Reads a `client_secret_*.json` file (either the `installed` or the
    /// `web` flavour).
    pub fn load(path: &Path) -> SourceResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            SourceError::Credential(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let file: ClientSecretFile = serde_json::from_str(&raw).map_err(|e| {
            SourceError::Credential(format!("malformed client secret '{}': {}", path.display(), e))
        })?;
        file.installed.or(file.web).ok_or_else(|| {
            SourceError::Credential(format!(
                "'{}' has neither an \"installed\" nor a \"web\" section",
                path.display()
            ))
        })
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// The page the user opens to grant read-only calendar access.
    pub fn consent_url(&self) -> SourceResult<Url> {
        let base = self.auth_uri.as_deref().unwrap_or(DEFAULT_AUTH_URI);
        let mut url = Url::parse(base)
            .map_err(|e| SourceError::Client(format!("invalid auth_uri '{}': {}", base, e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", CALENDAR_READONLY_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", "state-token");
        Ok(url)
    }

    /// Trades an authorization code for a token set.
    pub async fn exchange_code(
        &self,
        http: &HttpsClient,
        code: &str,
        now: DateTime<Utc>,
    ) -> SourceResult<StoredToken> {
        let token_uri = self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("code", code)
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("redirect_uri", self.redirect_uri())
            .append_pair("grant_type", "authorization_code")
            .finish();

        let parsed = post_token(http, token_uri, "application/x-www-form-urlencoded", body).await?;
        let refresh_token = parsed.refresh_token.ok_or_else(|| {
            SourceError::Client(
                "no refresh token granted; remove the app's access in your Google account and retry"
                    .into(),
            )
        })?;
        Ok(StoredToken {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token,
            access_token: Some(parsed.access_token),
            expires_at: parsed.expires_in.map(|s| now + Duration::seconds(s)),
            token_uri: self.token_uri.clone(),
        })
    }
}

/// Accepts either the bare code or the whole URL the browser was sent to.
pub fn code_from_input(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

/// Exchanges `code` and writes the resulting token file to `token_path`.
pub async fn authorize(
    http: &HttpsClient,
    secret: &ClientSecret,
    code: &str,
    token_path: &Path,
) -> SourceResult<StoredToken> {
    let stored = secret.exchange_code(http, code, Utc::now()).await?;
    if let Some(parent) = token_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            SourceError::Credential(format!("cannot create '{}': {}", parent.display(), e))
        })?;
    }
    stored.save(token_path).map_err(|e| {
        SourceError::Credential(format!("cannot write '{}': {}", token_path.display(), e))
    })?;
    log::info!("Saved new token to {}", token_path.display());
    Ok(stored)
}

/// Path of an account's token file with `~` expanded.
pub fn credentials_path(reference: &str) -> SourceResult<PathBuf> {
    if reference.trim().is_empty() {
        return Err(SourceError::Credential("no credentials path configured".into()));
    }
    expand_home(reference).map_err(|e| SourceError::Credential(e.to_string()))
}

/// Loads the token file behind `reference`, refreshing (and persisting) the
/// access token when it is missing or about to expire.
pub async fn access_token(http: &HttpsClient, reference: &str) -> SourceResult<String> {
    let path = credentials_path(reference)?;
    let mut stored = StoredToken::load(&path)?;
    let now = Utc::now();

    if let Some(token) = stored.valid_access_token(now) {
        return Ok(token.to_string());
    }

    log::info!("Refreshing access token from {}", path.display());
    stored.refresh(http, now).await?;
    if let Err(e) = stored.save(&path) {
        // The fresh token still works for this pass.
        log::warn!("Could not write refreshed token to {}: {}", path.display(), e);
    }
    stored
        .access_token
        .ok_or_else(|| SourceError::Client("token endpoint returned no access token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access: Option<&str>, expires_at: Option<DateTime<Utc>>) -> StoredToken {
        StoredToken {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            refresh_token: "rt".into(),
            access_token: access.map(str::to_string),
            expires_at,
            token_uri: None,
        }
    }

    #[test]
    fn test_valid_access_token_respects_margin() {
        let now = Utc::now();
        assert_eq!(token(None, None).valid_access_token(now), None);
        assert_eq!(token(Some(""), None).valid_access_token(now), None);
        assert_eq!(token(Some("abc"), None).valid_access_token(now), Some("abc"));
        assert_eq!(
            token(Some("abc"), Some(now + Duration::seconds(30))).valid_access_token(now),
            None
        );
        assert_eq!(
            token(Some("abc"), Some(now + Duration::minutes(10))).valid_access_token(now),
            Some("abc")
        );
    }

    #[test]
    fn test_default_token_uri() {
        let mut t = token(None, None);
        assert_eq!(t.token_uri(), DEFAULT_TOKEN_URI);
        t.token_uri = Some("http://localhost/token".into());
        assert_eq!(t.token_uri(), "http://localhost/token");
    }

    #[test]
    fn test_missing_and_malformed_files_are_credential_errors() {
        let ctx = crate::context::TestContext::new();
        let missing = ctx.root.join("nope.json");
        assert!(matches!(
            StoredToken::load(&missing),
            Err(SourceError::Credential(_))
        ));

        let bad = ctx.root.join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            StoredToken::load(&bad),
            Err(SourceError::Credential(_))
        ));

        assert!(matches!(
            credentials_path("  "),
            Err(SourceError::Credential(_))
        ));
    }

    fn secret() -> ClientSecret {
        ClientSecret {
            client_id: "cid.apps.googleusercontent.com".into(),
            client_secret: "shh".into(),
            auth_uri: None,
            token_uri: None,
            redirect_uris: vec![],
        }
    }

    #[test]
    fn test_client_secret_flavours() {
        let ctx = crate::context::TestContext::new();
        let installed = ctx.root.join("installed.json");
        fs::write(
            &installed,
            r#"{"installed": {"client_id": "a", "client_secret": "b",
                "redirect_uris": ["http://localhost"]}}"#,
        )
        .unwrap();
        let s = ClientSecret::load(&installed).unwrap();
        assert_eq!(s.client_id, "a");
        assert_eq!(s.redirect_uri(), "http://localhost");

        let web = ctx.root.join("web.json");
        fs::write(&web, r#"{"web": {"client_id": "w", "client_secret": "x"}}"#).unwrap();
        assert_eq!(ClientSecret::load(&web).unwrap().client_id, "w");

        let neither = ctx.root.join("neither.json");
        fs::write(&neither, r#"{"other": {}}"#).unwrap();
        assert!(matches!(
            ClientSecret::load(&neither),
            Err(SourceError::Credential(_))
        ));
    }

    #[test]
    fn test_consent_url_asks_for_offline_readonly_access() {
        let url = secret().consent_url().unwrap();
        assert!(url.as_str().starts_with(DEFAULT_AUTH_URI));
        let pairs: std::collections::HashMap<String, String> =
            url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "cid.apps.googleusercontent.com");
        assert_eq!(pairs["scope"], CALENDAR_READONLY_SCOPE);
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["redirect_uri"], DEFAULT_REDIRECT_URI);

        let mut bad = secret();
        bad.auth_uri = Some("not a url".into());
        assert!(matches!(bad.consent_url(), Err(SourceError::Client(_))));
    }

    #[test]
    fn test_code_from_input() {
        assert_eq!(code_from_input("  4/0Abc-xyz \n").as_deref(), Some("4/0Abc-xyz"));
        assert_eq!(
            code_from_input("http://localhost/?state=state-token&code=4%2F0Abc&scope=x").as_deref(),
            Some("4/0Abc")
        );
        assert_eq!(code_from_input("http://localhost/?error=access_denied"), None);
        assert_eq!(code_from_input("   "), None);
    }

    #[test]
    fn test_save_and_reload() {
        let ctx = crate::context::TestContext::new();
        let path = ctx.root.join("tok.json");
        let t = token(Some("abc"), None);
        t.save(&path).unwrap();
        assert_eq!(StoredToken::load(&path).unwrap(), t);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}

//! `ApiClient` — reqwest wrapper over the voice-server REST endpoints.
//!
//! All connection details (`base_url`, timeout, bearer token) come from
//! [`ServerConfig`] and the stored session token; nothing is hardcoded.
//! Admin endpoints live under `/admin/api`, per-user endpoints under `/api`.

use serde::Serialize;
use thiserror::Error;

use crate::api::types::{DictionaryEntry, SessionUser, User, WhitelistEntry};
use crate::config::ServerConfig;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors that can occur talking to the voice server.
///
/// Every variant renders to a human-readable message; screens store that
/// string and nothing else, so no variant carries structure the UI would
/// have to interpret.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status; the message is the
    /// server-supplied `detail` when present.
    #[error("{0}")]
    Server(String),

    /// HTTP transport or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be parsed as the expected JSON.
    #[error("failed to parse server response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct UpdateUserBody {
    is_admin: bool,
}

#[derive(Serialize)]
struct CreateWhitelistBody<'a> {
    github_id: &'a str,
}

#[derive(Serialize)]
struct CreateDictionaryBody<'a> {
    pattern: &'a str,
    replacement: &'a str,
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// HTTP client for the voice server's admin and user APIs.
///
/// The `Authorization: Bearer …` header is attached only when a non-empty
/// token is set, so unauthenticated calls (health check, login URL
/// discovery) work against a fresh server.  The token lives behind a lock
/// because login/logout replace it while the client is shared with the sync
/// runner.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: std::sync::RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client from the server section of the application config.
    ///
    /// The underlying reqwest client carries the configured per-request
    /// timeout; a default client is the last-resort fallback if the builder
    /// fails (should never happen in practice).
    pub fn from_config(config: &ServerConfig, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: std::sync::RwLock::new(token),
        }
    }

    /// Replace the bearer token used for subsequent requests (login/logout).
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self
            .token
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_default();
        if token.is_empty() {
            req
        } else {
            req.bearer_auth(token)
        }
    }

    /// Turn a non-2xx response into [`ApiError::Server`], extracting the
    /// FastAPI-style `{"detail": "..."}` message when the body carries one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["detail"].as_str().map(str::to_string));
        Err(ApiError::Server(detail.unwrap_or_else(|| {
            format!("server returned {}", status.as_u16())
        })))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.authorized(self.client.get(self.url(path)));
        let response = Self::check(req.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let req = self.authorized(self.client.delete(self.url(path)));
        Self::check(req.send().await?).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Hit the server root. Succeeds for any reachable server, token or not.
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self.client.get(self.url("/")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Fetch the user behind the current token.
    pub async fn me(&self) -> Result<SessionUser, ApiError> {
        self.get_json("/api/protected").await
    }

    // -----------------------------------------------------------------------
    // Users (admin)
    // -----------------------------------------------------------------------

    /// List all registered users, in server order (newest first).
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("/admin/api/users").await
    }

    /// Change a user's admin flag.
    pub async fn update_user(&self, id: i64, is_admin: bool) -> Result<User, ApiError> {
        let req = self
            .authorized(self.client.patch(self.url(&format!("/admin/api/users/{id}"))))
            .json(&UpdateUserBody { is_admin });
        let response = Self::check(req.send().await?).await?;
        Ok(response.json::<User>().await?)
    }

    /// Delete a user. The server refuses to delete admins.
    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/admin/api/users/{id}")).await
    }

    // -----------------------------------------------------------------------
    // Whitelist (admin)
    // -----------------------------------------------------------------------

    /// List whitelist entries.
    pub async fn list_whitelist(&self) -> Result<Vec<WhitelistEntry>, ApiError> {
        self.get_json("/admin/api/whitelist").await
    }

    /// Permit a GitHub identity to log in.
    pub async fn create_whitelist_entry(
        &self,
        github_id: &str,
    ) -> Result<WhitelistEntry, ApiError> {
        let req = self
            .authorized(self.client.post(self.url("/admin/api/whitelist")))
            .json(&CreateWhitelistBody { github_id });
        let response = Self::check(req.send().await?).await?;
        Ok(response.json::<WhitelistEntry>().await?)
    }

    /// Remove a whitelist entry.
    pub async fn delete_whitelist_entry(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/admin/api/whitelist/{id}")).await
    }

    // -----------------------------------------------------------------------
    // Global dictionary (admin)
    // -----------------------------------------------------------------------

    /// List the global replacement rules applied to every user's output.
    pub async fn list_global_dictionary(&self) -> Result<Vec<DictionaryEntry>, ApiError> {
        self.get_json("/admin/api/dictionary").await
    }

    /// Add a global replacement rule.
    pub async fn create_global_entry(
        &self,
        pattern: &str,
        replacement: &str,
    ) -> Result<DictionaryEntry, ApiError> {
        let req = self
            .authorized(self.client.post(self.url("/admin/api/dictionary")))
            .json(&CreateDictionaryBody {
                pattern,
                replacement,
            });
        let response = Self::check(req.send().await?).await?;
        Ok(response.json::<DictionaryEntry>().await?)
    }

    /// Delete a global replacement rule.
    pub async fn delete_global_entry(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/admin/api/dictionary/{id}")).await
    }

    // -----------------------------------------------------------------------
    // Personal dictionary (current user)
    // -----------------------------------------------------------------------

    /// List the calling user's personal replacement rules.
    pub async fn list_personal_dictionary(&self) -> Result<Vec<DictionaryEntry>, ApiError> {
        self.get_json("/api/dictionary").await
    }

    /// Add a personal replacement rule. The server enforces the per-user
    /// entry cap and answers 400 when it is exceeded.
    pub async fn create_personal_entry(
        &self,
        pattern: &str,
        replacement: &str,
    ) -> Result<DictionaryEntry, ApiError> {
        let req = self
            .authorized(self.client.post(self.url("/api/dictionary")))
            .json(&CreateDictionaryBody {
                pattern,
                replacement,
            });
        let response = Self::check(req.send().await?).await?;
        Ok(response.json::<DictionaryEntry>().await?)
    }

    /// Delete a personal replacement rule.
    pub async fn delete_personal_entry(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/dictionary/{id}")).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> ServerConfig {
        ServerConfig {
            base_url: "http://localhost:8000".into(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _client = ApiClient::from_config(&make_config(), None);
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let config = ServerConfig {
            base_url: "http://localhost:8000/".into(),
            timeout_secs: 10,
        };
        let client = ApiClient::from_config(&config, None);
        assert_eq!(client.url("/api/dictionary"), "http://localhost:8000/api/dictionary");
    }

    #[test]
    fn token_can_be_replaced_after_login() {
        let client = ApiClient::from_config(&make_config(), None);
        client.set_token(Some("jwt-token".into()));
        assert_eq!(
            client.token.read().unwrap().as_deref(),
            Some("jwt-token")
        );
    }

    #[test]
    fn server_error_displays_detail_verbatim() {
        let err = ApiError::Server("Cannot delete admin users".into());
        assert_eq!(err.to_string(), "Cannot delete admin users");
    }

    #[test]
    fn timeout_error_has_fixed_message() {
        assert_eq!(ApiError::Timeout.to_string(), "request timed out");
    }
}

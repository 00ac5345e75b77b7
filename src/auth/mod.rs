//! OAuth callback glue.
//!
//! The server handles the GitHub OAuth dance; this client only needs to
//! build the login URL and read the result out of the callback URL the
//! browser lands on.  The callback carries either `access_token=...` or an
//! `error=...` query parameter.

use percent_encoding::percent_decode_str;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CallbackError
// ---------------------------------------------------------------------------

/// Why a pasted callback URL did not yield a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    /// The server (or GitHub) reported an error, e.g. `access_denied` or
    /// "User not in whitelist".
    #[error("login failed: {0}")]
    Denied(String),

    /// The URL carries neither a token nor an error parameter.
    #[error("callback URL carries no access token")]
    MissingToken,
}

// ---------------------------------------------------------------------------
// Login URL
// ---------------------------------------------------------------------------

/// The server endpoint that starts the GitHub OAuth flow.
pub fn login_url(base_url: &str) -> String {
    format!("{}/auth/login", base_url.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Token extraction
// ---------------------------------------------------------------------------

/// Extract the session token from an OAuth callback URL (or bare query
/// string).
///
/// Accepts `access_token` and the legacy `token` parameter name.  An `error`
/// parameter wins over a missing token so the user sees the server's reason.
pub fn extract_token(callback: &str) -> Result<String, CallbackError> {
    let query = callback
        .split_once('?')
        .map_or(callback, |(_, query)| query);
    let query = query.split_once('#').map_or(query, |(query, _)| query);

    let mut token = None;
    let mut error = None;

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = percent_decode_str(value)
            .decode_utf8()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "access_token" | "token" if !value.is_empty() => token = Some(value),
            // Error reasons are form-encoded prose, so `+` means space here.
            // Tokens keep a literal `+` untouched.
            "error" if !value.is_empty() => error = Some(value.replace('+', " ")),
            _ => {}
        }
    }

    match (token, error) {
        (_, Some(reason)) => Err(CallbackError::Denied(reason)),
        (Some(token), None) => Ok(token),
        (None, None) => Err(CallbackError::MissingToken),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

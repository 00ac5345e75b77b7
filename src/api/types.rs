//! Record types returned by the voice-server REST API.
//!
//! These mirror the server's response models field-for-field; the client
//! never invents or patches fields locally — every value shown in the UI
//! comes from the last successful fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user of the transcription service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    pub id: i64,
    /// GitHub account id (stringified numeric id).
    pub github_id: String,
    /// GitHub login, when known.
    pub github_username: Option<String>,
    /// Avatar URL, when known.
    pub github_avatar: Option<String>,
    /// Whether this user may access the admin endpoints.
    pub is_admin: bool,
    /// When the account was first created on the server.
    pub created_at: DateTime<Utc>,
    /// Most recent login, if the user has logged in since tracking began.
    pub last_login_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// WhitelistEntry
// ---------------------------------------------------------------------------

/// A GitHub identity permitted to log in to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Server-assigned identifier.
    pub id: i64,
    /// GitHub account id being whitelisted.
    pub github_id: String,
    /// Optional display name for the whitelisted account.
    pub github_username: Option<String>,
    /// When the entry was added.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// DictionaryEntry
// ---------------------------------------------------------------------------

/// A text-replacement rule applied to transcription output.
///
/// Used by both the admin-managed global dictionary and each user's personal
/// dictionary; the two differ only in endpoint, not in shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Server-assigned identifier.
    pub id: i64,
    /// Text produced by the recognizer that should be replaced.
    pub pattern: String,
    /// Text to substitute for `pattern`.
    pub replacement: String,
    /// When the rule was added.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SessionUser
// ---------------------------------------------------------------------------

/// The authenticated user behind the current token, as reported by the
/// server's protected endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The user's server-assigned id.
    pub user_id: i64,
    /// GitHub account id.
    pub github_id: String,
    /// Whether the session may use the admin screens.
    pub is_admin: bool,
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Format a server timestamp for table display.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Format an optional timestamp, rendering `None` as a dash.
pub fn format_opt_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map_or_else(|| "—".to_string(), format_timestamp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn user_deserializes_from_server_json() {
        let json = r#"{
            "id": 7,
            "github_id": "1234567",
            "github_username": "octocat",
            "github_avatar": "https://avatars.example/7",
            "is_admin": true,
            "created_at": "2026-01-15T09:30:00Z",
            "last_login_at": null
        }"#;
        let user: User = serde_json::from_str(json).expect("valid user json");
        assert_eq!(user.id, 7);
        assert_eq!(user.github_username.as_deref(), Some("octocat"));
        assert!(user.is_admin);
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn dictionary_entry_round_trips() {
        let entry = DictionaryEntry {
            id: 1,
            pattern: "くろーど".into(),
            replacement: "Claude".into(),
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&entry).expect("serialize");
        let back: DictionaryEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(entry, back);
    }

    #[test]
    fn timestamps_format_for_display() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 9, 8, 5, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2026-03-09 08:05");
        assert_eq!(format_opt_timestamp(Some(&ts)), "2026-03-09 08:05");
        assert_eq!(format_opt_timestamp(None), "—");
    }
}

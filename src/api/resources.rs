//! [`ResourceClient`] implementations for each server record family.
//!
//! These are thin adapters from the generic controller seam onto the typed
//! [`ApiClient`] methods.  Each family defines its own mutation enum with the
//! trim/non-empty validation the controller runs before any network call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::client::{ApiClient, ApiError};
use crate::api::types::{DictionaryEntry, User, WhitelistEntry};
use crate::controller::{InvalidInput, Mutation, ResourceClient};

/// Maximum entries in one user's personal dictionary, matching the server's
/// limit.  The UI disables the add form at the cap; the server still rejects
/// over-limit creates with a 400 if a stale client tries.
pub const PERSONAL_DICTIONARY_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Write operations on the users screen.
#[derive(Debug, Clone, PartialEq)]
pub enum UserMutation {
    /// Grant or revoke admin rights.
    SetAdmin { id: i64, is_admin: bool },
    /// Remove the account.  The server refuses for admins.
    Delete { id: i64 },
}

impl Mutation for UserMutation {
    // No textual payload to validate.
    fn normalized(self) -> Result<Self, InvalidInput> {
        Ok(self)
    }
}

/// Users collaborator, bound to the admin endpoints.
pub struct UsersApi {
    client: Arc<ApiClient>,
}

impl UsersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceClient for UsersApi {
    type Resource = User;
    type Mutation = UserMutation;

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.client.list_users().await
    }

    async fn apply(&self, mutation: UserMutation) -> Result<(), ApiError> {
        match mutation {
            UserMutation::SetAdmin { id, is_admin } => {
                self.client.update_user(id, is_admin).await.map(|_| ())
            }
            UserMutation::Delete { id } => self.client.delete_user(id).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Whitelist
// ---------------------------------------------------------------------------

/// Write operations on the whitelist screen.
#[derive(Debug, Clone, PartialEq)]
pub enum WhitelistMutation {
    /// Permit a GitHub identity.
    Add { github_id: String },
    /// Revoke an entry.
    Delete { id: i64 },
}

impl Mutation for WhitelistMutation {
    fn normalized(self) -> Result<Self, InvalidInput> {
        match self {
            WhitelistMutation::Add { github_id } => {
                let github_id = github_id.trim().to_string();
                if github_id.is_empty() {
                    Err(InvalidInput("GitHub ID must not be empty".into()))
                } else {
                    Ok(WhitelistMutation::Add { github_id })
                }
            }
            delete => Ok(delete),
        }
    }
}

/// Whitelist collaborator, bound to the admin endpoints.
pub struct WhitelistApi {
    client: Arc<ApiClient>,
}

impl WhitelistApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceClient for WhitelistApi {
    type Resource = WhitelistEntry;
    type Mutation = WhitelistMutation;

    async fn list(&self) -> Result<Vec<WhitelistEntry>, ApiError> {
        self.client.list_whitelist().await
    }

    async fn apply(&self, mutation: WhitelistMutation) -> Result<(), ApiError> {
        match mutation {
            WhitelistMutation::Add { github_id } => self
                .client
                .create_whitelist_entry(&github_id)
                .await
                .map(|_| ()),
            WhitelistMutation::Delete { id } => self.client.delete_whitelist_entry(id).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Dictionaries (global and personal)
// ---------------------------------------------------------------------------

/// Which dictionary a collaborator is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryScope {
    /// Admin-managed rules applied to every user's output.
    Global,
    /// The calling user's own rules.
    Personal,
}

/// Write operations on a dictionary screen.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryMutation {
    /// Add a replacement rule.
    Add {
        pattern: String,
        replacement: String,
    },
    /// Remove a rule.
    Delete { id: i64 },
}

impl Mutation for DictionaryMutation {
    fn normalized(self) -> Result<Self, InvalidInput> {
        match self {
            DictionaryMutation::Add {
                pattern,
                replacement,
            } => {
                let pattern = pattern.trim().to_string();
                let replacement = replacement.trim().to_string();
                if pattern.is_empty() {
                    Err(InvalidInput("pattern must not be empty".into()))
                } else if replacement.is_empty() {
                    Err(InvalidInput("replacement must not be empty".into()))
                } else {
                    Ok(DictionaryMutation::Add {
                        pattern,
                        replacement,
                    })
                }
            }
            delete => Ok(delete),
        }
    }
}

/// Dictionary collaborator; the same screen logic serves both scopes.
pub struct DictionaryApi {
    client: Arc<ApiClient>,
    scope: DictionaryScope,
}

impl DictionaryApi {
    pub fn new(client: Arc<ApiClient>, scope: DictionaryScope) -> Self {
        Self { client, scope }
    }
}

#[async_trait]
impl ResourceClient for DictionaryApi {
    type Resource = DictionaryEntry;
    type Mutation = DictionaryMutation;

    async fn list(&self) -> Result<Vec<DictionaryEntry>, ApiError> {
        match self.scope {
            DictionaryScope::Global => self.client.list_global_dictionary().await,
            DictionaryScope::Personal => self.client.list_personal_dictionary().await,
        }
    }

    async fn apply(&self, mutation: DictionaryMutation) -> Result<(), ApiError> {
        match (self.scope, mutation) {
            (
                DictionaryScope::Global,
                DictionaryMutation::Add {
                    pattern,
                    replacement,
                },
            ) => self
                .client
                .create_global_entry(&pattern, &replacement)
                .await
                .map(|_| ()),
            (DictionaryScope::Global, DictionaryMutation::Delete { id }) => {
                self.client.delete_global_entry(id).await
            }
            (
                DictionaryScope::Personal,
                DictionaryMutation::Add {
                    pattern,
                    replacement,
                },
            ) => self
                .client
                .create_personal_entry(&pattern, &replacement)
                .await
                .map(|_| ()),
            (DictionaryScope::Personal, DictionaryMutation::Delete { id }) => {
                self.client.delete_personal_entry(id).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_add_trims_surrounding_whitespace() {
        let m = WhitelistMutation::Add {
            github_id: "  1234567  ".into(),
        }
        .normalized()
        .expect("valid after trim");
        assert_eq!(
            m,
            WhitelistMutation::Add {
                github_id: "1234567".into()
            }
        );
    }

    #[test]
    fn whitelist_add_rejects_blank_id() {
        let err = WhitelistMutation::Add {
            github_id: " \t ".into(),
        }
        .normalized()
        .unwrap_err();
        assert_eq!(err.to_string(), "GitHub ID must not be empty");
    }

    #[test]
    fn dictionary_add_trims_both_fields() {
        let m = DictionaryMutation::Add {
            pattern: " くろーど ".into(),
            replacement: " Claude ".into(),
        }
        .normalized()
        .expect("valid after trim");
        assert_eq!(
            m,
            DictionaryMutation::Add {
                pattern: "くろーど".into(),
                replacement: "Claude".into()
            }
        );
    }

    #[test]
    fn dictionary_add_rejects_blank_pattern_or_replacement() {
        assert!(DictionaryMutation::Add {
            pattern: "  ".into(),
            replacement: "x".into()
        }
        .normalized()
        .is_err());
        assert!(DictionaryMutation::Add {
            pattern: "x".into(),
            replacement: "".into()
        }
        .normalized()
        .is_err());
    }

    #[test]
    fn delete_mutations_pass_through_unchanged() {
        assert_eq!(
            DictionaryMutation::Delete { id: 42 }.normalized().unwrap(),
            DictionaryMutation::Delete { id: 42 }
        );
        assert_eq!(
            UserMutation::Delete { id: 7 }.normalized().unwrap(),
            UserMutation::Delete { id: 7 }
        );
    }
}

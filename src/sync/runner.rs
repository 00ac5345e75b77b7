//! Sync runner — drives every screen's fetch/mutate cycle.
//!
//! [`SyncRunner`] owns the four [`ResourceListController`]s and responds to
//! [`SyncCommand`]s received over a `tokio::sync::mpsc` channel.  Commands
//! are handled strictly one at a time, so a load triggered by a mutation
//! always observes that mutation, and two loads can never interleave.
//!
//! Each controller's observer forwards its [`ListState`] snapshots into the
//! shared event channel, so the UI sees the loading/pending edges while a
//! request is suspended at the network boundary.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::api::{
    ApiClient, ApiError, DictionaryApi, DictionaryEntry, DictionaryMutation, DictionaryScope,
    SessionUser, User, UserMutation, UsersApi, WhitelistApi, WhitelistEntry, WhitelistMutation,
};
use crate::controller::{ListState, ResourceClient, ResourceListController};

// ---------------------------------------------------------------------------
// SessionClient
// ---------------------------------------------------------------------------

/// Collaborator for the current-user fetch that the users screen batches
/// with its list.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Fetch the user behind the current token.
    async fn me(&self) -> Result<SessionUser, ApiError>;
}

#[async_trait]
impl SessionClient for ApiClient {
    async fn me(&self) -> Result<SessionUser, ApiError> {
        ApiClient::me(self).await
    }
}

// ---------------------------------------------------------------------------
// SyncCommand
// ---------------------------------------------------------------------------

/// Commands sent from the UI to the runner.
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// Verify the stored token and fetch the session user.
    LoadSession,

    /// Fetch users + current user as one batch.
    LoadUsers,
    /// Grant or revoke a user's admin rights.
    SetUserAdmin { id: i64, is_admin: bool },
    /// Delete a user account.
    DeleteUser { id: i64 },

    /// Fetch the whitelist.
    LoadWhitelist,
    /// Permit a GitHub identity.
    AddWhitelistEntry { github_id: String },
    /// Revoke a whitelist entry.
    DeleteWhitelistEntry { id: i64 },

    /// Fetch the global dictionary.
    LoadGlobalDictionary,
    /// Add a global replacement rule.
    AddGlobalEntry {
        pattern: String,
        replacement: String,
    },
    /// Delete a global replacement rule.
    DeleteGlobalEntry { id: i64 },

    /// Fetch the calling user's dictionary.
    LoadPersonalDictionary,
    /// Add a personal replacement rule.
    AddPersonalEntry {
        pattern: String,
        replacement: String,
    },
    /// Delete a personal replacement rule.
    DeletePersonalEntry { id: i64 },
}

// ---------------------------------------------------------------------------
// SyncEvent
// ---------------------------------------------------------------------------

/// State snapshots delivered from the runner to the UI.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Session fetch finished; `Err` carries the display message.
    Session(Result<SessionUser, String>),
    /// Users screen snapshot.
    Users(ListState<User>),
    /// Whitelist screen snapshot.
    Whitelist(ListState<WhitelistEntry>),
    /// Global dictionary screen snapshot.
    GlobalDictionary(ListState<DictionaryEntry>),
    /// Personal dictionary screen snapshot.
    PersonalDictionary(ListState<DictionaryEntry>),
}

// ---------------------------------------------------------------------------
// SyncRunner
// ---------------------------------------------------------------------------

/// Owns the API client and all per-screen controllers.
///
/// Create with [`SyncRunner::new`], then call [`run`](Self::run) inside a
/// tokio task; it returns when the command channel closes (app shutdown).
pub struct SyncRunner {
    client: Arc<ApiClient>,
    users: ResourceListController<UsersApi>,
    whitelist: ResourceListController<WhitelistApi>,
    global_dictionary: ResourceListController<DictionaryApi>,
    personal_dictionary: ResourceListController<DictionaryApi>,
    event_tx: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncRunner {
    /// Wire up one controller per screen, each forwarding its snapshots into
    /// `event_tx`.
    pub fn new(client: Arc<ApiClient>, event_tx: mpsc::UnboundedSender<SyncEvent>) -> Self {
        let mut users =
            ResourceListController::new(Arc::new(UsersApi::new(Arc::clone(&client))));
        let tx = event_tx.clone();
        users.observe(Box::new(move |state| {
            let _ = tx.send(SyncEvent::Users(state));
        }));

        let mut whitelist =
            ResourceListController::new(Arc::new(WhitelistApi::new(Arc::clone(&client))));
        let tx = event_tx.clone();
        whitelist.observe(Box::new(move |state| {
            let _ = tx.send(SyncEvent::Whitelist(state));
        }));

        let mut global_dictionary = ResourceListController::new(Arc::new(DictionaryApi::new(
            Arc::clone(&client),
            DictionaryScope::Global,
        )));
        let tx = event_tx.clone();
        global_dictionary.observe(Box::new(move |state| {
            let _ = tx.send(SyncEvent::GlobalDictionary(state));
        }));

        let mut personal_dictionary = ResourceListController::new(Arc::new(DictionaryApi::new(
            Arc::clone(&client),
            DictionaryScope::Personal,
        )));
        let tx = event_tx.clone();
        personal_dictionary.observe(Box::new(move |state| {
            let _ = tx.send(SyncEvent::PersonalDictionary(state));
        }));

        Self {
            client,
            users,
            whitelist,
            global_dictionary,
            personal_dictionary,
            event_tx,
        }
    }

    /// Run until `command_rx` closes.  Spawn as a tokio task from `main()`.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<SyncCommand>) {
        while let Some(command) = command_rx.recv().await {
            log::debug!("sync command: {command:?}");
            self.handle(command).await;
        }
        log::info!("sync runner stopping: command channel closed");
    }

    async fn handle(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::LoadSession => self.load_session().await,

            SyncCommand::LoadUsers => self.load_users().await,
            SyncCommand::SetUserAdmin { id, is_admin } => {
                self.users
                    .mutate(UserMutation::SetAdmin { id, is_admin })
                    .await;
            }
            SyncCommand::DeleteUser { id } => {
                self.users.mutate(UserMutation::Delete { id }).await;
            }

            SyncCommand::LoadWhitelist => self.whitelist.load().await,
            SyncCommand::AddWhitelistEntry { github_id } => {
                self.whitelist
                    .mutate(WhitelistMutation::Add { github_id })
                    .await;
            }
            SyncCommand::DeleteWhitelistEntry { id } => {
                self.whitelist.mutate(WhitelistMutation::Delete { id }).await;
            }

            SyncCommand::LoadGlobalDictionary => self.global_dictionary.load().await,
            SyncCommand::AddGlobalEntry {
                pattern,
                replacement,
            } => {
                self.global_dictionary
                    .mutate(DictionaryMutation::Add {
                        pattern,
                        replacement,
                    })
                    .await;
            }
            SyncCommand::DeleteGlobalEntry { id } => {
                self.global_dictionary
                    .mutate(DictionaryMutation::Delete { id })
                    .await;
            }

            SyncCommand::LoadPersonalDictionary => self.personal_dictionary.load().await,
            SyncCommand::AddPersonalEntry {
                pattern,
                replacement,
            } => {
                self.personal_dictionary
                    .mutate(DictionaryMutation::Add {
                        pattern,
                        replacement,
                    })
                    .await;
            }
            SyncCommand::DeletePersonalEntry { id } => {
                self.personal_dictionary
                    .mutate(DictionaryMutation::Delete { id })
                    .await;
            }
        }
    }

    async fn load_session(&mut self) {
        let result = self.client.me().await.map_err(|e| e.to_string());
        let _ = self.event_tx.send(SyncEvent::Session(result));
    }

    async fn load_users(&mut self) {
        load_users_batch(self.client.as_ref(), &mut self.users, &self.event_tx).await;
    }
}

// ---------------------------------------------------------------------------
// Users batch
// ---------------------------------------------------------------------------

/// Users screen batch: current user first, then the list.  A failure of
/// either fails the whole screen — no partial display.  A failed
/// current-user fetch never issues the list fetch at all.
async fn load_users_batch<S, C>(
    session: &S,
    users: &mut ResourceListController<C>,
    event_tx: &mpsc::UnboundedSender<SyncEvent>,
) where
    S: SessionClient + ?Sized,
    C: ResourceClient,
{
    match session.me().await {
        Ok(session) => {
            let _ = event_tx.send(SyncEvent::Session(Ok(session)));
            users.load().await;
        }
        Err(e) => {
            let message = e.to_string();
            let _ = event_tx.send(SyncEvent::Session(Err(message.clone())));
            users.fail(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    fn session(is_admin: bool) -> SessionUser {
        SessionUser {
            user_id: 1,
            github_id: "1234567".into(),
            is_admin,
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            github_id: format!("{id}"),
            github_username: None,
            github_avatar: None,
            is_admin: false,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            last_login_at: None,
        }
    }

    /// Scripted session collaborator.
    struct FakeSession {
        responses: Mutex<VecDeque<Result<SessionUser, ApiError>>>,
    }

    impl FakeSession {
        fn with(response: Result<SessionUser, ApiError>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([response])),
            }
        }
    }

    #[async_trait]
    impl SessionClient for FakeSession {
        async fn me(&self) -> Result<SessionUser, ApiError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Server("unscripted".into())))
        }
    }

    /// Scripted users collaborator recording how often the list is fetched.
    struct FakeUsers {
        list_responses: Mutex<VecDeque<Result<Vec<User>, ApiError>>>,
        list_calls: Mutex<usize>,
    }

    impl FakeUsers {
        fn new() -> Self {
            Self {
                list_responses: Mutex::new(VecDeque::new()),
                list_calls: Mutex::new(0),
            }
        }

        fn push_list(&self, response: Result<Vec<User>, ApiError>) {
            self.list_responses.lock().unwrap().push_back(response);
        }

        fn list_calls(&self) -> usize {
            *self.list_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ResourceClient for FakeUsers {
        type Resource = User;
        type Mutation = UserMutation;

        async fn list(&self) -> Result<Vec<User>, ApiError> {
            *self.list_calls.lock().unwrap() += 1;
            self.list_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn apply(&self, _mutation: UserMutation) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn drain(
        rx: &mut mpsc::UnboundedReceiver<SyncEvent>,
    ) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn failed_session_fetch_fails_the_screen_without_a_list_fetch() {
        let session_client = FakeSession::with(Err(ApiError::Server("Not authenticated".into())));
        let client = Arc::new(FakeUsers::new());
        let mut users = ResourceListController::new(Arc::clone(&client));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        load_users_batch(&session_client, &mut users, &event_tx).await;

        assert_eq!(client.list_calls(), 0);
        assert_eq!(users.state().error.as_deref(), Some("Not authenticated"));
        assert!(users.state().items.is_empty());
        assert!(!users.state().loading);

        let events = drain(&mut event_rx);
        assert!(matches!(
            events.as_slice(),
            [SyncEvent::Session(Err(message))] if message.as_str() == "Not authenticated"
        ));
    }

    #[tokio::test]
    async fn failed_list_after_good_session_still_reports_the_error() {
        let session_client = FakeSession::with(Ok(session(true)));
        let client = Arc::new(FakeUsers::new());
        client.push_list(Err(ApiError::Server("timeout".into())));
        let mut users = ResourceListController::new(Arc::clone(&client));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        load_users_batch(&session_client, &mut users, &event_tx).await;

        assert_eq!(client.list_calls(), 1);
        assert_eq!(users.state().error.as_deref(), Some("timeout"));
        assert!(users.state().items.is_empty());

        let events = drain(&mut event_rx);
        assert!(matches!(
            events.as_slice(),
            [SyncEvent::Session(Ok(s))] if s.is_admin
        ));
    }

    #[tokio::test]
    async fn successful_batch_delivers_session_then_users() {
        let session_client = FakeSession::with(Ok(session(true)));
        let client = Arc::new(FakeUsers::new());
        client.push_list(Ok(vec![user(2), user(1)]));
        let mut users = ResourceListController::new(Arc::clone(&client));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        load_users_batch(&session_client, &mut users, &event_tx).await;

        assert_eq!(client.list_calls(), 1);
        assert!(users.state().error.is_none());
        assert_eq!(
            users.state().items.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![2, 1]
        );

        let events = drain(&mut event_rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SyncEvent::Session(Ok(_))));
    }
}

//! Generic list-screen controller: fetch, validate, mutate-then-refetch.
//!
//! Every screen in the dashboard is the same lifecycle — fetch a collection,
//! show it, apply a mutation, fetch again.  [`ResourceListController`] owns
//! that lifecycle once, parameterized over a [`ResourceClient`] collaborator,
//! so the users, whitelist and dictionary screens differ only in their record
//! and mutation types.
//!
//! # State machine (per screen instance)
//!
//! ```text
//! Idle(loading) ──▶ Loaded(items) ──[mutate]──▶ Loaded(loading, stale items)
//!       │                ▲                            │
//!       └──▶ Failed(error)┴────────────────────◀──────┘
//! ```
//!
//! Items always reflect the last successful fetch — a mutation never splices
//! the local list; it re-fetches after the server confirms.  A failed
//! operation keeps the previous items and stores a display message.
//!
//! Overlapping loads cannot happen: both operations take `&mut self`, and the
//! sync runner that owns each controller processes commands one at a time.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::ApiError;

// ---------------------------------------------------------------------------
// InvalidInput
// ---------------------------------------------------------------------------

/// A mutation payload was rejected before any network call was made.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidInput(pub String);

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// A write operation against one resource family.
///
/// `normalized` trims textual fields and rejects payloads that are empty
/// after trimming; the controller calls it before touching the network, so a
/// blank form submit costs nothing and surfaces a local error message.
pub trait Mutation: Send + Sized {
    fn normalized(self) -> Result<Self, InvalidInput>;
}

// ---------------------------------------------------------------------------
// ResourceClient
// ---------------------------------------------------------------------------

/// Remote collaborator for one resource family (users, whitelist entries,
/// dictionary entries).
///
/// Implementors must be `Send + Sync` so they can be shared behind an `Arc`
/// with the sync runner task.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// The record type the server returns.
    type Resource: Clone + Send + Sync + 'static;
    /// The write operations this family supports.
    type Mutation: Mutation;

    /// Fetch the full collection, in server order.
    async fn list(&self) -> Result<Vec<Self::Resource>, ApiError>;

    /// Apply one mutation.  The controller discards any response body and
    /// re-fetches instead, so implementors return `()` on success.
    async fn apply(&self, mutation: Self::Mutation) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// ListState
// ---------------------------------------------------------------------------

/// Snapshot of one list screen, cloned out to the UI on every transition.
#[derive(Debug, Clone)]
pub struct ListState<R> {
    /// Records from the last successful fetch, in server order.
    pub items: Vec<R>,
    /// A fetch is in flight.
    pub loading: bool,
    /// Display message from the last failed operation, cleared by the next
    /// successful fetch.
    pub error: Option<String>,
    /// A mutation (and its follow-up fetch) is in flight; the UI disables
    /// mutation triggers while set.
    pub pending_mutation: bool,
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            pending_mutation: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceListController
// ---------------------------------------------------------------------------

/// Observer invoked with a state snapshot after every transition.
pub type OnChange<R> = Box<dyn Fn(ListState<R>) + Send + Sync>;

/// Uniform lifecycle for "list + add + delete (+ update)" screens.
pub struct ResourceListController<C: ResourceClient> {
    client: Arc<C>,
    state: ListState<C::Resource>,
    on_change: Option<OnChange<C::Resource>>,
}

impl<C: ResourceClient> ResourceListController<C> {
    /// Create a controller in the idle state (nothing loaded yet).
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: ListState::default(),
            on_change: None,
        }
    }

    /// Register the observer that receives a snapshot after every state
    /// transition (including the loading/pending edges, so the UI can show
    /// progress during suspension).
    pub fn observe(&mut self, on_change: OnChange<C::Resource>) {
        self.on_change = Some(on_change);
    }

    /// Current state.
    pub fn state(&self) -> &ListState<C::Resource> {
        &self.state
    }

    fn emit(&self) {
        if let Some(on_change) = &self.on_change {
            on_change(self.state.clone());
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Fetch the collection and replace `items` on success.
    ///
    /// On failure the previous items are retained and `error` holds the
    /// collaborator's message.  `loading` is cleared on both paths.  No
    /// retry; the caller may invoke again.
    pub async fn load(&mut self) {
        self.state.loading = true;
        self.emit();

        match self.client.list().await {
            Ok(items) => {
                self.state.items = items;
                self.state.error = None;
            }
            Err(e) => {
                log::warn!("list fetch failed: {e}");
                self.state.error = Some(e.to_string());
            }
        }

        self.state.loading = false;
        self.emit();
    }

    /// Apply a mutation, then fully resynchronize via [`load`](Self::load).
    ///
    /// Rejected locally (no network call) when another mutation is pending or
    /// when the payload fails [`Mutation::normalized`].  On collaborator
    /// failure `items` is left untouched and `error` is set.
    pub async fn mutate(&mut self, mutation: C::Mutation) {
        if self.state.pending_mutation {
            log::debug!("mutation ignored: another mutation is pending");
            return;
        }

        let mutation = match mutation.normalized() {
            Ok(m) => m,
            Err(e) => {
                self.state.error = Some(e.to_string());
                self.emit();
                return;
            }
        };

        self.state.pending_mutation = true;
        self.emit();

        match self.client.apply(mutation).await {
            Ok(()) => {
                // The follow-up fetch starts only after the mutation's
                // network call completed, so it observes the mutation.
                self.load().await;
            }
            Err(e) => {
                log::warn!("mutation failed: {e}");
                self.state.error = Some(e.to_string());
            }
        }

        self.state.pending_mutation = false;
        self.emit();
    }

    /// Record a failure that happened outside `load`/`mutate` but belongs to
    /// this screen — e.g. the companion current-user fetch that the users
    /// screen batches with its list.  Clears in-flight flags.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state.loading = false;
        self.state.pending_mutation = false;
        self.state.error = Some(message.into());
        self.emit();
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

    // A minimal resource family for exercising the controller.

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: i64,
        text: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum NoteMutation {
        Add { text: String },
        Delete { id: i64 },
    }

    impl Mutation for NoteMutation {
        fn normalized(self) -> Result<Self, InvalidInput> {
            match self {
                NoteMutation::Add { text } => {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        Err(InvalidInput("text must not be empty".into()))
                    } else {
                        Ok(NoteMutation::Add { text })
                    }
                }
                delete => Ok(delete),
            }
        }
    }

    /// Scripted collaborator: pops pre-arranged list responses and records
    /// every call it receives.
    struct FakeNotes {
        list_responses: Mutex<VecDeque<Result<Vec<Note>, ApiError>>>,
        apply_responses: Mutex<VecDeque<Result<(), ApiError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeNotes {
        fn new() -> Self {
            Self {
                list_responses: Mutex::new(VecDeque::new()),
                apply_responses: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn push_list(&self, response: Result<Vec<Note>, ApiError>) {
            self.list_responses.lock().unwrap().push_back(response);
        }

        fn push_apply(&self, response: Result<(), ApiError>) {
            self.apply_responses.lock().unwrap().push_back(response);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceClient for FakeNotes {
        type Resource = Note;
        type Mutation = NoteMutation;

        async fn list(&self) -> Result<Vec<Note>, ApiError> {
            self.calls.lock().unwrap().push("list".into());
            self.list_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn apply(&self, mutation: NoteMutation) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(format!("apply {mutation:?}"));
            self.apply_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }

    fn note(id: i64, text: &str) -> Note {
        Note {
            id,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn load_replaces_items_in_server_order() {
        let client = Arc::new(FakeNotes::new());
        client.push_list(Ok(vec![note(2, "b"), note(1, "a")]));

        let mut ctrl = ResourceListController::new(client);
        ctrl.load().await;

        let state = ctrl.state();
        assert_eq!(state.items, vec![note(2, "b"), note(1, "a")]);
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn load_failure_keeps_previous_items_and_sets_error() {
        let client = Arc::new(FakeNotes::new());
        client.push_list(Ok(vec![note(1, "a")]));
        client.push_list(Err(ApiError::Server("timeout".into())));

        let mut ctrl = ResourceListController::new(client);
        ctrl.load().await;
        ctrl.load().await;

        let state = ctrl.state();
        assert_eq!(state.items, vec![note(1, "a")]);
        assert_eq!(state.error.as_deref(), Some("timeout"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn empty_list_yields_empty_items() {
        let client = Arc::new(FakeNotes::new());
        client.push_list(Ok(Vec::new()));

        let mut ctrl = ResourceListController::new(client);
        ctrl.load().await;

        assert!(ctrl.state().items.is_empty());
        assert!(ctrl.state().error.is_none());
    }

    #[tokio::test]
    async fn successful_mutation_triggers_exactly_one_refetch() {
        let client = Arc::new(FakeNotes::new());
        client.push_apply(Ok(()));
        client.push_list(Ok(vec![note(1, "くろーど")]));

        let mut ctrl = ResourceListController::new(Arc::clone(&client));
        ctrl.mutate(NoteMutation::Add {
            text: "  くろーど  ".into(),
        })
        .await;

        assert_eq!(
            client.calls(),
            vec![
                "apply Add { text: \"くろーど\" }".to_string(),
                "list".to_string()
            ]
        );
        assert_eq!(ctrl.state().items, vec![note(1, "くろーど")]);
        assert!(!ctrl.state().pending_mutation);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_items_untouched() {
        let client = Arc::new(FakeNotes::new());
        client.push_list(Ok(vec![note(1, "a")]));
        client.push_apply(Err(ApiError::Server("Cannot delete admin users".into())));

        let mut ctrl = ResourceListController::new(Arc::clone(&client));
        ctrl.load().await;
        ctrl.mutate(NoteMutation::Delete { id: 1 }).await;

        assert_eq!(ctrl.state().items, vec![note(1, "a")]);
        assert_eq!(
            ctrl.state().error.as_deref(),
            Some("Cannot delete admin users")
        );
        // No refetch after a failed mutation.
        assert_eq!(
            client.calls(),
            vec!["list".to_string(), "apply Delete { id: 1 }".to_string()]
        );
    }

    #[tokio::test]
    async fn trimmed_empty_input_never_reaches_the_network() {
        let client = Arc::new(FakeNotes::new());

        let mut ctrl = ResourceListController::new(Arc::clone(&client));
        ctrl.mutate(NoteMutation::Add {
            text: "   ".into(),
        })
        .await;

        assert!(client.calls().is_empty());
        assert_eq!(
            ctrl.state().error.as_deref(),
            Some("text must not be empty")
        );
        assert!(!ctrl.state().pending_mutation);
    }

    #[tokio::test]
    async fn second_mutation_while_pending_is_rejected() {
        let client = Arc::new(FakeNotes::new());

        let mut ctrl = ResourceListController::new(Arc::clone(&client));
        // The pending flag is set for the whole apply + refetch span; a
        // trigger arriving in that window must not reach the network.
        ctrl.state.pending_mutation = true;
        ctrl.mutate(NoteMutation::Delete { id: 42 }).await;

        assert!(client.calls().is_empty());
        assert!(ctrl.state().pending_mutation);
    }

    #[tokio::test]
    async fn observer_sees_loading_edge_then_result() {
        let client = Arc::new(FakeNotes::new());
        client.push_list(Ok(vec![note(1, "a")]));

        let seen: Arc<Mutex<Vec<(bool, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut ctrl = ResourceListController::new(client);
        ctrl.observe(Box::new(move |state: ListState<Note>| {
            sink.lock().unwrap().push((state.loading, state.items.len()));
        }));
        ctrl.load().await;

        let snapshots = seen.lock().unwrap().clone();
        assert_eq!(snapshots, vec![(true, 0), (false, 1)]);
    }

    #[tokio::test]
    async fn fail_records_error_and_clears_flags() {
        let client = Arc::new(FakeNotes::new());
        let mut ctrl = ResourceListController::new(client);
        ctrl.state.loading = true;

        ctrl.fail("session fetch failed");

        assert_eq!(ctrl.state().error.as_deref(), Some("session fetch failed"));
        assert!(!ctrl.state().loading);
        assert!(!ctrl.state().pending_mutation);
    }
}

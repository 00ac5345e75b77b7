//! Command/event bridge between the UI and the REST collaborators.
//!
//! The UI never awaits a network call.  It sends [`SyncCommand`]s over a
//! bounded channel; a single [`SyncRunner`] task owns the [`ApiClient`] and
//! one controller per screen, and pushes [`SyncEvent`] snapshots back over an
//! unbounded channel the UI drains every frame.

pub mod runner;

pub use runner::{SessionClient, SyncCommand, SyncEvent, SyncRunner};

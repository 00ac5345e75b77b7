//! REST collaborators for the voice server.
//!
//! * [`ApiClient`] — bearer-auth HTTP client over the admin/user endpoints.
//! * [`ApiError`] — display-oriented error taxonomy.
//! * [`types`] — record types mirroring the server's response models.
//! * [`resources`] — per-family [`crate::controller::ResourceClient`] impls.

pub mod client;
pub mod resources;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiClient, ApiError};
pub use resources::{
    DictionaryApi, DictionaryMutation, DictionaryScope, UserMutation, UsersApi, WhitelistApi,
    WhitelistMutation, PERSONAL_DICTIONARY_LIMIT,
};
pub use types::{DictionaryEntry, SessionUser, User, WhitelistEntry};

//! voice-admin — administrative client for a voice-transcription service.
//!
//! The service itself (GitHub-OAuth login, whisper.cpp inference, text
//! replacement) runs server-side; this crate is the operator tooling around
//! it:
//!
//! * a desktop dashboard ([`app::AdminApp`]) where admins manage users, the
//!   login whitelist and the global replacement dictionary, and where every
//!   user edits their personal dictionary and hotkey;
//! * a launch wrapper ([`launcher`]) for the external whisper.cpp server
//!   binary.
//!
//! Every screen is one instantiation of
//! [`controller::ResourceListController`] — fetch the collection, mutate
//! through the server, fetch again — bound to a [`api::ApiClient`]-backed
//! collaborator.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod controller;
pub mod hotkey;
pub mod launcher;
pub mod sync;

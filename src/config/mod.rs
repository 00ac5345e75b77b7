//! Configuration module for the voice-admin dashboard.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each concern,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, AuthConfig, HotkeyConfig, ServerConfig, UiConfig};

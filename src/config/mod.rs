//! Configuration module for the Barq voice assistant.
//!
//! Provides [`AssistantConfig`] (top-level settings), one sub-config per
//! subsystem, [`AppPaths`] for the platform config directory, and TOML
//! persistence via `AssistantConfig::load` / `AssistantConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AssistantConfig, BackendConfig, HotkeyConfig, SpeechConfig, SupervisorConfig, UiConfig,
};

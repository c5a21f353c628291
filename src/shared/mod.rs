//! Shared Utilities Module
//!
//! Contains configuration shared across the engine and layouts.

pub mod config;

pub use config::{ConfigError, EngineSettings, LayoutSettings, LogSettings, PanelConfig};

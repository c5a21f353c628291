//! Domain layer
//!
//! Error taxonomy shared by the engine, widgets and layouts.

pub mod errors;

pub use errors::{Result, UiError};

//! panelkit - composable instrument-control panels over a single-threaded
//! presentation engine
//!
//! Worker threads and the main thread alike mutate panels through a
//! [`Dispatcher`](engine::Dispatcher), which runs each unit of work on the
//! one engine thread and blocks until it completes.

// Include the log module first so the log! macro is visible everywhere
#[macro_use]
pub mod log;

pub mod domain;
pub mod engine;
pub mod layout;
pub mod shared;
pub mod widget;

pub use domain::{Result, UiError};
pub use engine::{Dispatcher, PresentationEngine};

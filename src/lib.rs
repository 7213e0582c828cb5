//! Clipmon - clipboard monitor that auto-inserts new clipboard text
//!
//! This library exports the core modules for testing and potential reuse.

pub mod app;
pub mod clipboard;
pub mod host;
pub mod logging;
pub mod scheduler;
pub mod storage;
pub mod transform;
pub mod watcher;

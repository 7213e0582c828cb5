//! Host services consumed by the watcher.
//!
//! Each collaborator is a trait so the watcher can be driven by the terminal
//! implementations here or by in-memory fakes in tests.

pub mod cursor;
pub mod feedback;
pub mod sink;

use std::time::Instant;

pub use cursor::{CursorColor, CursorPainter, TerminalCursor};
pub use feedback::{Cue, Feedback, TerminalFeedback};
pub use sink::{FileSink, StdoutSink, TextSink};

/// Source of the current time for the idle clock
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// User-invokable watcher actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle,
    Start,
    Stop,
}

/// Looks up how the user triggers an action, for hints in messages
pub trait KeyBindings {
    fn describe_bindings_for(&self, action: Action) -> String;
}

/// Bindings of the interactive loop: commands typed on stdin
pub struct StdinBindings;

impl KeyBindings for StdinBindings {
    fn describe_bindings_for(&self, action: Action) -> String {
        match action {
            Action::Toggle => "\"toggle\" or \"t\"".to_string(),
            Action::Start => "\"start\" or \"toggle\"".to_string(),
            Action::Stop => "\"stop\" or \"toggle\"".to_string(),
        }
    }
}

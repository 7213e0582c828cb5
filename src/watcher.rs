//! Clipboard watcher: polls the clipboard and inserts new text.
//!
//! The watcher is stopped until `start()`. While running it owns exactly one
//! repeating timer; every firing calls `tick()`, which pastes new clipboard
//! text or, after a configured idle period without new text, stops the
//! watcher.

use std::time::{Duration, Instant};

use crate::clipboard::ClipboardReader;
use crate::host::{
    Action, Clock, CursorColor, CursorPainter, Cue, Feedback, KeyBindings, TextSink,
};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::storage::{Config, ConfigError};
use crate::transform::TextFilter;

/// Behaviour settings of a watcher
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Cursor color while running, None to leave the cursor alone
    pub cursor_color: Option<String>,
    /// Cue played on start, stop and paste
    pub sound: Cue,
    /// Polling interval
    pub interval: Duration,
    /// Idle period after which the watcher stops itself
    pub timeout: Option<Duration>,
    /// Transform applied to the inserted copy
    pub filter: TextFilter,
    /// Newlines inserted after each paste
    pub trailing_newlines: usize,
}

impl WatcherOptions {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(WatcherOptions {
            cursor_color: config.autoinsert.cursor_color().map(str::to_string),
            sound: config.autoinsert.sound.clone(),
            interval: config.autoinsert.interval()?,
            timeout: config.autoinsert.timeout()?,
            filter: TextFilter::from_config(&config.transform)?,
            trailing_newlines: config.transform.trailing_newlines,
        })
    }
}

/// Host services the watcher drives
pub struct Host {
    pub clipboard: Box<dyn ClipboardReader>,
    pub sink: Box<dyn TextSink>,
    pub feedback: Box<dyn Feedback>,
    pub cursor: Box<dyn CursorPainter>,
    pub bindings: Box<dyn KeyBindings>,
    pub scheduler: Box<dyn Scheduler>,
    pub clock: Box<dyn Clock>,
}

/// Result of a watcher operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
    Pasted,
    Unchanged,
    TimedOut,
}

/// State that only exists while the watcher runs
#[derive(Debug)]
struct WatcherState {
    timer: TimerHandle,
    /// Raw clipboard text last seen, before any transform
    last_seen: Option<String>,
    /// Start time or time of the last paste
    idle_since: Instant,
    /// Cursor color to restore on stop
    saved_cursor_color: Option<CursorColor>,
}

/// Snapshot of the watcher for status reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherStatus {
    pub running: bool,
    pub idle_for: Option<Duration>,
    pub last_seen: Option<String>,
}

impl WatcherStatus {
    /// One-line status report
    pub fn summary(&self) -> String {
        if !self.running {
            return "stopped".to_string();
        }

        let idle = self.idle_for.unwrap_or(Duration::ZERO).as_secs();
        match &self.last_seen {
            Some(text) => format!("running, idle {}s, last clip: {}", idle, preview(text, 40)),
            None => format!("running, idle {}s, no clip yet", idle),
        }
    }
}

/// Polls the clipboard on a timer and inserts new text into the sink
pub struct ClipboardWatcher {
    options: WatcherOptions,
    host: Host,
    state: Option<WatcherState>,
}

impl ClipboardWatcher {
    /// Create a stopped watcher
    pub fn new(options: WatcherOptions, host: Host) -> Self {
        ClipboardWatcher {
            options,
            host,
            state: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn status(&self) -> WatcherStatus {
        let now = self.host.clock.now();
        match &self.state {
            Some(state) => WatcherStatus {
                running: true,
                idle_for: Some(now.saturating_duration_since(state.idle_since)),
                last_seen: state.last_seen.clone(),
            },
            None => WatcherStatus {
                running: false,
                idle_for: None,
                last_seen: None,
            },
        }
    }

    /// Show the current status through the feedback channel
    pub fn report_status(&self) {
        let summary = self.status().summary();
        self.host.feedback.message(&summary);
    }

    /// Stop if running, otherwise start
    pub fn toggle(&mut self) -> Outcome {
        if self.is_running() {
            self.stop()
        } else {
            self.start()
        }
    }

    pub fn start(&mut self) -> Outcome {
        if self.is_running() {
            let hint = self.host.bindings.describe_bindings_for(Action::Stop);
            self.host.feedback.message(&format!(
                "Clipboard monitor already running. Stop with {}.",
                hint
            ));
            return Outcome::AlreadyRunning;
        }

        let last_seen = read_clipboard(self.host.clipboard.as_ref());
        let idle_since = self.host.clock.now();
        let timer = self.host.scheduler.schedule_repeating(self.options.interval);

        let saved_cursor_color = match &self.options.cursor_color {
            Some(color) => {
                let saved = self.host.cursor.current_color();
                self.host.cursor.set_color(&CursorColor::Named(color.clone()));
                Some(saved)
            }
            None => None,
        };

        self.state = Some(WatcherState {
            timer,
            last_seen,
            idle_since,
            saved_cursor_color,
        });

        log::debug!(
            "Watching {} clipboard every {:?}",
            self.host.clipboard.name(),
            self.options.interval
        );

        let hint = self.host.bindings.describe_bindings_for(Action::Stop);
        self.host.feedback.message(&format!(
            "Clipboard monitor started with timer interval {} seconds. Stop with {}.",
            format_seconds(self.options.interval),
            hint
        ));
        self.host.feedback.play_cue(&self.options.sound);
        Outcome::Started
    }

    pub fn stop(&mut self) -> Outcome {
        let Some(state) = self.state.take() else {
            self.host
                .feedback
                .message("Clipboard monitor is not running.");
            return Outcome::NotRunning;
        };

        self.host.scheduler.cancel(state.timer);

        if let Some(color) = state.saved_cursor_color {
            self.host.cursor.set_color(&color);
        }

        self.host.feedback.message("Clipboard monitor stopped.");
        self.host.feedback.play_cue(&self.options.sound);
        Outcome::Stopped
    }

    /// Check the clipboard once; called by the scheduler on every firing
    pub fn tick(&mut self) -> Outcome {
        let Some(state) = self.state.as_ref() else {
            log::debug!("Tick while stopped, ignoring");
            return Outcome::NotRunning;
        };

        let current = read_clipboard(self.host.clipboard.as_ref());
        if let Some(text) = current {
            if state.last_seen.as_deref() != Some(text.as_str()) {
                self.paste(text);
                return Outcome::Pasted;
            }
        }

        let Some(timeout) = self.options.timeout else {
            return Outcome::Unchanged;
        };

        let idle = self.host.clock.now().saturating_duration_since(state.idle_since);
        if idle > timeout {
            log::info!("No clipboard change for {:?}, stopping", idle);
            self.stop();
            self.host.feedback.message(&format!(
                "Clipboard monitor stopped after {} minutes of inactivity.",
                timeout.as_secs() / 60
            ));
            return Outcome::TimedOut;
        }

        Outcome::Unchanged
    }

    /// Insert one clip and record it as seen
    fn paste(&mut self, text: String) {
        let inserted = self.options.filter.apply(&text);
        let now = self.host.clock.now();

        if let Some(state) = self.state.as_mut() {
            state.last_seen = Some(text);
            state.idle_since = now;
        }

        if !inserted.is_empty() {
            if let Err(e) = self.host.sink.insert_at_cursor(&inserted) {
                log::warn!("Failed to insert clip into {}: {:#}", self.host.sink.describe(), e);
            }
        }

        if self.options.trailing_newlines > 0 {
            let newlines = "\n".repeat(self.options.trailing_newlines);
            if let Err(e) = self.host.sink.insert_at_cursor(&newlines) {
                log::warn!("Failed to insert newlines into {}: {:#}", self.host.sink.describe(), e);
            }
        }

        log::debug!("Inserted {} bytes into {}", inserted.len(), self.host.sink.describe());
        self.host.feedback.play_cue(&self.options.sound);
    }
}

/// Clipboard text, with empty text treated as absent
fn read_clipboard(reader: &dyn ClipboardReader) -> Option<String> {
    reader.read_text().filter(|text| !text.is_empty())
}

/// First line of a clip, truncated for display
fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max_chars {
        let cut: String = line.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

fn format_seconds(interval: Duration) -> String {
    let secs = interval.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}", secs as u64)
    } else {
        format!("{}", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::LoopScheduler;
    use crate::transform::DEFAULT_REMOVE_PATTERN;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Shared view of everything the fakes record
    #[derive(Default)]
    struct Recorder {
        clipboard: RefCell<Option<String>>,
        inserted: RefCell<String>,
        cues: Cell<usize>,
        messages: RefCell<Vec<String>>,
        cursor: RefCell<Option<CursorColor>>,
        cursor_sets: Cell<usize>,
        scheduled: Cell<usize>,
        timers: LoopScheduler,
        cancelled: RefCell<Vec<TimerHandle>>,
        elapsed: Cell<Duration>,
    }

    impl Recorder {
        fn copy(&self, text: &str) {
            *self.clipboard.borrow_mut() = Some(text.to_string());
        }

        fn advance(&self, by: Duration) {
            self.elapsed.set(self.elapsed.get() + by);
        }

        fn take_inserted(&self) -> String {
            std::mem::take(&mut *self.inserted.borrow_mut())
        }

        fn last_message(&self) -> String {
            self.messages.borrow().last().cloned().unwrap_or_default()
        }
    }

    struct Fake {
        rec: Rc<Recorder>,
        base: Instant,
    }

    impl ClipboardReader for Fake {
        fn read_text(&self) -> Option<String> {
            self.rec.clipboard.borrow().clone()
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    impl TextSink for Fake {
        fn insert_at_cursor(&mut self, text: &str) -> anyhow::Result<()> {
            self.rec.inserted.borrow_mut().push_str(text);
            Ok(())
        }

        fn describe(&self) -> String {
            "buffer".to_string()
        }
    }

    impl Feedback for Fake {
        fn play_cue(&self, _cue: &Cue) {
            self.rec.cues.set(self.rec.cues.get() + 1);
        }

        fn message(&self, text: &str) {
            self.rec.messages.borrow_mut().push(text.to_string());
        }
    }

    impl CursorPainter for Fake {
        fn current_color(&self) -> CursorColor {
            self.rec
                .cursor
                .borrow()
                .clone()
                .unwrap_or(CursorColor::TerminalDefault)
        }

        fn set_color(&mut self, color: &CursorColor) {
            self.rec.cursor_sets.set(self.rec.cursor_sets.get() + 1);
            *self.rec.cursor.borrow_mut() = Some(color.clone());
        }
    }

    impl KeyBindings for Fake {
        fn describe_bindings_for(&self, _action: Action) -> String {
            "C-c q".to_string()
        }
    }

    impl Scheduler for Fake {
        fn schedule_repeating(&mut self, interval: Duration) -> TimerHandle {
            self.rec.scheduled.set(self.rec.scheduled.get() + 1);
            self.rec.timers.clone().schedule_repeating(interval)
        }

        fn cancel(&mut self, handle: TimerHandle) {
            self.rec.cancelled.borrow_mut().push(handle);
            self.rec.timers.clone().cancel(handle);
        }
    }

    impl Clock for Fake {
        fn now(&self) -> Instant {
            self.base + self.rec.elapsed.get()
        }
    }

    fn options() -> WatcherOptions {
        WatcherOptions {
            cursor_color: Some("red".to_string()),
            sound: Cue::Beep,
            interval: Duration::from_secs(2),
            timeout: Some(Duration::from_secs(5 * 60)),
            filter: TextFilter::new(true, DEFAULT_REMOVE_PATTERN, "").unwrap(),
            trailing_newlines: 2,
        }
    }

    fn watcher_with(options: WatcherOptions) -> (ClipboardWatcher, Rc<Recorder>) {
        let rec = Rc::new(Recorder::default());
        let base = Instant::now();
        let fake = || Box::new(Fake { rec: rec.clone(), base });
        let host = Host {
            clipboard: fake(),
            sink: fake(),
            feedback: fake(),
            cursor: fake(),
            bindings: fake(),
            scheduler: fake(),
            clock: fake(),
        };
        (ClipboardWatcher::new(options, host), rec)
    }

    #[test]
    fn test_start_with_empty_clipboard() {
        let (mut watcher, rec) = watcher_with(options());

        assert_eq!(watcher.start(), Outcome::Started);
        assert!(watcher.is_running());
        assert_eq!(watcher.status().last_seen, None);
        assert_eq!(rec.scheduled.get(), 1);
        assert_eq!(rec.cues.get(), 1);
        assert!(rec.last_message().contains("interval 2 seconds"));
        assert!(rec.last_message().contains("C-c q"));
    }

    #[test]
    fn test_start_twice_is_idempotent() {
        let (mut watcher, rec) = watcher_with(options());
        *rec.cursor.borrow_mut() = Some(CursorColor::Named("white".to_string()));
        rec.copy("seen");

        watcher.start();
        let status = watcher.status();
        assert_eq!(watcher.start(), Outcome::AlreadyRunning);

        assert_eq!(watcher.status(), status);
        assert_eq!(rec.scheduled.get(), 1);
        assert!(rec.timers.is_active());
        assert_eq!(rec.cursor_sets.get(), 1);
        assert!(rec.last_message().contains("already running"));
        assert!(rec.last_message().contains("C-c q"));

        // The saved color is still the pre-start one
        watcher.stop();
        assert_eq!(
            *rec.cursor.borrow(),
            Some(CursorColor::Named("white".to_string()))
        );
    }

    #[test]
    fn test_stop_restores_cursor_after_ticks() {
        let (mut watcher, rec) = watcher_with(options());
        *rec.cursor.borrow_mut() = Some(CursorColor::Named("green".to_string()));

        watcher.start();
        assert_eq!(
            *rec.cursor.borrow(),
            Some(CursorColor::Named("red".to_string()))
        );

        for i in 0..5 {
            rec.copy(&format!("clip {}", i));
            watcher.tick();
            watcher.tick();
        }

        assert_eq!(watcher.stop(), Outcome::Stopped);
        assert_eq!(
            *rec.cursor.borrow(),
            Some(CursorColor::Named("green".to_string()))
        );
        assert_eq!(rec.cancelled.borrow().len(), 1);
        assert!(!rec.timers.is_active());
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_no_cursor_color_leaves_cursor_alone() {
        let mut opts = options();
        opts.cursor_color = None;
        let (mut watcher, rec) = watcher_with(opts);

        watcher.start();
        watcher.stop();
        assert_eq!(rec.cursor_sets.get(), 0);
    }

    #[test]
    fn test_stop_when_not_running() {
        let (mut watcher, rec) = watcher_with(options());

        assert_eq!(watcher.stop(), Outcome::NotRunning);
        assert!(rec.cancelled.borrow().is_empty());
        assert_eq!(rec.cues.get(), 0);
        assert!(rec.last_message().contains("not running"));
    }

    #[test]
    fn test_toggle_alternates() {
        let (mut watcher, rec) = watcher_with(options());

        assert_eq!(watcher.toggle(), Outcome::Started);
        assert_eq!(watcher.toggle(), Outcome::Stopped);
        assert_eq!(watcher.toggle(), Outcome::Started);
        assert_eq!(rec.scheduled.get(), 2);
        assert_eq!(rec.cancelled.borrow().len(), 1);
    }

    #[test]
    fn test_change_pastes_exactly_once() {
        let (mut watcher, rec) = watcher_with(options());
        rec.copy("A");
        watcher.start();

        for _ in 0..5 {
            assert_eq!(watcher.tick(), Outcome::Unchanged);
        }
        assert_eq!(rec.take_inserted(), "");

        rec.copy("B");
        assert_eq!(watcher.tick(), Outcome::Pasted);
        assert_eq!(watcher.tick(), Outcome::Unchanged);
        assert_eq!(rec.take_inserted(), "B\n\n");
    }

    #[test]
    fn test_empty_clipboard_is_no_change() {
        let (mut watcher, rec) = watcher_with(options());
        rec.copy("A");
        watcher.start();

        rec.copy("");
        assert_eq!(watcher.tick(), Outcome::Unchanged);
        *rec.clipboard.borrow_mut() = None;
        assert_eq!(watcher.tick(), Outcome::Unchanged);
        assert_eq!(rec.take_inserted(), "");
        assert_eq!(watcher.status().last_seen.as_deref(), Some("A"));
    }

    #[test]
    fn test_end_to_end_transform() {
        let (mut watcher, rec) = watcher_with(options());
        watcher.start();

        rec.copy("  [3]Hello[citation needed]");
        watcher.tick();

        assert_eq!(rec.take_inserted(), "Hello\n\n");
    }

    #[test]
    fn test_raw_value_kept_for_comparison() {
        let (mut watcher, rec) = watcher_with(options());
        watcher.start();

        rec.copy("\t  indented[1]");
        assert_eq!(watcher.tick(), Outcome::Pasted);
        assert_eq!(rec.take_inserted(), "indented\n\n");
        assert_eq!(watcher.status().last_seen.as_deref(), Some("\t  indented[1]"));

        // Same raw text copied again is not a change
        rec.copy("\t  indented[1]");
        assert_eq!(watcher.tick(), Outcome::Unchanged);

        // The transformed text is a different clip
        rec.copy("indented");
        assert_eq!(watcher.tick(), Outcome::Pasted);
    }

    #[test]
    fn test_paste_plays_cue() {
        let (mut watcher, rec) = watcher_with(options());
        watcher.start();
        let after_start = rec.cues.get();

        rec.copy("x");
        watcher.tick();
        assert_eq!(rec.cues.get(), after_start + 1);
    }

    #[test]
    fn test_trailing_newlines_configurable() {
        let mut opts = options();
        opts.trailing_newlines = 0;
        let (mut watcher, rec) = watcher_with(opts);
        watcher.start();

        rec.copy("one");
        watcher.tick();
        assert_eq!(rec.take_inserted(), "one");
    }

    #[test]
    fn test_idle_timeout_boundary() {
        let (mut watcher, rec) = watcher_with(options());
        rec.copy("A");
        watcher.start();

        rec.advance(Duration::from_secs(299));
        assert_eq!(watcher.tick(), Outcome::Unchanged);
        assert!(watcher.is_running());

        rec.advance(Duration::from_secs(1));
        assert_eq!(watcher.tick(), Outcome::Unchanged);

        rec.advance(Duration::from_secs(1));
        assert_eq!(watcher.tick(), Outcome::TimedOut);
        assert!(!watcher.is_running());
        assert!(rec.last_message().contains("5 minutes of inactivity"));
        assert_eq!(rec.cancelled.borrow().len(), 1);

        // Further firings do nothing
        rec.advance(Duration::from_secs(60));
        assert_eq!(watcher.tick(), Outcome::NotRunning);
        assert_eq!(rec.cancelled.borrow().len(), 1);
    }

    #[test]
    fn test_paste_resets_idle_clock() {
        let (mut watcher, rec) = watcher_with(options());
        watcher.start();

        rec.advance(Duration::from_secs(200));
        rec.copy("fresh");
        assert_eq!(watcher.tick(), Outcome::Pasted);
        assert_eq!(watcher.status().idle_for, Some(Duration::ZERO));

        rec.advance(Duration::from_secs(200));
        assert_eq!(watcher.tick(), Outcome::Unchanged);
        assert!(watcher.is_running());

        rec.advance(Duration::from_secs(101));
        assert_eq!(watcher.tick(), Outcome::TimedOut);
    }

    #[test]
    fn test_unchanged_ticks_do_not_reset_idle_clock() {
        let (mut watcher, rec) = watcher_with(options());
        watcher.start();

        for _ in 0..10 {
            rec.advance(Duration::from_secs(20));
            watcher.tick();
        }
        assert_eq!(watcher.status().idle_for, Some(Duration::from_secs(200)));
    }

    #[test]
    fn test_no_timeout_runs_forever() {
        let mut opts = options();
        opts.timeout = None;
        let (mut watcher, rec) = watcher_with(opts);
        watcher.start();

        rec.advance(Duration::from_secs(24 * 60 * 60));
        assert_eq!(watcher.tick(), Outcome::Unchanged);
        assert!(watcher.is_running());
    }

    #[test]
    fn test_status_summary() {
        let stopped = WatcherStatus {
            running: false,
            idle_for: None,
            last_seen: None,
        };
        assert_eq!(stopped.summary(), "stopped");

        let running = WatcherStatus {
            running: true,
            idle_for: Some(Duration::from_secs(42)),
            last_seen: Some("first line\nsecond".to_string()),
        };
        assert_eq!(running.summary(), "running, idle 42s, last clip: first line");
        assert_eq!(preview("abcdef", 3), "abc...");
    }

    #[test]
    fn test_report_status_goes_through_feedback() {
        let (mut watcher, rec) = watcher_with(options());

        watcher.report_status();
        assert_eq!(rec.last_message(), "stopped");

        rec.copy("hello");
        watcher.start();
        rec.advance(Duration::from_secs(7));
        watcher.report_status();
        assert_eq!(rec.last_message(), "running, idle 7s, last clip: hello");
    }

    #[test]
    fn test_options_reject_overflowing_timeout() {
        let mut config = Config::default();
        config.autoinsert.timeout_minutes = u64::MAX;
        assert!(matches!(
            WatcherOptions::from_config(&config),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.autoinsert.cursor_color = String::new();
        config.autoinsert.timeout_minutes = 0;
        config.autoinsert.interval_seconds = 0.5;

        let opts = WatcherOptions::from_config(&config).unwrap();
        assert_eq!(opts.cursor_color, None);
        assert_eq!(opts.timeout, None);
        assert_eq!(opts.interval, Duration::from_millis(500));
        assert_eq!(format_seconds(opts.interval), "0.5");
    }
}

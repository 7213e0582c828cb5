//! Repeating timer primitive used by the watcher.
//!
//! The watcher only schedules and cancels. Whoever drives the event loop asks
//! the scheduler when the next tick is due and whether one is due now.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Opaque handle of a scheduled repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

/// Recurring timer facility
pub trait Scheduler {
    /// Start a timer firing every `interval`, first firing one interval from now
    fn schedule_repeating(&mut self, interval: Duration) -> TimerHandle;

    /// Cancel a timer; unknown or already cancelled handles are ignored
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug)]
struct ActiveTimer {
    handle: TimerHandle,
    interval: Duration,
    next_fire: Instant,
}

#[derive(Debug, Default)]
struct TimerTable {
    next_id: u64,
    active: Option<ActiveTimer>,
}

/// Scheduler for a single-threaded event loop
///
/// Clones share the same timer table: the watcher holds one clone, the loop
/// holds another to find out when to call `tick()`. Only one timer can be
/// active; scheduling a new one replaces the old.
#[derive(Debug, Clone, Default)]
pub struct LoopScheduler {
    table: Rc<RefCell<TimerTable>>,
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a timer is currently scheduled
    pub fn is_active(&self) -> bool {
        self.table.borrow().active.is_some()
    }

    /// Time left until the active timer fires, None when idle
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.table
            .borrow()
            .active
            .as_ref()
            .map(|timer| timer.next_fire.saturating_duration_since(now))
    }

    /// Consume a due firing, if any, and arm the next one
    ///
    /// Missed firings are coalesced: a loop that fell behind gets a single
    /// tick and the next firing is one interval after `now`.
    pub fn take_due(&self, now: Instant) -> bool {
        let mut table = self.table.borrow_mut();
        let Some(timer) = table.active.as_mut() else {
            return false;
        };

        if now < timer.next_fire {
            return false;
        }

        timer.next_fire += timer.interval;
        if timer.next_fire <= now {
            timer.next_fire = now + timer.interval;
        }
        true
    }
}

impl Scheduler for LoopScheduler {
    fn schedule_repeating(&mut self, interval: Duration) -> TimerHandle {
        let mut table = self.table.borrow_mut();
        table.next_id += 1;
        let handle = TimerHandle(table.next_id);

        if let Some(old) = table.active.take() {
            log::warn!("Replacing active timer {:?}", old.handle);
        }

        table.active = Some(ActiveTimer {
            handle,
            interval,
            next_fire: Instant::now() + interval,
        });
        log::debug!("Scheduled timer {:?} every {:?}", handle, interval);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut table = self.table.borrow_mut();
        let matches = table
            .active
            .as_ref()
            .is_some_and(|timer| timer.handle == handle);

        if matches {
            table.active = None;
            log::debug!("Cancelled timer {:?}", handle);
        }
    }
}

//! Interactive event loop.
//!
//! The loop owns the watcher on one thread. Commands typed on stdin arrive
//! over a channel from a reader thread; between commands the loop sleeps
//! until the scheduler's next firing and then ticks the watcher, so ticks
//! and commands never overlap.

use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Instant;

use crate::clipboard::ClipboardReader;
use crate::host::{StdinBindings, SystemClock, TerminalCursor, TerminalFeedback, TextSink};
use crate::scheduler::LoopScheduler;
use crate::watcher::{ClipboardWatcher, Host, Outcome, WatcherOptions};

/// Commands accepted on stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Start,
    Stop,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "t" | "toggle" => Ok(Command::Toggle),
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "s" | "status" => Ok(Command::Status),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!(
                "unknown command {:?} (try toggle, start, stop, status, quit)",
                other
            )),
        }
    }
}

/// Main application state
pub struct App {
    watcher: ClipboardWatcher,
    scheduler: LoopScheduler,
}

impl App {
    /// Build an app driving the terminal host services
    pub fn new(
        options: WatcherOptions,
        clipboard: Box<dyn ClipboardReader>,
        sink: Box<dyn TextSink>,
    ) -> Self {
        let scheduler = LoopScheduler::new();
        let host = Host {
            clipboard,
            sink,
            feedback: Box::new(TerminalFeedback),
            cursor: Box::new(TerminalCursor::new()),
            bindings: Box::new(StdinBindings),
            scheduler: Box::new(scheduler.clone()),
            clock: Box::new(SystemClock),
        };
        Self::with_host(options, host, scheduler)
    }

    /// Build an app around an existing host; `scheduler` must be the
    /// scheduler the host hands to the watcher
    pub fn with_host(options: WatcherOptions, host: Host, scheduler: LoopScheduler) -> Self {
        App {
            watcher: ClipboardWatcher::new(options, host),
            scheduler,
        }
    }

    pub fn watcher(&self) -> &ClipboardWatcher {
        &self.watcher
    }

    /// Handle one command; returns false when the loop should exit
    pub fn handle_command(&mut self, command: Command) -> bool {
        log::debug!("Command: {:?}", command);
        match command {
            Command::Toggle => {
                self.watcher.toggle();
            }
            Command::Start => {
                self.watcher.start();
            }
            Command::Stop => {
                self.watcher.stop();
            }
            Command::Status => {
                self.watcher.report_status();
            }
            Command::Quit => {
                // Restore the cursor before leaving
                if self.watcher.is_running() {
                    self.watcher.stop();
                }
                return false;
            }
        }
        true
    }

    /// Fire the watcher if its timer is due
    pub fn poll_timer(&mut self, now: Instant) -> Option<Outcome> {
        if self.scheduler.take_due(now) {
            Some(self.watcher.tick())
        } else {
            None
        }
    }

    /// Run until quit, or until input is closed and the watcher has stopped
    pub fn run(&mut self, commands: Receiver<Command>) -> Result<()> {
        let mut input_open = true;

        loop {
            let wait = self.scheduler.time_until_due(Instant::now());

            if input_open {
                let received = match wait {
                    Some(wait) => commands.recv_timeout(wait),
                    None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };

                match received {
                    Ok(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        log::info!("Command input closed");
                        input_open = false;
                    }
                }
            } else {
                match wait {
                    Some(wait) => thread::sleep(wait),
                    None => break,
                }
            }

            self.poll_timer(Instant::now());
        }

        log::info!("Event loop finished");
        Ok(())
    }
}

/// Spawn the thread that turns stdin lines into commands
pub fn spawn_command_reader(tx: Sender<Command>) -> Result<()> {
    thread::Builder::new()
        .name("stdin-commands".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("clipmon: {}", e),
                }
            }
        })
        .context("Failed to spawn command reader thread")?;

    Ok(())
}

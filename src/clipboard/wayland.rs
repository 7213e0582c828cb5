use anyhow::{Context, Result};
use std::process::{Command, Stdio};

use super::backend::ClipboardReader;

/// Wayland clipboard backend using wl-clipboard tools
/// Requires wl-paste to be installed
pub struct WaylandBackend;

impl WaylandBackend {
    /// Create a new Wayland clipboard backend
    pub fn new() -> Result<Self> {
        // Verify wl-paste is available
        Command::new("wl-paste")
            .arg("--version")
            .output()
            .context("wl-paste not found. Install wl-clipboard package")?;

        log::debug!("WaylandBackend initialized successfully");
        Ok(WaylandBackend)
    }
}

impl ClipboardReader for WaylandBackend {
    fn read_text(&self) -> Option<String> {
        // wl-paste exits non-zero when nothing is copied
        let output = Command::new("wl-paste")
            .arg("--no-newline")
            .arg("--type")
            .arg("text")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) => super::text_from_output("wl-paste", output),
            Err(e) => {
                log::warn!("Failed to run wl-paste: {}", e);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "Wayland"
    }
}

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

use super::backend::ClipboardReader;

/// X11 clipboard backend using xclip
/// Reads the CLIPBOARD selection, not PRIMARY
pub struct X11Backend;

impl X11Backend {
    /// Create a new X11 clipboard backend
    pub fn new() -> Result<Self> {
        Command::new("xclip")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("xclip not found. Install xclip package")?;

        log::debug!("X11Backend initialized successfully");
        Ok(X11Backend)
    }
}

impl ClipboardReader for X11Backend {
    fn read_text(&self) -> Option<String> {
        let output = Command::new("xclip")
            .args(["-selection", "clipboard", "-out", "-target", "UTF8_STRING"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) => super::text_from_output("xclip", output),
            Err(e) => {
                log::warn!("Failed to run xclip: {}", e);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "X11"
    }
}

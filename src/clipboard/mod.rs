pub mod backend;
pub mod wayland;
pub mod x11;

use anyhow::{anyhow, Result};
use std::env;
use std::process::Output;

pub use backend::ClipboardReader;
pub use wayland::WaylandBackend;
pub use x11::X11Backend;

/// Create a clipboard reader based on the current display server
/// Wayland is preferred when both WAYLAND_DISPLAY and DISPLAY are set
/// Returns error if no supported display server is detected
pub fn create_reader() -> Result<Box<dyn ClipboardReader>> {
    if env::var("WAYLAND_DISPLAY").is_ok() {
        log::info!("Detected Wayland display server");
        let backend = WaylandBackend::new()?;
        return Ok(Box::new(backend));
    }

    if env::var("DISPLAY").is_ok() {
        log::info!("Detected X11 display server");
        let backend = X11Backend::new()?;
        return Ok(Box::new(backend));
    }

    Err(anyhow!(
        "No supported display server detected. Set WAYLAND_DISPLAY or DISPLAY"
    ))
}

/// Turn the output of a clipboard tool into clipboard text
/// A failed run, empty output or non-UTF-8 bytes all mean "no text"
fn text_from_output(tool: &str, output: Output) -> Option<String> {
    if !output.status.success() {
        log::trace!("{} exited with {}", tool, output.status);
        return None;
    }

    if output.stdout.is_empty() {
        return None;
    }

    match String::from_utf8(output.stdout) {
        Ok(text) => Some(text),
        Err(_) => {
            log::debug!("{} returned non-UTF-8 clipboard content, ignoring", tool);
            None
        }
    }
}

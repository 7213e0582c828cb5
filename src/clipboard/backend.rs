/// Trait for clipboard reader abstraction
/// Supports different clipboard systems (Wayland, X11)
/// Reader is read-only: the watcher polls it on every tick
pub trait ClipboardReader {
    /// Read the current clipboard text
    /// Returns None when the clipboard is empty, unavailable or not text
    fn read_text(&self) -> Option<String>;

    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination for pasted text
/// The insertion point is wherever the sink currently writes
pub trait TextSink {
    /// Insert text at the current position
    fn insert_at_cursor(&mut self, text: &str) -> Result<()>;

    /// Human readable description of where text goes
    fn describe(&self) -> String;
}

/// Writes pasted text to standard output
pub struct StdoutSink {
    out: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        StdoutSink { out: io::stdout() }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSink for StdoutSink {
    fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        let mut out = self.out.lock();
        out.write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        out.flush().context("Failed to flush stdout")?;
        Ok(())
    }

    fn describe(&self) -> String {
        "stdout".to_string()
    }
}

/// Appends pasted text to the end of a file
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open (or create) the file in append mode
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open output file {:?}", path))?;

        log::debug!("Appending pasted text to {:?}", path);
        Ok(FileSink {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl TextSink for FileSink {
    fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        self.file
            .write_all(text.as_bytes())
            .with_context(|| format!("Failed to append to {:?}", self.path))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

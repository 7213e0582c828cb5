//! Text transforms applied to clipboard text before it is inserted.
//!
//! The transform only ever produces the copy that gets inserted. The raw
//! clipboard value is kept elsewhere for change detection.

use regex::Regex;

use crate::storage::{ConfigError, TransformConfig};

/// Default remove pattern: Wikipedia-style citation markers such as
/// `[3]`, `[12a]`, `[citation needed]` and `[by whom?]`
pub const DEFAULT_REMOVE_PATTERN: &str = r"\[[0-9][^\]]*\]|\[citation needed\]|\[by whom\?\]";

/// Compiled form of the `[transform]` configuration section
#[derive(Debug, Clone)]
pub struct TextFilter {
    trim_leading_whitespace: bool,
    remove: Option<Regex>,
    prefix: String,
}

impl TextFilter {
    /// Build a filter, compiling the remove pattern
    /// An empty pattern disables removal
    pub fn new(
        trim_leading_whitespace: bool,
        remove_pattern: &str,
        prefix: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let remove = if remove_pattern.is_empty() {
            None
        } else {
            Some(
                Regex::new(remove_pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: remove_pattern.to_string(),
                    source,
                })?,
            )
        };

        Ok(TextFilter {
            trim_leading_whitespace,
            remove,
            prefix: prefix.into(),
        })
    }

    /// Build a filter from the configuration section
    pub fn from_config(config: &TransformConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.trim_leading_whitespace,
            &config.remove_pattern,
            config.prefix.clone(),
        )
    }

    /// Produce the text to insert for a raw clipboard value
    pub fn apply(&self, raw: &str) -> String {
        let text = if self.trim_leading_whitespace {
            raw.trim_start_matches([' ', '\t'])
        } else {
            raw
        };

        let text = match &self.remove {
            Some(re) => re.replace_all(text, ""),
            None => text.into(),
        };

        if self.prefix.is_empty() {
            text.into_owned()
        } else {
            format!("{}{}", self.prefix, text)
        }
    }
}

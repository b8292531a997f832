//! Runtime shell options.
//!
//! Everything that would be a build-time switch on a bare-metal shell
//! (line editing, history, multi-command lines, mutable prompt, output
//! sequences) is a field here and is resolved when the manager is built.

use heapless::String;
use serde::{Deserialize, Serialize};

use super::{EXECUTE_CHARS, LOGOUT, NEWLINE};
use crate::error::Error;

/// Where accepted lines are remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// No history, up/down keys are ignored.
    Disabled,
    /// Every session owns its own ring.
    PerSession,
    /// All sessions of a manager share one ring behind a mutex.
    Shared,
}

/// Shell behaviour switches.
///
/// # Examples
///
/// ```rust
/// use xshell::shell::{HistoryMode, ShellOptions};
///
/// let options = ShellOptions::from_json(r#"{"multi_command":true,"history":"shared"}"#).unwrap();
/// assert!(options.multi_command);
/// assert_eq!(options.history, HistoryMode::Shared);
/// assert!(options.line_editing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellOptions {
    /// Cursor motion, insertion and delete-at-cursor.
    pub line_editing: bool,
    /// History storage.
    pub history: HistoryMode,
    /// Accept several `;`-separated commands on one line.
    pub multi_command: bool,
    /// Let the `prompt` command and [`set_prompt`] change the prompt.
    ///
    /// [`set_prompt`]: crate::rt::ShellManager::set_prompt
    pub prompt_override: bool,
    /// Sequence written at the end of each output line.
    pub newline: String<4>,
    /// Bytes that accept the current line.
    pub execute_chars: String<4>,
    /// Text printed when the session logs out.
    pub logout: String<16>,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            line_editing: true,
            history: HistoryMode::PerSession,
            multi_command: false,
            prompt_override: false,
            newline: bounded(NEWLINE),
            execute_chars: bounded(EXECUTE_CHARS),
            logout: bounded(LOGOUT),
        }
    }
}

impl ShellOptions {
    /// Parse options from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the JSON is malformed, a string does not
    /// fit its buffer, or the options fail [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let mut scratch = [0u8; 32];
        let (options, _) = serde_json_core::from_str_escaped::<Self>(json, &mut scratch)
            .map_err(|_| Error::InvalidConfig)?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options for consistency.
    ///
    /// A line must be accepted by at least one byte, and accept bytes must
    /// be control characters so they can never be typed into a line.
    pub fn validate(&self) -> Result<(), Error> {
        if self.execute_chars.is_empty() {
            return Err(Error::InvalidConfig);
        }
        if self.execute_chars.bytes().any(|b| b >= 0x20) {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }

    /// Whether escape sequences are decoded at all.
    pub fn decodes_escapes(&self) -> bool {
        self.line_editing || self.history != HistoryMode::Disabled
    }
}

fn bounded<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

//! Shell core.
//!
//! The pieces a session is made of, leaves first:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   Line Editor   │───▶│    Tokenizer    │───▶│   Dispatcher    │
//! │  (escape codes, │    │  (quotes, `;`   │    │ (built-in table │
//! │    history)     │    │   separator)    │    │  then user one) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//!          │                                             │
//!          ▼                                             ▼
//! ┌─────────────────┐                           ┌─────────────────┐
//! │  History Ring   │                           │ Command Handler │
//! └─────────────────┘                           └─────────────────┘
//! ```
//!
//! The editor, the tokenizer and the history ring only need `core`; the
//! command tables, the dispatcher and the [`Shell`] handle given to command
//! handlers belong to the threaded runtime and need the `std` feature.

pub mod editor;
pub mod history;
pub mod options;
pub mod tokenizer;

#[cfg(feature = "std")]
pub mod builtins;
#[cfg(feature = "std")]
pub mod command;
#[cfg(feature = "std")]
pub mod config;
#[cfg(feature = "std")]
pub mod context;
#[cfg(feature = "std")]
pub mod dispatch;

pub use editor::{Input, LineEditor, ReadLine};
pub use history::{HistoryRing, NoHistory, Recall};
pub use options::{HistoryMode, ShellOptions};
pub use tokenizer::{Argv, Delimiter, Token, Tokenizer};

#[cfg(feature = "std")]
pub use command::{Command, CommandFn};
#[cfg(feature = "std")]
pub use config::{ExecHook, ExitHook, ManagerConfig, StackSource};
#[cfg(feature = "std")]
pub use context::Shell;
#[cfg(feature = "std")]
pub use dispatch::{Dispatch, dispatch};

/// Size of a line buffer in bytes.
///
/// One byte is reserved for the terminator, so at most `LINE_LENGTH - 1`
/// characters can be typed on one line. Further input is dropped.
pub const LINE_LENGTH: usize = 64;

/// Maximum number of arguments per command, command name included.
///
/// A command with more arguments is rejected with a
/// `<name>: too many arguments` message and not executed.
pub const MAX_ARGUMENTS: usize = 4;

/// Number of lines kept in a history ring.
pub const HISTORY_DEPTH: usize = 4;

/// Maximum length of a prompt set at runtime.
pub const PROMPT_LENGTH: usize = 16;

/// Alignment of stacks allocated from the heap.
pub const STACK_ALIGN: usize = 16;

/// Prompt used when the configuration does not provide one.
pub const DEFAULT_PROMPT: &str = "> ";

/// Default newline sequence written after every output line.
pub const NEWLINE: &str = "\r\n";

/// Default set of bytes that accept the current line.
pub const EXECUTE_CHARS: &str = "\r\n";

/// Default text printed when a session logs out.
pub const LOGOUT: &str = "\r\nlogout";

// Control codes understood by the line editor.
/// ASCII `Ctrl-D`, closes the session.
pub const CTRL_D: u8 = 0x04;
/// ASCII backspace (`Ctrl-H`).
pub const CTRL_H: u8 = 0x08;
/// ASCII `Ctrl-U`, clears the line.
pub const CTRL_U: u8 = 0x15;
/// ASCII escape, starts an escape sequence.
pub const ESC: u8 = 0x1B;
/// ASCII delete, handled like backspace.
pub const DEL: u8 = 0x7F;

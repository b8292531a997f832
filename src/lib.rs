//! # xshell - embeddable multi-session command shell
//!
//! A line-oriented command interface for resource-constrained systems. The
//! shell attaches to any byte stream (a UART, a USB-CDC endpoint, a TCP
//! socket, a file-backed stream) and runs one session per stream, without a
//! heap-hungry, POSIX-class shell implementation.
//!
//! ## Features
//!
//! ### Shell Core
//! - **Tokenizer**: whitespace separated arguments, double-quoted arguments,
//!   optional `;`-separated multi-command lines
//! - **Line Editor**: cursor motion, delete, backspace and clear-line over a
//!   small ANSI escape subset
//! - **History**: fixed-depth ring of accepted lines, per session or shared
//!   between all sessions of a manager
//! - **Dispatcher**: built-in table first, then the application table
//!
//! ### Runtime (`std` feature)
//! - **Manager**: configuration, prompt and the "session ended" event source
//! - **Sessions**: one thread per stream, with the thread control block and
//!   the stack drawn from shared pools and returned on exit
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xshell::rt::{Pool, ShellManager, TcbSlot};
//! use xshell::shell::{Command, ManagerConfig, Shell, StackSource};
//! # use xshell::stream::Stream;
//! # struct Uart;
//! # impl Stream for Uart {
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, xshell::Error> { Ok(0) }
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, xshell::Error> { Ok(buf.len()) }
//! # }
//!
//! fn cmd_led(shell: &mut Shell<'_>, argc: usize, argv: &[&str]) {
//!     if argc != 2 {
//!         shell.usage("on|off");
//!         return;
//!     }
//!     shell.print(argv[1]);
//!     shell.newline();
//! }
//!
//! static COMMANDS: &[Command] = &[Command::new("led", cmd_led), Command::SENTINEL];
//!
//! let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(4));
//! let config = ManagerConfig::new("shell", COMMANDS, StackSource::Heap { size: 16 * 1024 })
//!     .with_banner("\r\nxshell ready\r\n");
//! let manager = ShellManager::new(config, tcbs);
//!
//! let session = manager.spawn(Uart, 0, &[]).expect("no free shell slot");
//! session.join();
//! ```
//!
//! ## Platform Support
//!
//! The tokenizer, the history ring, the line editor and the stream interface
//! only depend on `core`. The threaded runtime needs the `std` feature.
//!
//! ## Optional Features
//!
//! - `std`: threaded session runtime and std I/O adapters (default: enabled)
//! - `defmt`: route internal logging through `defmt` instead of `log`

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(all(test, not(feature = "std")))]
#[macro_use]
extern crate std;

#[macro_use]
mod fmt;

/// Error type shared by every module of the crate.
pub mod error;

/// Byte-stream interface the shell is bound to.
///
/// Any transport that can read and write bytes can host a shell session.
pub mod stream;

/// Shell core: tokenizer, line editor, history, command tables and dispatch.
pub mod shell;

/// Threaded session runtime: pools, event source, manager and sessions.
#[cfg(feature = "std")]
pub mod rt;

pub use error::Error;

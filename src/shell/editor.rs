//! Line editor.
//!
//! Assembles one line from stream bytes. Input is decoded by a small state
//! machine:
//!
//! ```text
//!            ESC              '['               '3'
//! Normal ─────────▶ Escape ─────────▶ Bracket ─────────▶ VtPending
//!   ▲                 │                  │                   │
//!   └──── other ──────┘◀─ A B C D ───────┘◀────── '~' ───────┘
//! ```
//!
//! | Input              | Action                                         |
//! |--------------------|------------------------------------------------|
//! | `ESC [ A`, `ESC [ B` | recall previous / next history line          |
//! | `ESC [ C`, `ESC [ D` | cursor right / left                          |
//! | `ESC [ 3 ~`        | delete the character under the cursor          |
//! | `Ctrl-H`, `DEL`    | delete the character before the cursor         |
//! | `Ctrl-U`           | clear the line, rewind history                 |
//! | `Ctrl-D`           | close the session                              |
//! | accept bytes       | accept the line (CR and LF by default)         |
//! | other `< 0x20`     | ignored                                        |
//!
//! A byte that does not continue an escape sequence abandons it and is then
//! handled as ordinary input. Bytes outside printable ASCII are dropped, so
//! a line is always valid UTF-8.

use core::str;

use heapless::String;

use super::history::{LineBuffer, Recall};
use super::options::{HistoryMode, ShellOptions};
use super::{CTRL_D, CTRL_H, CTRL_U, DEL, ESC, LINE_LENGTH};
use crate::stream::Stream;

/// Outcome of feeding one byte to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// The line is not complete yet.
    Pending,
    /// An accept byte was read, the line is in [`LineEditor::line`].
    Accepted,
    /// `Ctrl-D` was read.
    Closed,
}

/// Outcome of [`LineEditor::read_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLine<'a> {
    /// A complete line.
    Line(&'a str),
    /// `Ctrl-D`, or the stream was disconnected.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Escape,
    Bracket,
    VtPending,
}

/// Line editor state for one session.
///
/// # Examples
///
/// ```rust
/// use xshell::shell::{HistoryRing, Input, LineEditor, ShellOptions};
/// use xshell::stream::IoStream;
///
/// let mut editor = LineEditor::new(&ShellOptions::default());
/// let mut history = HistoryRing::<4>::new();
/// let mut out = IoStream::new(std::io::empty(), Vec::new());
///
/// editor.begin(&mut history);
/// for &byte in b"helo\x1b[Dl" {
///     assert_eq!(editor.feed(byte, &mut out, "> ", &mut history), Input::Pending);
/// }
/// assert_eq!(editor.feed(b'\r', &mut out, "> ", &mut history), Input::Accepted);
/// assert_eq!(editor.line(), "hello");
/// ```
#[derive(Debug, Clone)]
pub struct LineEditor {
    buffer: LineBuffer,
    cursor: usize,
    state: State,
    line_editing: bool,
    history_keys: bool,
    escapes: bool,
    execute_chars: String<4>,
    newline: String<4>,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new(&ShellOptions::default())
    }
}

impl LineEditor {
    /// Longest line that can be typed.
    pub const CAPACITY: usize = LINE_LENGTH - 1;

    /// Create an editor configured from shell options.
    pub fn new(options: &ShellOptions) -> Self {
        Self {
            buffer: LineBuffer::new(),
            cursor: 0,
            state: State::Normal,
            line_editing: options.line_editing,
            history_keys: options.history != HistoryMode::Disabled,
            escapes: options.decodes_escapes(),
            execute_chars: options.execute_chars.clone(),
            newline: options.newline.clone(),
        }
    }

    /// The line typed so far.
    pub fn line(&self) -> &str {
        str::from_utf8(&self.buffer).unwrap_or("")
    }

    /// Logical cursor position, in bytes from the start of the line.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Start a new line: clear the buffer and rewind the history cursor.
    pub fn begin(&mut self, history: &mut dyn Recall) {
        self.buffer.clear();
        self.cursor = 0;
        self.state = State::Normal;
        history.rewind();
    }

    /// Read one line from `stream`, echoing and editing as bytes arrive.
    ///
    /// `prompt` is needed to redraw the line after edits in the middle of
    /// it. The call blocks in [`Stream::read`]; it returns
    /// [`ReadLine::Closed`] on `Ctrl-D` or when the stream disconnects.
    pub fn read_line<S: Stream + ?Sized>(
        &mut self,
        stream: &mut S,
        prompt: &str,
        history: &mut dyn Recall,
    ) -> ReadLine<'_> {
        self.begin(history);
        loop {
            let mut byte = [0u8; 1];
            match stream.read(&mut byte) {
                Ok(0) | Err(_) => return ReadLine::Closed,
                Ok(_) => {}
            }

            match self.feed(byte[0], stream, prompt, history) {
                Input::Pending => {}
                Input::Accepted => return ReadLine::Line(self.line()),
                Input::Closed => return ReadLine::Closed,
            }
        }
    }

    /// Process one input byte, writing any echo or redraw to `out`.
    pub fn feed<S: Stream + ?Sized>(
        &mut self,
        byte: u8,
        out: &mut S,
        prompt: &str,
        history: &mut dyn Recall,
    ) -> Input {
        if self.escapes {
            match self.state {
                State::Normal => {}
                State::Escape => {
                    if byte == b'[' {
                        self.state = State::Bracket;
                        return Input::Pending;
                    }
                    self.state = State::Normal;
                }
                State::Bracket => {
                    self.state = State::Normal;
                    match byte {
                        b'A' if self.history_keys => {
                            if history.previous(&mut self.buffer) {
                                self.show_recalled(out, prompt);
                            }
                            return Input::Pending;
                        }
                        b'B' if self.history_keys => {
                            if history.next(&mut self.buffer) {
                                self.show_recalled(out, prompt);
                            }
                            return Input::Pending;
                        }
                        b'C' if self.line_editing => {
                            if self.cursor < self.buffer.len() {
                                move_cursor(out, 1);
                                self.cursor += 1;
                            }
                            return Input::Pending;
                        }
                        b'D' if self.line_editing => {
                            if self.cursor > 0 {
                                move_cursor(out, -1);
                                self.cursor -= 1;
                            }
                            return Input::Pending;
                        }
                        b'3' if self.line_editing => {
                            self.state = State::VtPending;
                            return Input::Pending;
                        }
                        _ => {}
                    }
                }
                State::VtPending => {
                    self.state = State::Normal;
                    if byte == b'~' {
                        if self.cursor < self.buffer.len() {
                            self.buffer.remove(self.cursor);
                            self.redraw(out, prompt);
                        }
                        return Input::Pending;
                    }
                }
            }
        }

        self.feed_normal(byte, out, prompt, history)
    }

    fn feed_normal<S: Stream + ?Sized>(
        &mut self,
        byte: u8,
        out: &mut S,
        prompt: &str,
        history: &mut dyn Recall,
    ) -> Input {
        match byte {
            ESC if self.escapes => {
                self.state = State::Escape;
            }
            CTRL_U => {
                history.rewind();
                if self.escapes {
                    reset_line(out, prompt);
                } else {
                    for _ in 0..self.buffer.len() {
                        out.print("\x08 \x08");
                    }
                }
                self.buffer.clear();
                self.cursor = 0;
            }
            CTRL_H | DEL => self.backspace(out, prompt),
            CTRL_D => return Input::Closed,
            _ if self.execute_chars.as_bytes().contains(&byte) => {
                if self.line_editing {
                    reset_line(out, prompt);
                    out.print(self.line());
                }
                out.print(&self.newline);
                history.save(self.line());
                return Input::Accepted;
            }
            0x20..=0x7E => self.insert(byte, out, prompt),
            _ => {}
        }
        Input::Pending
    }

    fn insert<S: Stream + ?Sized>(&mut self, byte: u8, out: &mut S, prompt: &str) {
        if self.buffer.len() >= Self::CAPACITY {
            return;
        }

        if self.line_editing && self.cursor < self.buffer.len() {
            // Buffer length was checked above.
            let _ = self.buffer.insert(self.cursor, byte);
            self.cursor += 1;
            self.redraw(out, prompt);
        } else {
            let _ = self.buffer.push(byte);
            self.cursor = self.buffer.len();
            let _ = out.put(byte);
        }
    }

    fn backspace<S: Stream + ?Sized>(&mut self, out: &mut S, prompt: &str) {
        if self.cursor == 0 {
            return;
        }

        if self.line_editing {
            self.cursor -= 1;
            self.buffer.remove(self.cursor);
            self.redraw(out, prompt);
        } else {
            self.buffer.pop();
            self.cursor = self.buffer.len();
            out.print("\x08 \x08");
        }
    }

    fn show_recalled<S: Stream + ?Sized>(&mut self, out: &mut S, prompt: &str) {
        self.cursor = self.buffer.len();
        reset_line(out, prompt);
        out.print(self.line());
    }

    /// Reprint prompt and line, then put the terminal cursor back on the
    /// logical cursor.
    fn redraw<S: Stream + ?Sized>(&self, out: &mut S, prompt: &str) {
        reset_line(out, prompt);
        out.print(self.line());
        move_cursor(out, -((self.buffer.len() - self.cursor) as isize));
    }
}

/// Move to the line start, reprint the prompt and clear to end of line.
fn reset_line<S: Stream + ?Sized>(out: &mut S, prompt: &str) {
    out.print_fmt(format_args!(
        "\x1b[{}D{}\x1b[K",
        LINE_LENGTH + prompt.len() + 2,
        prompt
    ));
}

fn move_cursor<S: Stream + ?Sized>(out: &mut S, columns: isize) {
    if columns < 0 {
        out.print_fmt(format_args!("\x1b[{}D", columns.unsigned_abs()));
    } else if columns > 0 {
        out.print_fmt(format_args!("\x1b[{}C", columns));
    }
}

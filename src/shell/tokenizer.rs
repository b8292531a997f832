//! Command line tokenizer.
//!
//! Splits one accepted line into argument vectors:
//!
//! ```text
//! echo hello world                # ["echo", "hello", "world"]
//! prompt "my shell> "             # ["prompt", "my shell> "]
//! echo "unterminated quote        # ["echo", "unterminated quote"]
//! echo a; echo b                  # ["echo", "a"], ["echo", "b"]   (multi-command)
//! echo "a;b"                      # ["echo", "a;b"]               (quotes win)
//! ```
//!
//! Tokens borrow from the line; nothing is copied.

use heapless::Vec;

use super::MAX_ARGUMENTS;
use crate::error::Error;

/// Argument vector of one command. `argv[0]` is the command name.
pub type Argv<'a> = Vec<&'a str, MAX_ARGUMENTS>;

/// What ended a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// A space, a tab, or a closing quote. More arguments may follow.
    Blank,
    /// A `;` command separator (multi-command mode only).
    Separator,
    /// The end of the line.
    End,
}

/// One argument fetched from a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Argument text, without surrounding quotes.
    pub text: &'a str,
    /// Whether the argument was written between double quotes.
    pub quoted: bool,
    /// The delimiter that ended the argument.
    pub delimiter: Delimiter,
}

impl Token<'_> {
    /// A `;` with no argument in front of it, as in `a ;b` or `;;`.
    fn is_bare_separator(&self) -> bool {
        !self.quoted && self.text.is_empty() && self.delimiter == Delimiter::Separator
    }
}

/// Cursor over a command line.
///
/// # Examples
///
/// ```rust
/// use xshell::shell::{Argv, Delimiter, Tokenizer};
///
/// let mut tokens = Tokenizer::new("echo a; echo \"b c\"", true);
/// let mut argv = Argv::new();
///
/// assert_eq!(tokens.next_command(&mut argv), Ok(Delimiter::Separator));
/// assert_eq!(argv.as_slice(), ["echo", "a"]);
/// assert_eq!(tokens.next_command(&mut argv), Ok(Delimiter::End));
/// assert_eq!(argv.as_slice(), ["echo", "b c"]);
/// ```
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    rest: &'a str,
    multi_command: bool,
}

impl<'a> Tokenizer<'a> {
    /// Start tokenizing `line`.
    ///
    /// With `multi_command` set, an unquoted `;` ends the current command.
    pub fn new(line: &'a str, multi_command: bool) -> Self {
        Self {
            rest: line,
            multi_command,
        }
    }

    /// Fetch the next argument, advancing past it and its delimiter.
    ///
    /// Returns `None` once only blanks are left.
    pub fn fetch_argument(&mut self) -> Option<Token<'a>> {
        let line = self.rest.trim_start_matches([' ', '\t']);
        if line.is_empty() {
            self.rest = line;
            return None;
        }

        if let Some(quoted) = line.strip_prefix('"') {
            return Some(match quoted.find('"') {
                Some(close) => {
                    let after = &quoted[close + 1..];
                    let delimiter = self.consume_delimiter(after);
                    Token {
                        text: &quoted[..close],
                        quoted: true,
                        delimiter,
                    }
                }
                None => {
                    self.rest = "";
                    Token {
                        text: quoted,
                        quoted: true,
                        delimiter: Delimiter::End,
                    }
                }
            });
        }

        let multi = self.multi_command;
        let token = match line.find(|c: char| c == ' ' || c == '\t' || (multi && c == ';')) {
            Some(at) => {
                let delimiter = if line.as_bytes()[at] == b';' {
                    Delimiter::Separator
                } else {
                    Delimiter::Blank
                };
                self.rest = &line[at + 1..];
                Token {
                    text: &line[..at],
                    quoted: false,
                    delimiter,
                }
            }
            None => {
                self.rest = "";
                Token {
                    text: line,
                    quoted: false,
                    delimiter: Delimiter::End,
                }
            }
        };
        Some(token)
    }

    /// Collect the arguments of the next command into `argv`.
    ///
    /// Returns the delimiter that ended the command: [`Delimiter::Separator`]
    /// when another command may follow on the same line, [`Delimiter::End`]
    /// otherwise. An empty `argv` means there was nothing to run.
    ///
    /// # Errors
    ///
    /// [`Error::TooManyArguments`] when the command has more than
    /// [`MAX_ARGUMENTS`] arguments. `argv` then holds the first
    /// `MAX_ARGUMENTS` of them and the rest of the line must be discarded.
    pub fn next_command(&mut self, argv: &mut Argv<'a>) -> Result<Delimiter, Error> {
        argv.clear();
        while let Some(token) = self.fetch_argument() {
            if token.is_bare_separator() {
                return Ok(Delimiter::Separator);
            }
            if argv.push(token.text).is_err() {
                return Err(Error::TooManyArguments);
            }
            if token.delimiter != Delimiter::Blank {
                return Ok(token.delimiter);
            }
        }
        Ok(Delimiter::End)
    }

    /// A closing quote is followed by a blank, a separator, the end of the
    /// line, or directly by the next argument.
    fn consume_delimiter(&mut self, after: &'a str) -> Delimiter {
        match after.as_bytes().first() {
            None => {
                self.rest = after;
                Delimiter::End
            }
            Some(b' ' | b'\t') => {
                self.rest = &after[1..];
                Delimiter::Blank
            }
            Some(b';') if self.multi_command => {
                self.rest = &after[1..];
                Delimiter::Separator
            }
            Some(_) => {
                self.rest = after;
                Delimiter::Blank
            }
        }
    }
}

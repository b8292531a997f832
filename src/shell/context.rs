//! Handle given to command handlers.

use core::fmt;

use super::history::HistoryRing;
use crate::rt::{SessionControl, SessionId, ShellManager};
use crate::stream::Stream;

/// The running session, as seen by a command handler.
///
/// Gives access to the bound stream, the owning manager and the session's
/// own state. Writes to the stream never fail from the handler's point of
/// view; errors are logged and dropped.
pub struct Shell<'a> {
    manager: &'a ShellManager,
    session: &'a SessionControl,
    stream: &'a mut dyn Stream,
    history: Option<&'a mut HistoryRing>,
    envp: &'static [&'static str],
    command: &'a str,
}

impl<'a> Shell<'a> {
    pub(crate) fn new(
        manager: &'a ShellManager,
        session: &'a SessionControl,
        stream: &'a mut dyn Stream,
        history: Option<&'a mut HistoryRing>,
        envp: &'static [&'static str],
        command: &'a str,
    ) -> Self {
        Self {
            manager,
            session,
            stream,
            history,
            envp,
            command,
        }
    }

    /// Print text on the session stream.
    pub fn print(&mut self, text: &str) {
        self.stream.print(text);
    }

    /// Print formatted text on the session stream.
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.stream.print_fmt(args);
    }

    /// Print the configured newline sequence.
    pub fn newline(&mut self) {
        let newline = &self.manager.config().options.newline;
        self.stream.print(newline);
    }

    /// Print `Usage: <command> <message>` and a newline.
    pub fn usage(&mut self, message: &str) {
        let newline = &self.manager.config().options.newline;
        self.stream.print_fmt(format_args!(
            "Usage: {} {}{}",
            self.command, message, newline
        ));
    }

    /// Name of the command being run, empty outside of a command.
    pub fn command(&self) -> &str {
        self.command
    }

    /// The manager that spawned this session.
    pub fn manager(&self) -> &'a ShellManager {
        self.manager
    }

    /// Identifier of this session.
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// Environment passed at spawn time.
    pub fn envp(&self) -> &'static [&'static str] {
        self.envp
    }

    /// Ask the session loop to exit before the next prompt.
    pub fn request_terminate(&mut self) {
        self.session.request_terminate();
    }

    /// The bound stream, for raw byte I/O.
    pub fn stream(&mut self) -> &mut dyn Stream {
        &mut *self.stream
    }

    /// Forget the lines this session can recall.
    ///
    /// Clears the session's own ring, or the manager's shared ring when
    /// history is shared.
    pub fn clear_history(&mut self) {
        match self.history.as_deref_mut() {
            Some(history) => history.clear(),
            None => self.manager.clear_history(),
        }
    }
}

impl fmt::Write for Shell<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.stream.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for Shell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("session", &self.session.id())
            .field("command", &self.command)
            .field("envp", &self.envp)
            .finish_non_exhaustive()
    }
}

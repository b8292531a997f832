//! Command tables.

use core::fmt;

use super::context::Shell;

/// Function signature for command handlers.
///
/// Handlers receive the session handle, the argument count and the
/// arguments. `argv[0]` is always the command name. Output goes through
/// the [`Shell`] handle; there is no return value, a handler reports
/// problems to the user itself.
///
/// # Examples
///
/// ```rust
/// use xshell::shell::{CommandFn, Shell};
///
/// let greet: CommandFn = |shell: &mut Shell<'_>, argc, argv| {
///     let name = if argc > 1 { argv[1] } else { "world" };
///     shell.print("hello ");
///     shell.print(name);
///     shell.newline();
/// };
/// # let _ = greet;
/// ```
pub type CommandFn = fn(shell: &mut Shell<'_>, argc: usize, argv: &[&str]);

/// One entry of a command table.
///
/// Tables are `&'static [Command]` slices. A [`Command::SENTINEL`] entry
/// ends the table early; entries after it are never looked at, which lets
/// the same table be shared with code that expects a terminated list.
///
/// # Examples
///
/// ```rust
/// use xshell::shell::{Command, Shell};
///
/// fn reboot(shell: &mut Shell<'_>, _argc: usize, _argv: &[&str]) {
///     shell.print("rebooting");
///     shell.newline();
/// }
///
/// static COMMANDS: &[Command] = &[Command::new("reboot", reboot), Command::SENTINEL];
/// assert_eq!(Command::iter(COMMANDS).count(), 1);
/// ```
#[derive(Clone, Copy)]
pub struct Command {
    /// Name the user types. Matching is exact and case-sensitive.
    pub name: &'static str,
    /// Function run when the command is invoked.
    pub handler: CommandFn,
}

impl Command {
    /// Table terminator.
    pub const SENTINEL: Command = Command {
        name: "",
        handler: ignore,
    };

    /// Create a table entry.
    pub const fn new(name: &'static str, handler: CommandFn) -> Self {
        Self { name, handler }
    }

    /// Whether this entry terminates its table.
    pub const fn is_sentinel(&self) -> bool {
        self.name.is_empty()
    }

    /// Live entries of a table, up to the first sentinel.
    pub fn iter(table: &[Command]) -> impl Iterator<Item = &Command> + '_ {
        table.iter().take_while(|command| !command.is_sentinel())
    }

    /// Find a command by exact name.
    pub fn find<'t>(table: &'t [Command], name: &str) -> Option<&'t Command> {
        Self::iter(table).find(|command| command.name == name)
    }
}

fn ignore(_shell: &mut Shell<'_>, _argc: usize, _argv: &[&str]) {}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Shell<'_>, _: usize, _: &[&str]) {}

    static TABLE: &[Command] = &[
        Command::new("led", noop),
        Command::new("Led", noop),
        Command::SENTINEL,
        Command::new("hidden", noop),
    ];

    #[test]
    fn test_iteration_stops_at_sentinel() {
        let names: Vec<&str> = Command::iter(TABLE).map(|c| c.name).collect();
        assert_eq!(names, ["led", "Led"]);
    }

    #[test]
    fn test_find_is_case_sensitive() {
        assert!(Command::find(TABLE, "led").is_some());
        assert!(Command::find(TABLE, "LED").is_none());
        assert!(Command::find(TABLE, "hidden").is_none());
        assert!(Command::find(TABLE, "").is_none());
    }

    #[test]
    fn test_table_without_sentinel() {
        static OPEN: &[Command] = &[Command::new("a", noop)];
        assert_eq!(Command::iter(OPEN).count(), 1);
        assert_eq!(Command::iter(&[]).count(), 0);
    }
}

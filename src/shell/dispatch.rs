//! Command dispatcher.
//!
//! `help` is handled here. Any other name is looked up in the built-in
//! table and then in the manager's table; the first exact match runs.

use super::builtins::BUILTIN_COMMANDS;
use super::command::Command;
use super::context::Shell;

/// Outcome of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran, or `help` listed the commands.
    Resolved,
    /// No table had the name. `<name>?` was printed.
    NotFound,
}

/// Run the command in `argv` on `shell`.
///
/// `argv` must hold at least the command name. The exec hook of the
/// manager, if any, runs after the command, except for `help` given extra
/// arguments, which only prints its usage line.
pub fn dispatch(shell: &mut Shell<'_>, argv: &[&str]) -> Dispatch {
    let Some(&name) = argv.first() else {
        return Dispatch::NotFound;
    };
    let argc = argv.len();
    let config = shell.manager().config();

    let outcome = if name == "help" {
        if argc > 1 {
            shell.usage("");
            return Dispatch::Resolved;
        }
        shell.print("Commands: help ");
        for command in Command::iter(BUILTIN_COMMANDS).chain(Command::iter(config.commands)) {
            shell.print(command.name);
            shell.print(" ");
        }
        shell.newline();
        Dispatch::Resolved
    } else if let Some(command) =
        Command::find(BUILTIN_COMMANDS, name).or_else(|| Command::find(config.commands, name))
    {
        (command.handler)(shell, argc, argv);
        Dispatch::Resolved
    } else {
        debug!("unknown command {}", name);
        shell.print(name);
        shell.print("?");
        shell.newline();
        Dispatch::NotFound
    };

    if let Some(hook) = config.exec_hook {
        hook(shell, outcome, argc, argv);
    }
    outcome
}

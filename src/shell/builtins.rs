//! Built-in commands.
//!
//! Searched before the manager's own table, so an application command with
//! the same name as a built-in is never reached.

use super::command::Command;
use super::config::StackSource;
use super::context::Shell;

/// The built-in command table, in lookup order.
pub static BUILTIN_COMMANDS: &[Command] = &[
    Command::new("exit", cmd_exit),
    Command::new("info", cmd_info),
    Command::new("echo", cmd_echo),
    Command::new("systime", cmd_systime),
    Command::new("mem", cmd_mem),
    Command::new("sessions", cmd_sessions),
    Command::new("prompt", cmd_prompt),
    Command::SENTINEL,
];

fn cmd_exit(shell: &mut Shell<'_>, argc: usize, _argv: &[&str]) {
    if argc > 1 {
        shell.usage("");
        return;
    }
    shell.request_terminate();
}

fn cmd_info(shell: &mut Shell<'_>, argc: usize, _argv: &[&str]) {
    if argc > 1 {
        shell.usage("");
        return;
    }
    let newline = &shell.manager().config().options.newline;
    shell.print_fmt(format_args!(
        "Shell:        {} {}{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        newline
    ));
    shell.print_fmt(format_args!(
        "Architecture: {}{}",
        std::env::consts::ARCH,
        newline
    ));
    shell.print_fmt(format_args!("Platform:     {}{}", std::env::consts::OS, newline));
}

fn cmd_echo(shell: &mut Shell<'_>, argc: usize, argv: &[&str]) {
    if argc != 2 {
        shell.usage("\"message\"");
        return;
    }
    shell.print(argv[1]);
    shell.newline();
}

fn cmd_systime(shell: &mut Shell<'_>, argc: usize, _argv: &[&str]) {
    if argc > 1 {
        shell.usage("");
        return;
    }
    let millis = shell.manager().uptime().as_millis();
    shell.print_fmt(format_args!("{}", millis));
    shell.newline();
}

fn cmd_mem(shell: &mut Shell<'_>, argc: usize, _argv: &[&str]) {
    if argc > 1 {
        shell.usage("");
        return;
    }
    let manager = shell.manager();
    let newline = &manager.config().options.newline;
    let tcbs = manager.tcb_pool();
    shell.print_fmt(format_args!(
        "shell slots free : {}/{}{}",
        tcbs.free_count(),
        tcbs.capacity(),
        newline
    ));
    match &manager.config().stack {
        StackSource::Heap { size } => {
            shell.print_fmt(format_args!("stack source     : heap{}", newline));
            shell.print_fmt(format_args!("stack size       : {} bytes{}", size, newline));
        }
        StackSource::Pool(pool) => {
            shell.print_fmt(format_args!("stack source     : pool{}", newline));
            shell.print_fmt(format_args!(
                "stack size       : {} bytes{}",
                pool.object_size(),
                newline
            ));
            shell.print_fmt(format_args!(
                "stacks free      : {}/{}{}",
                pool.free_count(),
                pool.capacity(),
                newline
            ));
        }
    }
}

fn cmd_sessions(shell: &mut Shell<'_>, argc: usize, _argv: &[&str]) {
    if argc > 1 {
        shell.usage("");
        return;
    }
    let manager = shell.manager();
    let newline = &manager.config().options.newline;
    let own = shell.session_id();
    shell.print_fmt(format_args!("  id state      name{}", newline));
    for session in manager.sessions() {
        let state = if session.is_terminated() {
            "terminated"
        } else {
            "running"
        };
        let marker = if session.id() == own { '*' } else { ' ' };
        shell.print_fmt(format_args!(
            "{}{:>3} {:<10} {}{}",
            marker,
            session.id(),
            state,
            session.name(),
            newline
        ));
    }
}

fn cmd_prompt(shell: &mut Shell<'_>, argc: usize, argv: &[&str]) {
    if argc != 2 {
        shell.usage("\"string\"");
        return;
    }
    if let Err(error) = shell.manager().set_prompt(argv[1]) {
        shell.print_fmt(format_args!("{}", error));
        shell.newline();
    }
}

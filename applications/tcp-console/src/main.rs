//! Serves one shell session per TCP connection.
//!
//! ```text
//! tcp-console --port 2323 --sessions 4
//! telnet localhost 2323
//! ```

use std::fs;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use clap::Parser;
use xshell::rt::{Pool, ShellManager, StackBuffer, TcbSlot};
use xshell::shell::{Command, ManagerConfig, Shell, ShellOptions, StackSource};
use xshell::stream::IoStream;

#[derive(Parser, Debug)]
#[command(name = "tcp-console", version, about = "Shell sessions over TCP")]
struct Cli {
    /// Listen address
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,

    /// Listen port
    #[arg(short, long, default_value_t = 2323)]
    port: u16,

    /// Maximum number of concurrent sessions
    #[arg(short, long, default_value_t = 4)]
    sessions: usize,

    /// Stack reserved per session, in bytes
    #[arg(long, default_value_t = 16 * 1024)]
    stack_size: usize,

    /// Shell options as a JSON file
    #[arg(long)]
    options: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn cmd_hello(shell: &mut Shell<'_>, argc: usize, argv: &[&str]) {
    if argc > 2 {
        shell.usage("[name]");
        return;
    }
    let name = argv.get(1).copied().unwrap_or("world");
    shell.print_fmt(format_args!("hello {}, this is session {}", name, shell.session_id()));
    shell.newline();
}

fn cmd_gc(shell: &mut Shell<'_>, argc: usize, _argv: &[&str]) {
    if argc > 1 {
        shell.usage("");
        return;
    }
    let mut ids = Vec::new();
    let count = shell.manager().collect(|session| ids.push(session.id()));
    shell.print_fmt(format_args!("collected {} sessions {:?}", count, ids));
    shell.newline();
}

fn cmd_history(shell: &mut Shell<'_>, argc: usize, argv: &[&str]) {
    if argc != 2 || argv[1] != "clear" {
        shell.usage("clear");
        return;
    }
    shell.clear_history();
}

static COMMANDS: &[Command] = &[
    Command::new("hello", cmd_hello),
    Command::new("gc", cmd_gc),
    Command::new("history", cmd_history),
    Command::SENTINEL,
];

fn load_options(path: Option<&str>) -> Result<ShellOptions, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(ShellOptions {
            multi_command: true,
            prompt_override: true,
            ..ShellOptions::default()
        });
    };
    let json = fs::read_to_string(path)?;
    Ok(ShellOptions::from_json(&json)?)
}

fn serve(manager: &Arc<ShellManager>, socket: TcpStream) -> std::io::Result<()> {
    let peer = socket.peer_addr()?;
    let stream = IoStream::new(socket.try_clone()?, socket);

    match manager.spawn(stream, 0, &[]) {
        Ok(session) => log::info!("{} attached to session {}", peer, session.id()),
        Err(error) => {
            log::warn!("{} refused: {}", peer, error);
        }
    }
    Ok(())
}

/// Tell a client there is no room for it. The connection closes either way.
fn refuse(socket: &mut impl Write) -> bool {
    match socket.write_all(b"no free shell slot\r\n") {
        Ok(()) => true,
        Err(error) => {
            log::debug!("refusal not delivered: {}", error);
            false
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    use tracing_subscriber::EnvFilter;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let options = load_options(cli.options.as_deref())?;
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(cli.sessions));
    let stacks = Arc::new(Pool::<StackBuffer>::stacks(cli.sessions, cli.stack_size));
    let config = ManagerConfig::new("tcp-console", COMMANDS, StackSource::Pool(stacks))
        .with_banner("\r\nxshell over tcp, type help\r\n")
        .with_options(options);
    let manager = ShellManager::new(config, tcbs);

    let listener = TcpListener::bind((cli.address.as_str(), cli.port))?;
    log::info!("listening on {}", listener.local_addr()?);

    for socket in listener.incoming() {
        let mut socket = match socket {
            Ok(socket) => socket,
            Err(error) => {
                log::warn!("accept failed: {}", error);
                continue;
            }
        };

        manager.collect(|session| log::debug!("session {} collected", session.id()));
        if manager.tcb_pool().free_count() == 0 {
            refuse(&mut socket);
            continue;
        }
        if let Err(error) = serve(&manager, socket) {
            log::warn!("connection dropped: {}", error);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_refuse_reports_delivery() {
        let mut sent = Vec::new();
        assert!(refuse(&mut sent));
        assert_eq!(sent, b"no free shell slot\r\n");

        assert!(!refuse(&mut BrokenPipe));
    }
}

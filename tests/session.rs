mod common;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use common::{ChannelStream, ScriptStream, type_in};
use xshell::Error;
use xshell::rt::{
    ExitReason, Pool, SessionControl, ShellManager, Spawner, StackBuffer, TcbSlot,
    ThreadDescriptor,
};
use xshell::shell::{Command, ManagerConfig, Shell, StackSource};
use xshell::stream::Stream;

const TIMEOUT: Duration = Duration::from_secs(5);

static NO_COMMANDS: &[Command] = &[Command::SENTINEL];

fn heap_config() -> ManagerConfig {
    ManagerConfig::new("shell", NO_COMMANDS, StackSource::Heap { size: 8 * 1024 })
        .with_banner("xshell\r\n")
}

#[test]
fn test_ctrl_d_logs_out_and_releases_resources() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(2));
    let stacks = Arc::new(Pool::<StackBuffer>::stacks(2, 4096));
    let config = heap_config().with_prompt("ch> ");
    let config = ManagerConfig {
        stack: StackSource::Pool(stacks.clone()),
        ..config
    };
    let manager = ShellManager::new(config, tcbs.clone());

    let stream = ScriptStream::new(&b"\x04"[..]);
    let output = stream.output();
    let session = manager.spawn(stream, 0, &[]).unwrap();

    assert_eq!(session.join(), Some(ExitReason::Logout));
    assert_eq!(output.text(), "xshell\r\nch> \r\nlogout");
    assert_eq!(tcbs.free_count(), 2);
    assert_eq!(stacks.free_count(), 2);
}

#[test]
fn test_disconnect_ends_session() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(1));
    let manager = ShellManager::new(heap_config(), tcbs.clone());

    let (stream, sender, _output) = ChannelStream::new();
    let session = manager.spawn(stream, 0, &[]).unwrap();
    assert!(!session.join_timeout(Duration::from_millis(20)));

    drop(sender);
    assert!(session.join_timeout(TIMEOUT));
    assert_eq!(session.control().exit_reason(), Some(ExitReason::Logout));
    assert_eq!(tcbs.free_count(), 1);
}

#[test]
fn test_tcb_pool_exhaustion_and_recovery() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(2));
    let manager = ShellManager::new(heap_config(), tcbs.clone());

    let (first, first_input, _) = ChannelStream::new();
    let (second, second_input, _) = ChannelStream::new();
    let (third, _third_input, _) = ChannelStream::new();

    let first = manager.spawn(first, 0, &[]).unwrap();
    let second = manager.spawn(second, 0, &[]).unwrap();
    assert_eq!(manager.spawn(third, 0, &[]).unwrap_err(), Error::PoolExhausted);
    assert_eq!(tcbs.free_count(), 0);

    drop(first_input);
    first.join();
    assert_eq!(tcbs.free_count(), 1);

    let (fourth, fourth_input, _) = ChannelStream::new();
    let fourth = manager.spawn(fourth, 0, &[]).unwrap();

    drop(second_input);
    drop(fourth_input);
    fourth.join();
    assert!(second.join_timeout(TIMEOUT));
    assert_eq!(tcbs.free_count(), 2);
}

#[test]
fn test_stack_exhaustion_returns_tcb() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(2));
    let stacks = Arc::new(Pool::<StackBuffer>::stacks(1, 2048));
    let config = ManagerConfig::new("shell", NO_COMMANDS, StackSource::Pool(stacks.clone()));
    let manager = ShellManager::new(config, tcbs.clone());

    let (first, first_input, _) = ChannelStream::new();
    let (second, _second_input, _) = ChannelStream::new();

    let first = manager.spawn(first, 0, &[]).unwrap();
    assert_eq!(manager.spawn(second, 0, &[]).unwrap_err(), Error::StackExhausted);
    assert_eq!(tcbs.free_count(), 1);
    assert_eq!(stacks.free_count(), 0);
    assert_eq!(manager.sessions().len(), 1);

    drop(first_input);
    first.join();
    assert_eq!(tcbs.free_count(), 2);
    assert_eq!(stacks.free_count(), 1);
}

struct FailingSpawner;

impl Spawner for FailingSpawner {
    fn spawn(&self, _thread: &ThreadDescriptor, _body: Box<dyn FnOnce() + Send>) -> Result<(), Error> {
        Err(Error::SpawnFailed)
    }
}

#[test]
fn test_spawn_failure_leaks_nothing() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(1));
    let stacks = Arc::new(Pool::<StackBuffer>::stacks(1, 2048));
    let config = ManagerConfig::new("shell", NO_COMMANDS, StackSource::Pool(stacks.clone()));
    let manager = ShellManager::with_spawner(config, tcbs.clone(), FailingSpawner);

    let result = manager.spawn(ScriptStream::new(""), 0, &[]);
    assert_eq!(result.unwrap_err(), Error::SpawnFailed);
    assert_eq!(tcbs.free_count(), 1);
    assert_eq!(stacks.free_count(), 1);
    assert!(manager.sessions().is_empty());
}

#[test]
fn test_terminate_request_waits_for_next_prompt() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(1));
    let manager = ShellManager::new(heap_config(), tcbs.clone());

    let (stream, input, output) = ChannelStream::new();
    let session = manager.spawn(stream, 0, &[]).unwrap();

    // Blocked in read, the request alone does not end the session.
    session.request_terminate();
    assert!(!session.join_timeout(Duration::from_millis(50)));

    type_in(&input, "\r");
    assert_eq!(session.join(), Some(ExitReason::TerminateRequest));
    assert!(!output.text().contains("logout"));
    assert_eq!(tcbs.free_count(), 1);
}

#[test]
fn test_exit_command() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(1));
    let manager = ShellManager::new(heap_config(), tcbs);

    let stream = ScriptStream::new("exit\recho never\r");
    let output = stream.output();
    let session = manager.spawn(stream, 0, &[]).unwrap();

    assert_eq!(session.join(), Some(ExitReason::TerminateRequest));
    assert!(!output.text().contains("never\r\n"));
}

#[test]
fn test_exit_with_arguments_prints_usage() {
    let manager = ShellManager::new(heap_config(), Arc::new(Pool::with_capacity(1)));
    let stream = ScriptStream::new("exit now\r");
    let output = stream.output();

    assert_eq!(manager.run(stream, &[]), ExitReason::Logout);
    assert!(output.text().contains("Usage: exit \r\n"));
}

#[test]
fn test_inline_run_takes_no_pool_resources() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(0));
    let manager = ShellManager::new(heap_config(), tcbs);

    let stream = ScriptStream::new("echo inline\r");
    let output = stream.output();
    assert_eq!(manager.run(stream, &[]), ExitReason::Logout);
    assert!(output.text().contains("\r\ninline\r\n"));
    assert!(manager.sessions()[0].is_terminated());
}

#[test]
fn test_collect_terminated_sessions() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(3));
    let manager = ShellManager::new(heap_config(), tcbs);

    let done = manager.spawn(ScriptStream::new(""), 0, &[]).unwrap();
    let (stream, input, _) = ChannelStream::new();
    let running = manager.spawn(stream, 0, &[]).unwrap();
    done.join();

    let mut collected = Vec::new();
    let count = manager.collect(|session: &SessionControl| collected.push(session.id()));
    assert_eq!(count, 1);
    assert_eq!(collected, [done.id()]);
    assert_eq!(manager.sessions().len(), 1);
    assert!(manager.is_running(running.id()));

    drop(input);
    running.join();
    assert_eq!(manager.collect(|_| {}), 1);
    assert!(manager.sessions().is_empty());
}

#[test]
fn test_event_generation_advances_per_session() {
    let manager = ShellManager::new(heap_config(), Arc::new(Pool::with_capacity(2)));
    let before = manager.events().generation();

    let a = manager.spawn(ScriptStream::new(""), 0, &[]).unwrap();
    let b = manager.spawn(ScriptStream::new(""), 0, &[]).unwrap();
    a.join();
    b.join();

    assert_eq!(manager.events().generation(), before + 2);
}

static EXITS: AtomicUsize = AtomicUsize::new(0);

fn on_exit(shell: &mut Shell<'_>, reason: ExitReason) {
    assert_eq!(reason, ExitReason::Logout);
    assert_eq!(shell.command(), "");
    shell.print("bye");
    EXITS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_exit_hook() {
    let config = heap_config().with_exit_hook(on_exit);
    let manager = ShellManager::new(config, Arc::new(Pool::with_capacity(1)));

    let stream = ScriptStream::new("\x04");
    let output = stream.output();
    let session = manager.spawn(stream, 0, &[]).unwrap();
    session.join();

    assert!(output.text().ends_with("logoutbye"));
    assert_eq!(EXITS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sessions_command_lists_registry() {
    let manager = ShellManager::new(heap_config(), Arc::new(Pool::with_capacity(1)));
    let stream = ScriptStream::new("sessions\r");
    let output = stream.output();
    let session = manager.spawn(stream, 0, &[]).unwrap();
    session.join();

    let text = output.text();
    assert!(text.contains("  id state      name\r\n"));
    assert!(text.contains(&format!("*{:>3} running    shell\r\n", session.id())));
}

#[test]
fn test_mem_command_reports_pools() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(3));
    let stacks = Arc::new(Pool::<StackBuffer>::stacks(2, 1024));
    let config = ManagerConfig::new("shell", NO_COMMANDS, StackSource::Pool(stacks));
    let manager = ShellManager::new(config, tcbs);

    let stream = ScriptStream::new("mem\r");
    let output = stream.output();
    manager.spawn(stream, 0, &[]).unwrap().join();

    let text = output.text();
    assert!(text.contains("shell slots free : 2/3\r\n"));
    assert!(text.contains("stack source     : pool\r\n"));
    assert!(text.contains("stack size       : 1024 bytes\r\n"));
    assert!(text.contains("stacks free      : 1/2\r\n"));
}

/// Stream that takes a while to close and records when it has.
struct SlowClosingStream {
    inner: ScriptStream,
    closed: Arc<AtomicBool>,
}

impl Stream for SlowClosingStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.inner.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.inner.write(buf)
    }
}

impl Drop for SlowClosingStream {
    fn drop(&mut self) {
        thread::sleep(Duration::from_millis(50));
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_stream_closed_before_session_reported_ended() {
    let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(1));
    let manager = ShellManager::new(heap_config(), tcbs.clone());

    let closed = Arc::new(AtomicBool::new(false));
    let stream = SlowClosingStream {
        inner: ScriptStream::new("\x04"),
        closed: closed.clone(),
    };
    let session = manager.spawn(stream, 0, &[]).unwrap();

    assert_eq!(session.join(), Some(ExitReason::Logout));
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(tcbs.free_count(), 1);
}

fn cmd_crash(_shell: &mut Shell<'_>, _argc: usize, _argv: &[&str]) {
    panic!("crash");
}

static CRASH_COMMANDS: &[Command] = &[Command::new("crash", cmd_crash), Command::SENTINEL];

#[test]
fn test_inline_session_ends_when_handler_panics() {
    let config = ManagerConfig::new("shell", CRASH_COMMANDS, StackSource::Heap { size: 4096 });
    let manager = ShellManager::new(config, Arc::new(Pool::with_capacity(1)));
    let before = manager.events().generation();

    let closed = Arc::new(AtomicBool::new(false));
    let stream = SlowClosingStream {
        inner: ScriptStream::new("crash\r"),
        closed: closed.clone(),
    };
    let result = panic::catch_unwind(AssertUnwindSafe(|| manager.run(stream, &[])));
    assert!(result.is_err());

    let sessions = manager.sessions();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].is_terminated());
    assert!(!manager.is_running(sessions[0].id()));
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(manager.events().generation(), before + 1);
}

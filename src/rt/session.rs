//! Session loop and session bookkeeping.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use heapless::String;

use super::manager::ShellManager;
use super::pool::{Pooled, Stack, TcbSlot};
use crate::shell::history::SharedHistory;
use crate::shell::{
    Argv, Delimiter, HistoryMode, HistoryRing, LINE_LENGTH, NoHistory, ReadLine, Recall, Shell,
    Tokenizer, dispatch,
};
use crate::stream::Stream;

/// Identifier of a session, unique per manager.
pub type SessionId = u32;

/// Why a session left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `Ctrl-D` was typed or the stream disconnected.
    Logout,
    /// Termination was requested, by `exit` or through a handle.
    TerminateRequest,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Logout => f.write_str("logout"),
            ExitReason::TerminateRequest => f.write_str("terminate request"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ExitReason {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ExitReason::Logout => defmt::write!(f, "logout"),
            ExitReason::TerminateRequest => defmt::write!(f, "terminate request"),
        }
    }
}

/// State of one session shared between its thread, its handle and the
/// manager's registry.
#[derive(Debug)]
pub struct SessionControl {
    id: SessionId,
    name: &'static str,
    terminate: AtomicBool,
    terminated: AtomicBool,
    exit: OnceLock<ExitReason>,
}

impl SessionControl {
    pub(crate) fn new(id: SessionId, name: &'static str) -> Self {
        Self {
            id,
            name,
            terminate: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            exit: OnceLock::new(),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Thread name of the session.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ask the session to exit.
    ///
    /// The flag is checked once per prompt. A session blocked reading its
    /// stream only sees it after the next line or when the stream closes.
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    /// Whether termination was requested.
    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Whether the session has ended and released its resources.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Why the session ended, once it has.
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit.get().copied()
    }

    pub(crate) fn finish(&self) {
        self.terminated.store(true, Ordering::Release);
    }
}

/// Handle to a spawned session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    control: Arc<SessionControl>,
    manager: Arc<ShellManager>,
}

impl SessionHandle {
    pub(crate) fn new(control: Arc<SessionControl>, manager: Arc<ShellManager>) -> Self {
        Self { control, manager }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.control.id()
    }

    /// Shared session state.
    pub fn control(&self) -> &Arc<SessionControl> {
        &self.control
    }

    /// Ask the session to exit before its next prompt.
    pub fn request_terminate(&self) {
        self.control.request_terminate();
    }

    /// Whether the session has ended.
    pub fn is_terminated(&self) -> bool {
        self.control.is_terminated()
    }

    /// Block until the session has ended and released its resources.
    pub fn join(&self) -> Option<ExitReason> {
        self.manager
            .events()
            .wait_until(|| self.control.is_terminated(), None);
        self.control.exit_reason()
    }

    /// Like [`join`](Self::join) with a time limit. Returns `false` if the
    /// session was still running when the time ran out.
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        self.manager
            .events()
            .wait_until(|| self.control.is_terminated(), Some(timeout))
    }
}

/// What a spawned session borrows from the shared pools.
#[derive(Debug)]
pub(crate) struct Resources {
    pub(crate) tcb: Pooled<TcbSlot>,
    pub(crate) stack: Stack,
}

/// Drops what a session held and announces its end in one broadcast.
///
/// Runs on unwind as well, so a panicking command handler still gives its
/// slot back and closes its stream.
struct ExitGuard<'a, T> {
    manager: &'a ShellManager,
    control: &'a SessionControl,
    held: Option<T>,
}

impl<'a, T> ExitGuard<'a, T> {
    fn new(manager: &'a ShellManager, control: &'a SessionControl, held: T) -> Self {
        Self {
            manager,
            control,
            held: Some(held),
        }
    }

    fn held(&mut self) -> &mut T {
        match &mut self.held {
            Some(held) => held,
            None => unreachable!("session state taken before exit"),
        }
    }
}

impl<T> Drop for ExitGuard<'_, T> {
    fn drop(&mut self) {
        let held = self.held.take();
        self.manager.events().broadcast_with(|| {
            drop(held);
            self.control.finish();
        });
        trace!("session {} resources released", self.control.id());
    }
}

/// Body of a spawned session thread.
pub(crate) fn run_spawned<S: Stream>(
    manager: Arc<ShellManager>,
    control: Arc<SessionControl>,
    stream: S,
    resources: Resources,
    envp: &'static [&'static str],
) {
    let mut guard = ExitGuard::new(&manager, &control, (stream, resources));
    let (stream, resources) = guard.held();
    trace!(
        "session {} running on a {} byte stack",
        control.id(),
        resources.stack.size()
    );
    run_loop(&manager, &control, stream, &mut resources.tcb, envp);
}

/// Body of a session run on the caller's thread. Nothing comes from the
/// pools, but the stream is dropped and the end broadcast the same way.
pub(crate) fn run_inline<S: Stream>(
    manager: &ShellManager,
    control: &SessionControl,
    stream: S,
    envp: &'static [&'static str],
) -> ExitReason {
    let mut tcb = TcbSlot::default();
    tcb.reset(&manager.config().options);
    let mut guard = ExitGuard::new(manager, control, (stream, tcb));
    let (stream, tcb) = guard.held();
    run_loop(manager, control, stream, tcb, envp)
}

/// The read-eval loop of one session.
pub(crate) fn run_loop(
    manager: &ShellManager,
    control: &SessionControl,
    stream: &mut dyn Stream,
    tcb: &mut TcbSlot,
    envp: &'static [&'static str],
) -> ExitReason {
    let config = manager.config();
    let options = &config.options;
    info!("session {} started", control.id());

    if let Some(banner) = config.banner {
        stream.print(banner);
    }

    let reason = loop {
        if control.terminate_requested() {
            break ExitReason::TerminateRequest;
        }

        let prompt = manager.prompt();
        stream.print(&prompt);

        let TcbSlot { editor, history } = &mut *tcb;
        let mut shared;
        let mut none = NoHistory;
        let recall: &mut dyn Recall = match options.history {
            HistoryMode::Disabled => &mut none,
            HistoryMode::PerSession => history,
            HistoryMode::Shared => match manager.shared_history() {
                Some(ring) => {
                    shared = SharedHistory(ring);
                    &mut shared
                }
                None => &mut none,
            },
        };

        let line: String<LINE_LENGTH> = match editor.read_line(stream, &prompt, recall) {
            ReadLine::Line(text) => String::try_from(text).unwrap_or_default(),
            ReadLine::Closed => {
                stream.print(&options.logout);
                break ExitReason::Logout;
            }
        };

        execute_line(manager, control, stream, own_history(options.history, tcb), envp, &line);
    };

    if let Some(hook) = config.exit_hook {
        let history = own_history(options.history, tcb);
        let mut shell = Shell::new(manager, control, stream, history, envp, "");
        hook(&mut shell, reason);
    }

    let _ = control.exit.set(reason);
    info!("session {} ended: {}", control.id(), reason);
    reason
}

fn own_history(mode: HistoryMode, tcb: &mut TcbSlot) -> Option<&mut HistoryRing> {
    match mode {
        HistoryMode::PerSession => Some(&mut tcb.history),
        HistoryMode::Disabled | HistoryMode::Shared => None,
    }
}

/// Tokenize one line and dispatch every command on it.
///
/// A command with too many arguments is reported once, and the rest of the
/// line is dropped.
fn execute_line(
    manager: &ShellManager,
    control: &SessionControl,
    stream: &mut dyn Stream,
    mut history: Option<&mut HistoryRing>,
    envp: &'static [&'static str],
    line: &str,
) {
    let options = &manager.config().options;
    let mut tokens = Tokenizer::new(line, options.multi_command);
    let mut argv = Argv::new();

    loop {
        let delimiter = match tokens.next_command(&mut argv) {
            Ok(delimiter) => delimiter,
            Err(error) => {
                let name = argv.first().copied().unwrap_or_default();
                debug!("{}: {}", name, error);
                stream.print_fmt(format_args!("{}: {}{}", name, error, options.newline));
                return;
            }
        };

        if let Some(&name) = argv.first() {
            let mut shell = Shell::new(
                manager,
                control,
                &mut *stream,
                history.as_deref_mut(),
                envp,
                name,
            );
            dispatch(&mut shell, &argv);
        }

        if delimiter != Delimiter::Separator {
            return;
        }
    }
}

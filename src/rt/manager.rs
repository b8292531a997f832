//! Shell manager.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use heapless::String;

use super::event::EventSource;
use super::pool::{Pool, Stack, TcbSlot};
use super::session::{self, ExitReason, Resources, SessionControl, SessionHandle, SessionId};
use super::spawner::{Priority, Spawner, StdSpawner, ThreadDescriptor};
use crate::error::Error;
use crate::shell::{DEFAULT_PROMPT, HistoryMode, HistoryRing, ManagerConfig, PROMPT_LENGTH, StackSource};
use crate::stream::Stream;

/// Owns a shell configuration and spawns sessions from it.
///
/// Several managers may share one TCB pool. Each manager keeps its own
/// prompt override, shared history ring and registry of sessions.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use xshell::rt::{ExitReason, Pool, ShellManager, TcbSlot};
/// use xshell::shell::{Command, ManagerConfig, StackSource};
/// use xshell::stream::IoStream;
///
/// let tcbs = Arc::new(Pool::<TcbSlot>::with_capacity(1));
/// let config = ManagerConfig::new("shell", &[Command::SENTINEL], StackSource::Heap { size: 4096 });
/// let manager = ShellManager::new(config, tcbs.clone());
///
/// let input: &[u8] = b"echo hi\r\x04";
/// let session = manager.spawn(IoStream::new(input, std::io::sink()), 0, &[]).unwrap();
/// assert_eq!(session.join(), Some(ExitReason::Logout));
/// assert_eq!(tcbs.free_count(), 1);
/// ```
pub struct ShellManager {
    config: ManagerConfig,
    tcbs: Arc<Pool<TcbSlot>>,
    spawner: Box<dyn Spawner>,
    events: EventSource,
    prompt: Option<Mutex<String<PROMPT_LENGTH>>>,
    history: Option<Mutex<HistoryRing>>,
    sessions: Mutex<Vec<Arc<SessionControl>>>,
    next_id: AtomicU32,
    started: Instant,
}

impl ShellManager {
    /// Create a manager spawning sessions on `std` threads.
    pub fn new(config: ManagerConfig, tcbs: Arc<Pool<TcbSlot>>) -> Arc<Self> {
        Self::with_spawner(config, tcbs, StdSpawner)
    }

    /// Create a manager with a custom thread spawner.
    pub fn with_spawner(
        config: ManagerConfig,
        tcbs: Arc<Pool<TcbSlot>>,
        spawner: impl Spawner + 'static,
    ) -> Arc<Self> {
        let prompt = config
            .options
            .prompt_override
            .then(|| Mutex::new(clipped(config.prompt.unwrap_or(DEFAULT_PROMPT))));
        let history = (config.options.history == HistoryMode::Shared)
            .then(|| Mutex::new(HistoryRing::new()));
        debug!(
            "manager {} created, {} shell slots",
            config.thread_name,
            tcbs.capacity()
        );

        Arc::new(Self {
            config,
            tcbs,
            spawner: Box::new(spawner),
            events: EventSource::new(),
            prompt,
            history,
            sessions: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
            started: Instant::now(),
        })
    }

    /// Start a session on `stream`, on its own thread.
    ///
    /// # Errors
    ///
    /// - [`Error::PoolExhausted`] if no TCB is free.
    /// - [`Error::StackExhausted`] if no stack could be allocated.
    /// - [`Error::SpawnFailed`] if the thread could not be started.
    ///
    /// Nothing is leaked on failure: whatever was taken goes back to its
    /// pool before this returns.
    pub fn spawn<S>(
        self: &Arc<Self>,
        stream: S,
        priority: Priority,
        envp: &'static [&'static str],
    ) -> Result<SessionHandle, Error>
    where
        S: Stream + Send + 'static,
    {
        let Some(mut tcb) = self.tcbs.alloc() else {
            warn!("spawn failed: {}", Error::PoolExhausted);
            return Err(Error::PoolExhausted);
        };
        tcb.reset(&self.config.options);

        let stack = match &self.config.stack {
            StackSource::Heap { size } => Stack::from_heap(*size),
            StackSource::Pool(pool) => Stack::from_pool(pool),
        };
        let stack = stack.inspect_err(|error| warn!("spawn failed: {}", error))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let control = Arc::new(SessionControl::new(id, self.config.thread_name));
        let thread = ThreadDescriptor {
            name: self.config.thread_name,
            stack_size: stack.size(),
            priority,
        };
        let body = {
            let manager = Arc::clone(self);
            let control = Arc::clone(&control);
            let resources = Resources { tcb, stack };
            Box::new(move || session::run_spawned(manager, control, stream, resources, envp))
        };

        self.registry().push(Arc::clone(&control));
        if let Err(error) = self.spawner.spawn(&thread, body) {
            self.registry().retain(|session| !Arc::ptr_eq(session, &control));
            warn!("spawn failed: {}", error);
            return Err(error);
        }

        info!("session {} spawned as {}", id, self.config.thread_name);
        Ok(SessionHandle::new(control, Arc::clone(self)))
    }

    /// Run a session on the calling thread until it ends.
    ///
    /// The session takes nothing from the pools. It is registered like a
    /// spawned one and its end is broadcast the same way.
    pub fn run<S: Stream>(&self, stream: S, envp: &'static [&'static str]) -> ExitReason {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let control = Arc::new(SessionControl::new(id, self.config.thread_name));
        self.registry().push(Arc::clone(&control));

        session::run_inline(self, &control, stream, envp)
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The "session ended" event source.
    pub fn events(&self) -> &EventSource {
        &self.events
    }

    /// The TCB pool sessions are drawn from.
    pub fn tcb_pool(&self) -> &Arc<Pool<TcbSlot>> {
        &self.tcbs
    }

    /// Time since the manager was created.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// The prompt printed before each line.
    ///
    /// The configured prompt, else [`DEFAULT_PROMPT`]. With
    /// `prompt_override` set, whatever [`set_prompt`](Self::set_prompt)
    /// stored last, starting from the configured prompt clipped to
    /// [`PROMPT_LENGTH`] bytes.
    pub fn prompt(&self) -> Cow<'_, str> {
        match &self.prompt {
            Some(prompt) => Cow::Owned(lock(prompt).as_str().into()),
            None => Cow::Borrowed(self.config.prompt.unwrap_or(DEFAULT_PROMPT)),
        }
    }

    /// Replace the prompt of every session of this manager. An empty
    /// string leaves sessions without a prompt.
    ///
    /// # Errors
    ///
    /// - [`Error::PromptDisabled`] unless `prompt_override` is set.
    /// - [`Error::PromptTooLong`] beyond [`PROMPT_LENGTH`] bytes.
    pub fn set_prompt(&self, prompt: &str) -> Result<(), Error> {
        let Some(current) = &self.prompt else {
            return Err(Error::PromptDisabled);
        };
        let prompt = String::try_from(prompt).map_err(|_| Error::PromptTooLong)?;
        *lock(current) = prompt;
        Ok(())
    }

    /// The history ring shared by all sessions, when history is shared.
    pub fn shared_history(&self) -> Option<&Mutex<HistoryRing>> {
        self.history.as_ref()
    }

    /// Forget every line of the shared history ring.
    pub fn clear_history(&self) {
        if let Some(history) = &self.history {
            lock(history).clear();
        }
    }

    /// Sessions known to this manager, running or terminated but not yet
    /// collected.
    pub fn sessions(&self) -> Vec<Arc<SessionControl>> {
        self.registry().clone()
    }

    /// Whether session `id` is still running.
    pub fn is_running(&self, id: SessionId) -> bool {
        self.registry()
            .iter()
            .any(|session| session.id() == id && !session.is_terminated())
    }

    /// Drop terminated sessions from the registry.
    ///
    /// `callback` sees every collected session. Returns how many were
    /// collected.
    pub fn collect(&self, mut callback: impl FnMut(&SessionControl)) -> usize {
        let finished: Vec<_> = {
            let mut registry = self.registry();
            let (finished, running): (Vec<_>, Vec<_>) = registry
                .drain(..)
                .partition(|session| session.is_terminated());
            *registry = running;
            finished
        };

        for session in &finished {
            callback(session);
        }
        if !finished.is_empty() {
            debug!("collected {} sessions", finished.len());
        }
        finished.len()
    }

    fn registry(&self) -> MutexGuard<'_, Vec<Arc<SessionControl>>> {
        lock(&self.sessions)
    }
}

impl fmt::Debug for ShellManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellManager")
            .field("config", &self.config)
            .field("tcbs", &self.tcbs)
            .field("prompt", &self.prompt())
            .field("sessions", &self.registry().len())
            .finish_non_exhaustive()
    }
}

fn clipped(prompt: &str) -> String<PROMPT_LENGTH> {
    let mut end = prompt.len().min(PROMPT_LENGTH);
    while !prompt.is_char_boundary(end) {
        end -= 1;
    }
    String::try_from(&prompt[..end]).unwrap_or_default()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

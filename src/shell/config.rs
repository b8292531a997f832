//! Manager configuration.

use std::fmt;
use std::sync::Arc;

use super::command::Command;
use super::context::Shell;
use super::dispatch::Dispatch;
use super::options::ShellOptions;
use crate::rt::{ExitReason, Pool, StackBuffer};

/// Hook run after every dispatched command.
///
/// It sees whether the command was found, plus the argument count and the
/// arguments. It cannot change the outcome of the dispatch.
pub type ExecHook = fn(shell: &mut Shell<'_>, outcome: Dispatch, argc: usize, argv: &[&str]);

/// Hook run once when a session leaves its loop, before its resources are
/// released.
pub type ExitHook = fn(shell: &mut Shell<'_>, reason: ExitReason);

/// Where session stacks come from.
#[derive(Clone)]
pub enum StackSource {
    /// Allocate `size` bytes from the heap for every session.
    Heap {
        /// Stack size in bytes. The memory starts on a
        /// [`STACK_ALIGN`](super::STACK_ALIGN) boundary.
        size: usize,
    },
    /// Take one fixed-size buffer from a pool.
    Pool(Arc<Pool<StackBuffer>>),
}

impl StackSource {
    /// Size of the stacks this source hands out.
    pub fn stack_size(&self) -> usize {
        match self {
            StackSource::Heap { size } => *size,
            StackSource::Pool(pool) => pool.object_size(),
        }
    }
}

impl fmt::Debug for StackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackSource::Heap { size } => f.debug_struct("Heap").field("size", size).finish(),
            StackSource::Pool(pool) => f
                .debug_struct("Pool")
                .field("object_size", &pool.object_size())
                .field("free", &pool.free_count())
                .field("capacity", &pool.capacity())
                .finish(),
        }
    }
}

/// Static configuration of a [`ShellManager`](crate::rt::ShellManager).
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use xshell::rt::{Pool, StackBuffer};
/// use xshell::shell::{Command, ManagerConfig, ShellOptions, StackSource};
///
/// let stacks = Arc::new(Pool::<StackBuffer>::stacks(2, 4096));
/// let options = ShellOptions { multi_command: true, ..ShellOptions::default() };
/// let config = ManagerConfig::new("console", &[Command::SENTINEL], StackSource::Pool(stacks))
///     .with_banner("\r\nwelcome\r\n")
///     .with_prompt("ch> ")
///     .with_options(options);
///
/// assert_eq!(config.prompt, Some("ch> "));
/// assert_eq!(config.stack.stack_size(), 4096);
/// ```
#[derive(Clone)]
pub struct ManagerConfig {
    /// Name given to session threads.
    pub thread_name: &'static str,
    /// Printed once when a session starts.
    pub banner: Option<&'static str>,
    /// Default prompt, [`DEFAULT_PROMPT`](super::DEFAULT_PROMPT) if `None`.
    pub prompt: Option<&'static str>,
    /// User command table, searched after the built-in one.
    pub commands: &'static [Command],
    /// Stack source for spawned sessions.
    pub stack: StackSource,
    /// Behaviour switches.
    pub options: ShellOptions,
    /// Post-dispatch hook.
    pub exec_hook: Option<ExecHook>,
    /// Session exit hook.
    pub exit_hook: Option<ExitHook>,
}

impl ManagerConfig {
    /// Create a configuration with default options and no banner.
    pub fn new(thread_name: &'static str, commands: &'static [Command], stack: StackSource) -> Self {
        Self {
            thread_name,
            banner: None,
            prompt: None,
            commands,
            stack,
            options: ShellOptions::default(),
            exec_hook: None,
            exit_hook: None,
        }
    }

    /// Set the banner.
    pub fn with_banner(mut self, banner: &'static str) -> Self {
        self.banner = Some(banner);
        self
    }

    /// Set the default prompt.
    pub fn with_prompt(mut self, prompt: &'static str) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ShellOptions) -> Self {
        self.options = options;
        self
    }

    /// Install a post-dispatch hook.
    pub fn with_exec_hook(mut self, hook: ExecHook) -> Self {
        self.exec_hook = Some(hook);
        self
    }

    /// Install a session exit hook.
    pub fn with_exit_hook(mut self, hook: ExitHook) -> Self {
        self.exit_hook = Some(hook);
        self
    }
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("thread_name", &self.thread_name)
            .field("banner", &self.banner)
            .field("prompt", &self.prompt)
            .field("commands", &Command::iter(self.commands).count())
            .field("stack", &self.stack)
            .field("options", &self.options)
            .field("exec_hook", &self.exec_hook.is_some())
            .field("exit_hook", &self.exit_hook.is_some())
            .finish()
    }
}

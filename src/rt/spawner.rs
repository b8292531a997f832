//! Thread creation seam.

use std::thread;

use crate::error::Error;

/// Thread priority, passed through to the [`Spawner`].
pub type Priority = u8;

/// What a session thread is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadDescriptor {
    /// Thread name.
    pub name: &'static str,
    /// Size of the stack reserved for the session.
    pub stack_size: usize,
    /// Requested priority.
    pub priority: Priority,
}

/// Starts session threads.
///
/// The manager calls this once per spawned session. If the thread cannot be
/// started, `body` must be dropped without running; the session resources
/// it owns are then released.
pub trait Spawner: Send + Sync {
    /// Start `body` on a new thread.
    fn spawn(&self, thread: &ThreadDescriptor, body: Box<dyn FnOnce() + Send>) -> Result<(), Error>;
}

/// [`Spawner`] backed by `std::thread`.
///
/// Priorities are ignored. The stack size is raised to
/// [`MIN_STACK_SIZE`](Self::MIN_STACK_SIZE) since hosted threads need more
/// room than an embedded shell stack provides.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdSpawner;

impl StdSpawner {
    /// Smallest stack given to a hosted thread.
    pub const MIN_STACK_SIZE: usize = 256 * 1024;
}

impl Spawner for StdSpawner {
    fn spawn(&self, thread: &ThreadDescriptor, body: Box<dyn FnOnce() + Send>) -> Result<(), Error> {
        thread::Builder::new()
            .name(thread.name.into())
            .stack_size(thread.stack_size.max(Self::MIN_STACK_SIZE))
            .spawn(body)
            .map(drop)
            .map_err(|_| Error::SpawnFailed)
    }
}

//! Threaded session runtime.
//!
//! A [`ShellManager`] owns the configuration and spawns sessions. Each
//! session takes a [`TcbSlot`] from a shared pool and a stack from the
//! configured [`StackSource`](crate::shell::StackSource), runs on its own
//! thread, and gives both back when its loop returns. The release and the
//! "session ended" broadcast happen as one step under the manager's
//! [`EventSource`] lock.

mod event;
mod manager;
mod pool;
mod session;
mod spawner;

pub use event::EventSource;
pub use manager::ShellManager;
pub use pool::{Pool, Pooled, Stack, StackBuffer, TcbSlot};
pub use session::{ExitReason, SessionControl, SessionHandle, SessionId};
pub use spawner::{Priority, Spawner, StdSpawner, ThreadDescriptor};

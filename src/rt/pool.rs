//! Fixed-capacity object pools.

use core::fmt;
use core::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Error;
use crate::shell::{HistoryRing, LineEditor, STACK_ALIGN, ShellOptions};

/// A pool of preallocated objects shared between threads.
///
/// Objects are created up front; [`alloc`](Pool::alloc) never allocates and
/// fails once every object is in use. An object goes back to the pool when
/// its [`Pooled`] guard is dropped.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use xshell::rt::Pool;
///
/// let pool = Arc::new(Pool::<u32>::with_capacity(2));
/// let a = pool.alloc().unwrap();
/// let _b = pool.alloc().unwrap();
/// assert!(pool.alloc().is_none());
///
/// drop(a);
/// assert_eq!(pool.free_count(), 1);
/// ```
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    capacity: usize,
    object_size: usize,
}

impl<T> Pool<T> {
    /// Create a pool holding the given objects.
    pub fn new(objects: impl IntoIterator<Item = T>) -> Self {
        let free: Vec<T> = objects.into_iter().collect();
        Self {
            capacity: free.len(),
            object_size: core::mem::size_of::<T>(),
            free: Mutex::new(free),
        }
    }

    /// Take an object out of the pool.
    pub fn alloc(self: &Arc<Self>) -> Option<Pooled<T>> {
        let object = self.objects().pop()?;
        Some(Pooled {
            object: Some(object),
            pool: Arc::clone(self),
        })
    }

    /// Number of objects ready to be allocated.
    pub fn free_count(&self) -> usize {
        self.objects().len()
    }

    /// Number of objects the pool was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of objects currently allocated.
    pub fn in_use(&self) -> usize {
        self.capacity - self.free_count()
    }

    /// Size of one object in bytes.
    pub fn object_size(&self) -> usize {
        self.object_size
    }

    fn objects(&self) -> MutexGuard<'_, Vec<T>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, object: T) {
        self.objects().push(object);
    }
}

impl<T: Default> Pool<T> {
    /// Create a pool of `capacity` default objects.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new((0..capacity).map(|_| T::default()))
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("free", &self.free_count())
            .field("capacity", &self.capacity)
            .field("object_size", &self.object_size)
            .finish()
    }
}

/// An object on loan from a [`Pool`].
pub struct Pooled<T> {
    object: Option<T>,
    pool: Arc<Pool<T>>,
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.object {
            Some(object) => object,
            None => unreachable!("pooled object taken before drop"),
        }
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.object {
            Some(object) => object,
            None => unreachable!("pooled object taken before drop"),
        }
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(object) = self.object.take() {
            self.pool.release(object);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.object).finish()
    }
}

/// One [`STACK_ALIGN`]-aligned unit of stack memory.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C, align(16))]
struct StackChunk([u8; STACK_ALIGN]);

const _: () = assert!(core::mem::align_of::<StackChunk>() == STACK_ALIGN);

/// Memory reserved for one session stack.
///
/// Holds exactly the requested number of usable bytes and starts on a
/// [`STACK_ALIGN`] boundary.
pub struct StackBuffer {
    chunks: Box<[StackChunk]>,
    len: usize,
}

impl StackBuffer {
    /// Zeroed stack memory of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            chunks: vec![StackChunk::default(); size.div_ceil(STACK_ALIGN)].into_boxed_slice(),
            len: size,
        }
    }

    /// Like [`new`](Self::new), but reports a failed allocation.
    ///
    /// # Errors
    ///
    /// [`Error::StackExhausted`] if the memory cannot be reserved.
    pub fn try_new(size: usize) -> Result<Self, Error> {
        let count = size.div_ceil(STACK_ALIGN);
        let mut chunks = Vec::new();
        chunks
            .try_reserve_exact(count)
            .map_err(|_| Error::StackExhausted)?;
        chunks.resize(count, StackChunk::default());
        Ok(Self {
            chunks: chunks.into_boxed_slice(),
            len: size,
        })
    }

    /// Usable size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer has no usable bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lowest address of the stack memory.
    pub fn as_ptr(&self) -> *const u8 {
        self.chunks.as_ptr().cast()
    }
}

impl fmt::Debug for StackBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBuffer")
            .field("len", &self.len)
            .field("base", &self.as_ptr())
            .finish()
    }
}

impl Pool<StackBuffer> {
    /// Create a pool of `count` zeroed stacks of `size` bytes each.
    pub fn stacks(count: usize, size: usize) -> Self {
        let mut pool = Self::new((0..count).map(|_| StackBuffer::new(size)));
        pool.object_size = size;
        pool
    }
}

/// A session stack and where it came from.
///
/// Dropping the stack returns it to its source.
#[derive(Debug)]
pub enum Stack {
    /// Allocated from the heap.
    Heap(StackBuffer),
    /// Borrowed from a stack pool.
    Pool(Pooled<StackBuffer>),
}

impl Stack {
    /// Allocate `size` bytes from the heap.
    pub fn from_heap(size: usize) -> Result<Self, Error> {
        StackBuffer::try_new(size).map(Stack::Heap)
    }

    /// Take one stack from `pool`.
    pub fn from_pool(pool: &Arc<Pool<StackBuffer>>) -> Result<Self, Error> {
        pool.alloc().map(Stack::Pool).ok_or(Error::StackExhausted)
    }

    fn buffer(&self) -> &StackBuffer {
        match self {
            Stack::Heap(buffer) => buffer,
            Stack::Pool(buffer) => &**buffer,
        }
    }

    /// Stack size in bytes.
    pub fn size(&self) -> usize {
        self.buffer().len()
    }

    /// Lowest address of the stack memory.
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer().as_ptr()
    }
}

/// Per-session state drawn from the shared thread pool.
///
/// Holds what a session needs between prompts: its line editor and its
/// own history ring. Both are reset when the slot is handed to a new
/// session.
#[derive(Debug, Clone, Default)]
pub struct TcbSlot {
    /// Line editor state.
    pub editor: LineEditor,
    /// Per-session history.
    pub history: HistoryRing,
}

impl TcbSlot {
    /// Prepare the slot for a new session.
    pub fn reset(&mut self, options: &ShellOptions) {
        self.editor = LineEditor::new(options);
        self.history.clear();
    }
}

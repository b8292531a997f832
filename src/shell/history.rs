//! Fixed-depth history of accepted lines.
//!
//! Lines are stored in a ring of `D` slots. `head` is the next slot to
//! write, `current` is the recall cursor moved by the up and down keys.
//! Recall wraps at both ends of the ring but never stops on an empty slot,
//! so with fewer than `D` lines stored the oldest one is sticky.

use heapless::{String, Vec};

use super::{HISTORY_DEPTH, LINE_LENGTH};

/// Line storage shared by the editor and the history ring.
pub type LineBuffer = Vec<u8, LINE_LENGTH>;

/// Access to a history ring from the line editor.
///
/// Implemented by [`HistoryRing`] itself (per-session history) and, with
/// the `std` feature, by [`SharedHistory`] which guards a ring shared by
/// several sessions with a mutex.
pub trait Recall {
    /// Store an accepted line. Blank lines are not stored.
    fn save(&mut self, line: &str);

    /// Reset the recall cursor to the most recent position.
    fn rewind(&mut self);

    /// Step back to the previous line, copying it into `out`.
    ///
    /// Returns `false`, leaving `out` untouched, when there is nothing to
    /// step back to.
    fn previous(&mut self, out: &mut LineBuffer) -> bool;

    /// Step forward to the next line, copying it into `out`.
    ///
    /// Returns `false`, leaving `out` untouched, when there is nothing to
    /// step forward to.
    fn next(&mut self, out: &mut LineBuffer) -> bool;
}

/// A [`Recall`] that stores nothing, for sessions without history.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl Recall for NoHistory {
    fn save(&mut self, _line: &str) {}

    fn rewind(&mut self) {}

    fn previous(&mut self, _out: &mut LineBuffer) -> bool {
        false
    }

    fn next(&mut self, _out: &mut LineBuffer) -> bool {
        false
    }
}

/// Ring of the last `D` accepted lines.
///
/// # Examples
///
/// ```rust
/// use xshell::shell::HistoryRing;
///
/// let mut history = HistoryRing::<4>::new();
/// history.push("first");
/// history.push("second");
///
/// history.rewind();
/// assert_eq!(history.previous_line(), Some("second"));
/// assert_eq!(history.previous_line(), Some("first"));
/// assert_eq!(history.previous_line(), None);
/// assert_eq!(history.next_line(), Some("second"));
/// ```
#[derive(Debug, Clone)]
pub struct HistoryRing<const D: usize = HISTORY_DEPTH> {
    slots: [String<LINE_LENGTH>; D],
    head: usize,
    current: usize,
}

impl<const D: usize> Default for HistoryRing<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> HistoryRing<D> {
    /// Create an empty ring.
    pub const fn new() -> Self {
        Self {
            slots: [const { String::new() }; D],
            head: 0,
            current: 0,
        }
    }

    /// Number of slots.
    pub const fn depth(&self) -> usize {
        D
    }

    /// Number of stored lines.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    /// Whether no line has been stored since the last [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.slots.first().is_none_or(|slot| slot.is_empty())
    }

    /// Index of the next slot to write.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Index of the recall cursor.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Store a line, overwriting the oldest one when the ring is full.
    ///
    /// Returns `false` if the line was blank and not stored. Lines longer
    /// than a line buffer are cut.
    pub fn push(&mut self, line: &str) -> bool {
        if D == 0 || is_blank(line) {
            return false;
        }

        let slot = &mut self.slots[self.head];
        slot.clear();
        for ch in line.chars() {
            if slot.push(ch).is_err() {
                break;
            }
        }
        self.head = (self.head + 1) % D;
        true
    }

    /// Move the recall cursor back to `head`.
    pub fn rewind(&mut self) {
        self.current = self.head;
    }

    /// Step the recall cursor back and return the line under it.
    pub fn previous_line(&mut self) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let slot = if self.current == 0 { D - 1 } else { self.current - 1 };
        self.step_to(slot)
    }

    /// Step the recall cursor forward and return the line under it.
    pub fn next_line(&mut self) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let slot = (self.current + 1) % D;
        self.step_to(slot)
    }

    /// Forget every stored line.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.clear();
        }
        self.head = 0;
        self.current = 0;
    }

    /// Stored lines, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (1..=D)
            .map(move |back| &self.slots[(self.head + D - back) % D])
            .filter(|slot| !slot.is_empty())
            .map(|slot| slot.as_str())
    }

    fn step_to(&mut self, slot: usize) -> Option<&str> {
        if self.slots[slot].is_empty() {
            return None;
        }
        self.current = slot;
        Some(self.slots[slot].as_str())
    }
}

impl<const D: usize> Recall for HistoryRing<D> {
    fn save(&mut self, line: &str) {
        self.push(line);
    }

    fn rewind(&mut self) {
        HistoryRing::rewind(self);
    }

    fn previous(&mut self, out: &mut LineBuffer) -> bool {
        copy_out(self.previous_line(), out)
    }

    fn next(&mut self, out: &mut LineBuffer) -> bool {
        copy_out(self.next_line(), out)
    }
}

/// A [`HistoryRing`] shared by several sessions.
///
/// Every access locks the mutex, and recalled text is copied out before
/// the lock is released.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SharedHistory<'a, const D: usize = HISTORY_DEPTH>(pub &'a std::sync::Mutex<HistoryRing<D>>);

#[cfg(feature = "std")]
impl<const D: usize> SharedHistory<'_, D> {
    fn ring(&self) -> std::sync::MutexGuard<'_, HistoryRing<D>> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(feature = "std")]
impl<const D: usize> Recall for SharedHistory<'_, D> {
    fn save(&mut self, line: &str) {
        self.ring().push(line);
    }

    fn rewind(&mut self) {
        self.ring().rewind();
    }

    fn previous(&mut self, out: &mut LineBuffer) -> bool {
        copy_out(self.ring().previous_line(), out)
    }

    fn next(&mut self, out: &mut LineBuffer) -> bool {
        copy_out(self.ring().next_line(), out)
    }
}

/// Whether a line only holds spaces.
pub fn is_blank(line: &str) -> bool {
    line.bytes().all(|b| b == b' ')
}

fn copy_out(line: Option<&str>, out: &mut LineBuffer) -> bool {
    match line {
        Some(line) => {
            out.clear();
            // Slots and buffers share the same capacity.
            let _ = out.extend_from_slice(line.as_bytes());
            true
        }
        None => false,
    }
}

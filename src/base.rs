//! Shared state and helpers common to every channel flavor.

use std::sync::Arc;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::waiter::{Token, WaiterQueue};

/// Locks `m`, recovering the guard from a poisoned lock rather than
/// propagating the panic. A panic while holding a channel's lock can only
/// come from a value's own `Drop` impl; the channel's bookkeeping is left
/// consistent either way, so there is nothing gained by poisoning here.
#[inline]
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// The result of asking a channel whether an operation is currently
/// satisfiable, used by `select`'s re-scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelStatus {
    NotAvailable,
    Available,
    Closed,
}

/// Fields shared by every channel flavor: parked-direct-waiter counters, the
/// select waiter queues, and the closed flag.
///
/// Every field here is read and written only while the owning channel's lock
/// is held; the two condition variables (`cond_read`/`cond_write`) live
/// alongside this struct in each flavor's `Inner` rather than inside it, so
/// that `Condvar::wait` can borrow the mutex guard independently of this
/// struct's own borrow.
pub(crate) struct WaitState {
    pub(crate) readers: usize,
    pub(crate) writers: usize,
    pub(crate) read_waiters: WaiterQueue,
    pub(crate) write_waiters: WaiterQueue,
    pub(crate) closed: bool,
}

impl WaitState {
    pub(crate) fn new() -> Self {
        WaitState {
            readers: 0,
            writers: 0,
            read_waiters: WaiterQueue::new(),
            write_waiters: WaiterQueue::new(),
            closed: false,
        }
    }

    /// Wakes exactly one waiter able to make progress on the read side: a
    /// parked direct `recv` if one exists, else the head of the select
    /// waiter queue (rotated to the tail for round-robin fairness).
    pub(crate) fn notify_readers(&mut self, cond_read: &Condvar) {
        if self.readers > 0 {
            cond_read.notify_one();
        } else {
            self.read_waiters.rotate_head_and_notify();
        }
    }

    /// Mirror of `notify_readers` for the write side.
    pub(crate) fn notify_writers(&mut self, cond_write: &Condvar) {
        if self.writers > 0 {
            cond_write.notify_one();
        } else {
            self.write_waiters.rotate_head_and_notify();
        }
    }

    /// Registers `token` as a select waiter for the read side, unless the
    /// channel is closed or a message is already available (in which case
    /// the caller should attempt the operation immediately instead).
    pub(crate) fn register_reader_waiter(&mut self, token: Arc<Token>, has_messages: bool) -> bool {
        if self.closed || has_messages {
            return false;
        }
        self.read_waiters.append(token);
        true
    }

    /// Mirror of `register_reader_waiter` for the write side.
    pub(crate) fn register_writer_waiter(&mut self, token: Arc<Token>, has_capacity: bool) -> bool {
        if self.closed || has_capacity {
            return false;
        }
        self.write_waiters.append(token);
        true
    }

    pub(crate) fn unregister_reader_waiter(&mut self, token: &Arc<Token>) {
        self.read_waiters.remove(token);
    }

    pub(crate) fn unregister_writer_waiter(&mut self, token: &Arc<Token>) {
        self.write_waiters.remove(token);
    }

    /// Idempotent. Flips `closed`, releases every registered select token,
    /// and broadcasts both condition variables. Returns `true` iff this call
    /// is the one that closed the channel.
    pub(crate) fn mark_closed(&mut self, cond_read: &Condvar, cond_write: &Condvar) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.read_waiters.release_all();
        self.write_waiters.release_all();
        cond_read.notify_all();
        cond_write.notify_all();
        true
    }
}

/// RAII guard that runs a closure once on drop, including on an early return
/// via `?` or during unwinding.
///
/// Each flavor bumps its `readers`/`writers` counter while already holding
/// the lock, then installs one of these to perform the matching decrement
/// (by re-acquiring the lock) no matter which path out of `send`/`recv` is
/// taken. This is the fix spec.md's design notes ask for in place of
/// duplicating the decrement across the normal and interrupted paths.
pub(crate) struct ScopedDecrement<F: FnMut()> {
    decrement: F,
}

impl<F: FnMut()> ScopedDecrement<F> {
    pub(crate) fn new(decrement: F) -> Self {
        ScopedDecrement { decrement }
    }
}

impl<F: FnMut()> Drop for ScopedDecrement<F> {
    fn drop(&mut self) {
        (self.decrement)();
    }
}

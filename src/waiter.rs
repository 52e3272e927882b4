//! Notification tokens and the per-channel queues that hold them.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::deadline::Deadline;

/// A counting semaphore used by a [`select`](crate::select::select) caller to
/// be woken by any of the channels it has registered on.
///
/// A release that happens between registration and acquire is never lost: the
/// count simply accumulates, which is the whole point of using a counting
/// semaphore here instead of a condition variable keyed to a boolean flag.
pub(crate) struct Token {
    state: Mutex<u32>,
    cond: Condvar,
}

impl Token {
    pub(crate) fn new() -> Arc<Token> {
        Arc::new(Token {
            state: Mutex::new(0),
            cond: Condvar::new(),
        })
    }

    /// Increments the count and wakes one waiter, if any.
    pub(crate) fn release(&self) {
        let mut count = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *count += 1;
        self.cond.notify_one();
    }

    /// Blocks until the count is positive, then decrements it.
    pub(crate) fn acquire(&self) {
        let mut count = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while *count == 0 {
            count = self.cond.wait(count).unwrap_or_else(|e| e.into_inner());
        }
        *count -= 1;
    }

    /// Blocks until the count is positive or `deadline` elapses, then
    /// decrements it on success. Returns `false` on timeout.
    pub(crate) fn acquire_deadline(&self, deadline: Deadline) -> bool {
        let mut count = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if *count > 0 {
                *count -= 1;
                return true;
            }
            if deadline.has_elapsed() {
                return false;
            }
            let (guard, kept_waiting) = deadline.wait(count, &self.cond);
            count = guard;
            if !kept_waiting {
                return *count > 0 && {
                    *count -= 1;
                    true
                };
            }
        }
    }
}

/// Identity comparison for a notification token, used when removing it from a
/// waiter queue.
pub(crate) fn same_token(a: &Arc<Token>, b: &Arc<Token>) -> bool {
    Arc::ptr_eq(a, b)
}

/// An ordered ring of notification tokens belonging to `select` callers
/// currently parked on one side (read or write) of a channel.
///
/// All mutating operations are expected to run under the owning channel's
/// lock; the queue itself performs no locking of its own.
#[derive(Default)]
pub(crate) struct WaiterQueue {
    waiters: VecDeque<Arc<Token>>,
}

impl WaiterQueue {
    pub(crate) fn new() -> Self {
        WaiterQueue {
            waiters: VecDeque::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    pub(crate) fn append(&mut self, token: Arc<Token>) {
        self.waiters.push_back(token);
    }

    /// Removes the first identity match, if present. No-op if absent.
    pub(crate) fn remove(&mut self, token: &Arc<Token>) {
        if let Some(pos) = self.waiters.iter().position(|t| same_token(t, token)) {
            self.waiters.remove(pos);
        }
    }

    /// Moves the head of the queue to the tail and releases it, providing
    /// round-robin fairness between select callers contending on the same
    /// channel. Returns `true` if a waiter was notified.
    pub(crate) fn rotate_head_and_notify(&mut self) -> bool {
        if let Some(token) = self.waiters.pop_front() {
            token.release();
            self.waiters.push_back(token);
            true
        } else {
            false
        }
    }

    /// Releases every waiter and empties the queue. Used by `close`.
    pub(crate) fn release_all(&mut self) {
        for token in self.waiters.drain(..) {
            token.release();
        }
    }

    #[cfg(test)]
    pub(crate) fn for_each(&self, mut f: impl FnMut(&Arc<Token>)) {
        for token in &self.waiters {
            f(token);
        }
    }
}

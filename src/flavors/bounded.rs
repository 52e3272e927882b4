//! Bounded (buffered) channel flavor: a FIFO queue of fixed capacity.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::base::{lock, ChannelStatus, ScopedDecrement, WaitState};
use crate::deadline::Deadline;
use crate::err::{RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError};
use crate::waiter::Token;

struct Inner<T> {
    queue: VecDeque<T>,
    capacity: usize,
    wait: WaitState,
}

impl<T> Inner<T> {
    fn has_messages(&self) -> bool {
        !self.queue.is_empty()
    }

    fn has_capacity(&self) -> bool {
        self.queue.len() < self.capacity
    }
}

/// A FIFO channel with a fixed, positive capacity.
pub(crate) struct Channel<T> {
    inner: Mutex<Inner<T>>,
    cond_read: Condvar,
    cond_write: Condvar,
}

impl<T> Channel<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "bounded channel must have positive capacity");
        Channel {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                wait: WaitState::new(),
            }),
            cond_read: Condvar::new(),
            cond_write: Condvar::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        lock(&self.inner).capacity
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).queue.len()
    }

    pub(crate) fn send(&self, value: T) -> Result<(), SendError<T>> {
        match self.send_deadline(value, Deadline::unbounded()) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Closed(v)) => Err(SendError(v)),
            Err(SendTimeoutError::Timeout(_)) => unreachable!("unbounded deadline cannot time out"),
        }
    }

    pub(crate) fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        match self.send_deadline(value, Deadline::zero()) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Closed(v)) => Err(TrySendError::Closed(v)),
            Err(SendTimeoutError::Timeout(v)) => Err(TrySendError::Full(v)),
        }
    }

    pub(crate) fn send_timeout(
        &self,
        value: T,
        deadline: Deadline,
    ) -> Result<(), SendTimeoutError<T>> {
        self.send_deadline(value, deadline)
    }

    fn send_deadline(&self, value: T, deadline: Deadline) -> Result<(), SendTimeoutError<T>> {
        let mut inner = lock(&self.inner);

        if inner.wait.closed {
            return Err(SendTimeoutError::Closed(value));
        }
        if inner.has_capacity() {
            inner.queue.push_back(value);
            inner.wait.notify_readers(&self.cond_read);
            return Ok(());
        }
        if matches!(deadline, Deadline::Zero) {
            return Err(SendTimeoutError::Timeout(value));
        }

        inner.wait.writers += 1;
        let dec = ScopedDecrement::new(|| lock(&self.inner).wait.writers -= 1);

        while !inner.wait.closed && !inner.has_capacity() {
            let (guard, kept_waiting) = deadline.wait(inner, &self.cond_write);
            inner = guard;
            if !kept_waiting {
                break;
            }
        }

        let timed_out = !inner.wait.closed && !inner.has_capacity();
        let closed = inner.wait.closed;
        if !timed_out && !closed {
            inner.queue.push_back(value);
            inner.wait.notify_readers(&self.cond_read);
            drop(inner);
            drop(dec);
            return Ok(());
        }
        drop(inner);
        drop(dec);
        if closed {
            Err(SendTimeoutError::Closed(value))
        } else {
            Err(SendTimeoutError::Timeout(value))
        }
    }

    pub(crate) fn recv(&self) -> Result<T, RecvError> {
        match self.recv_deadline(Deadline::unbounded()) {
            Ok(v) => Ok(v),
            Err(RecvTimeoutError::Closed) => Err(RecvError),
            Err(RecvTimeoutError::Timeout) => unreachable!("unbounded deadline cannot time out"),
        }
    }

    pub(crate) fn try_recv(&self) -> Result<T, TryRecvError> {
        match self.recv_deadline(Deadline::zero()) {
            Ok(v) => Ok(v),
            Err(RecvTimeoutError::Closed) => Err(TryRecvError::Closed),
            Err(RecvTimeoutError::Timeout) => Err(TryRecvError::Empty),
        }
    }

    pub(crate) fn recv_timeout(&self, deadline: Deadline) -> Result<T, RecvTimeoutError> {
        self.recv_deadline(deadline)
    }

    fn recv_deadline(&self, deadline: Deadline) -> Result<T, RecvTimeoutError> {
        let mut inner = lock(&self.inner);

        if let Some(v) = inner.queue.pop_front() {
            inner.wait.notify_writers(&self.cond_write);
            return Ok(v);
        }
        if inner.wait.closed {
            return Err(RecvTimeoutError::Closed);
        }
        if matches!(deadline, Deadline::Zero) {
            return Err(RecvTimeoutError::Timeout);
        }

        inner.wait.readers += 1;
        let dec = ScopedDecrement::new(|| lock(&self.inner).wait.readers -= 1);

        while !inner.wait.closed && !inner.has_messages() {
            let (guard, kept_waiting) = deadline.wait(inner, &self.cond_read);
            inner = guard;
            if !kept_waiting {
                break;
            }
        }

        let result = if let Some(v) = inner.queue.pop_front() {
            inner.wait.notify_writers(&self.cond_write);
            Ok(v)
        } else if inner.wait.closed {
            Err(RecvTimeoutError::Closed)
        } else {
            Err(RecvTimeoutError::Timeout)
        };
        drop(inner);
        drop(dec);
        result
    }

    /// Returns `true` iff this call is the one that closed the channel.
    pub(crate) fn close(&self) -> bool {
        let mut inner = lock(&self.inner);
        inner.wait.mark_closed(&self.cond_read, &self.cond_write)
    }

    /// A buffered channel is only fully closed once drained: queued values
    /// placed before `close` remain deliverable.
    pub(crate) fn is_closed(&self) -> bool {
        let inner = lock(&self.inner);
        inner.wait.closed && inner.queue.is_empty()
    }

    pub(crate) fn status_for_reader(&self) -> ChannelStatus {
        let inner = lock(&self.inner);
        if inner.has_messages() {
            ChannelStatus::Available
        } else if inner.wait.closed {
            ChannelStatus::Closed
        } else {
            ChannelStatus::NotAvailable
        }
    }

    pub(crate) fn status_for_writer(&self) -> ChannelStatus {
        let inner = lock(&self.inner);
        if inner.wait.closed {
            ChannelStatus::Closed
        } else if inner.has_capacity() {
            ChannelStatus::Available
        } else {
            ChannelStatus::NotAvailable
        }
    }

    /// Non-blocking attempt used by the select engine's fast path and
    /// re-scan. Mirrors `try_recv` but does not distinguish `Empty` from
    /// "not selected"; the caller already knows a message is available.
    pub(crate) fn select_try_recv(&self) -> Option<T> {
        let mut inner = lock(&self.inner);
        let v = inner.queue.pop_front();
        if v.is_some() {
            inner.wait.notify_writers(&self.cond_write);
        }
        v
    }

    pub(crate) fn select_try_send(&self, value: T) -> Result<(), T> {
        let mut inner = lock(&self.inner);
        if inner.has_capacity() {
            inner.queue.push_back(value);
            inner.wait.notify_readers(&self.cond_read);
            Ok(())
        } else {
            Err(value)
        }
    }

    pub(crate) fn register_reader_waiter(&self, token: Arc<Token>) -> bool {
        let mut inner = lock(&self.inner);
        let has_messages = inner.has_messages();
        inner.wait.register_reader_waiter(token, has_messages)
    }

    pub(crate) fn unregister_reader_waiter(&self, token: &Arc<Token>) {
        lock(&self.inner).wait.unregister_reader_waiter(token);
    }

    pub(crate) fn register_writer_waiter(&self, token: Arc<Token>) -> bool {
        let mut inner = lock(&self.inner);
        let has_capacity = inner.has_capacity();
        inner.wait.register_writer_waiter(token, has_capacity)
    }

    pub(crate) fn unregister_writer_waiter(&self, token: &Arc<Token>) {
        lock(&self.inner).wait.unregister_writer_waiter(token);
    }
}

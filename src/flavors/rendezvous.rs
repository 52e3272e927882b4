//! Rendezvous (zero-capacity, synchronous) channel flavor.
//!
//! A value is handed directly from a sender to a receiver with no
//! intervening buffer: a blocking `send` deposits into a single slot and
//! then waits for that exact value to be taken before returning.

use std::sync::{Condvar, Mutex};

use crate::base::{lock, ChannelStatus, ScopedDecrement, WaitState};
use crate::deadline::Deadline;
use crate::err::{RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError};
use crate::waiter::Token;
use std::sync::Arc;

struct Inner<T> {
    slot: Option<T>,
    wait: WaitState,
}

impl<T> Inner<T> {
    fn has_messages(&self) -> bool {
        self.slot.is_some()
    }

    /// Capacity exists only if a reader is already visibly present: this is
    /// what distinguishes a rendezvous channel from a plain one-slot buffer.
    fn has_capacity(&self) -> bool {
        self.slot.is_none() && (self.wait.readers > 0 || !self.wait.read_waiters.is_empty())
    }
}

pub(crate) struct Channel<T> {
    inner: Mutex<Inner<T>>,
    cond_read: Condvar,
    cond_write: Condvar,
    /// Signaled whenever the slot transitions to empty. `close()`'s
    /// drain-wait parks here rather than on `cond_write`: that condvar is
    /// also where a genuine blocked `send` parks in its phase 2, and
    /// `notify_one` makes no promise about *which* waiter it wakes. Sharing
    /// one condvar between the closer and the sender let a `notify_one`
    /// aimed at the sender wake the closer instead, leaving the sender
    /// asleep forever even though its value had already been delivered.
    cond_drain: Condvar,
}

impl<T> Channel<T> {
    pub(crate) fn new() -> Self {
        Channel {
            inner: Mutex::new(Inner {
                slot: None,
                wait: WaitState::new(),
            }),
            cond_read: Condvar::new(),
            cond_write: Condvar::new(),
            cond_drain: Condvar::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        if lock(&self.inner).has_messages() {
            1
        } else {
            0
        }
    }

    pub(crate) fn send(&self, value: T) -> Result<(), SendError<T>> {
        match self.send_deadline(value, Deadline::unbounded()) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Closed(v)) => Err(SendError(v)),
            Err(SendTimeoutError::Timeout(_)) => unreachable!("unbounded deadline cannot time out"),
        }
    }

    pub(crate) fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut inner = lock(&self.inner);
        if inner.wait.closed {
            return Err(TrySendError::Closed(value));
        }
        if inner.has_capacity() {
            inner.slot = Some(value);
            inner.wait.notify_readers(&self.cond_read);
            Ok(())
        } else {
            Err(TrySendError::Full(value))
        }
    }

    pub(crate) fn send_timeout(&self, value: T, deadline: Deadline) -> Result<(), SendTimeoutError<T>> {
        self.send_deadline(value, deadline)
    }

    /// Deadline governs only the wait for a free slot (phase 1). Once a
    /// value has been deposited the rendezvous is in motion and the sender
    /// waits unconditionally for it to be consumed (phase 2) — matching the
    /// real CSP hand-off (and `crossbeam-channel`'s own zero-capacity flavor,
    /// whose sender never re-applies a deadline after the packet has been
    /// written).
    fn send_deadline(&self, value: T, deadline: Deadline) -> Result<(), SendTimeoutError<T>> {
        let mut inner = lock(&self.inner);

        if inner.wait.closed {
            return Err(SendTimeoutError::Closed(value));
        }

        // A non-blocking attempt must gate on visible reader presence, the
        // same as `try_send`: depositing into an empty slot with nobody
        // around to take it would commit us to an unbounded phase-2 wait,
        // defeating the point of a zero timeout.
        if matches!(deadline, Deadline::Zero) {
            return if inner.has_capacity() {
                inner.slot = Some(value);
                inner.wait.notify_readers(&self.cond_read);
                Ok(())
            } else {
                Err(SendTimeoutError::Timeout(value))
            };
        }

        inner.wait.writers += 1;
        let dec = ScopedDecrement::new(|| lock(&self.inner).wait.writers -= 1);

        // Phase 1: wait for the slot to clear.
        while !inner.wait.closed && inner.slot.is_some() {
            let (guard, kept_waiting) = deadline.wait(inner, &self.cond_write);
            inner = guard;
            if !kept_waiting {
                break;
            }
        }

        if inner.wait.closed {
            drop(inner);
            drop(dec);
            return Err(SendTimeoutError::Closed(value));
        }
        if inner.slot.is_some() {
            drop(inner);
            drop(dec);
            return Err(SendTimeoutError::Timeout(value));
        }

        inner.slot = Some(value);
        inner.wait.notify_readers(&self.cond_read);

        // Phase 2: wait, unconditionally, for the value to be taken.
        while inner.slot.is_some() {
            let (guard, _) = Deadline::unbounded().wait(inner, &self.cond_write);
            inner = guard;
        }
        inner.wait.notify_writers(&self.cond_write);
        drop(inner);
        drop(dec);
        Ok(())
    }

    pub(crate) fn recv(&self) -> Result<T, RecvError> {
        match self.recv_deadline(Deadline::unbounded()) {
            Ok(v) => Ok(v),
            Err(RecvTimeoutError::Closed) => Err(RecvError),
            Err(RecvTimeoutError::Timeout) => unreachable!("unbounded deadline cannot time out"),
        }
    }

    pub(crate) fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut inner = lock(&self.inner);
        if let Some(v) = inner.slot.take() {
            inner.wait.notify_writers(&self.cond_write);
            self.cond_drain.notify_all();
            Ok(v)
        } else if inner.wait.closed {
            Err(TryRecvError::Closed)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    pub(crate) fn recv_timeout(&self, deadline: Deadline) -> Result<T, RecvTimeoutError> {
        self.recv_deadline(deadline)
    }

    fn recv_deadline(&self, deadline: Deadline) -> Result<T, RecvTimeoutError> {
        let mut inner = lock(&self.inner);

        inner.wait.readers += 1;
        let dec = ScopedDecrement::new(|| lock(&self.inner).wait.readers -= 1);

        if !inner.wait.closed && inner.slot.is_none() {
            // A producer may be parked only because no reader was visibly
            // present; announce our arrival.
            inner.wait.notify_writers(&self.cond_write);
        }
        if inner.slot.is_none() && inner.wait.closed {
            drop(inner);
            drop(dec);
            return Err(RecvTimeoutError::Closed);
        }
        if inner.slot.is_none() && matches!(deadline, Deadline::Zero) {
            drop(inner);
            drop(dec);
            return Err(RecvTimeoutError::Timeout);
        }

        while !inner.wait.closed && inner.slot.is_none() {
            let (guard, kept_waiting) = deadline.wait(inner, &self.cond_read);
            inner = guard;
            if !kept_waiting {
                break;
            }
        }

        let result = if let Some(v) = inner.slot.take() {
            inner.wait.notify_writers(&self.cond_write);
            self.cond_drain.notify_all();
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

    /// Idempotent. Blocks until any value deposited before this call returns
    /// has been received, guaranteeing invariant 5: no send that completed
    /// before `close` returns can be lost.
    ///
    /// Parks on `cond_drain`, not `cond_write`: a blocked `send`'s phase 2
    /// also parks on `cond_write` waiting for its value to be taken, and
    /// `Condvar::notify_one` (issued by the receiver that takes it) makes no
    /// promise about which of the two waiters it wakes. A dedicated condvar,
    /// broadcast whenever the slot is drained, means the closer's wake-up
    /// can never be swallowed by the wrong recipient.
    pub(crate) fn close(&self) -> bool {
        let mut inner = lock(&self.inner);
        let closed_now = inner.wait.mark_closed(&self.cond_read, &self.cond_write);
        while inner.slot.is_some() {
            let (guard, _) = Deadline::unbounded().wait(inner, &self.cond_drain);
            inner = guard;
        }
        closed_now
    }

    pub(crate) fn is_closed(&self) -> bool {
        let inner = lock(&self.inner);
        inner.wait.closed && inner.slot.is_none()
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

    pub(crate) fn select_try_recv(&self) -> Option<T> {
        let mut inner = lock(&self.inner);
        let v = inner.slot.take();
        if v.is_some() {
            inner.wait.notify_writers(&self.cond_write);
            self.cond_drain.notify_all();
        }
        v
    }

    pub(crate) fn select_try_send(&self, value: T) -> Result<(), T> {
        let mut inner = lock(&self.inner);
        if inner.has_capacity() {
            inner.slot = Some(value);
            inner.wait.notify_readers(&self.cond_read);
            Ok(())
        } else {
            Err(value)
        }
    }

    pub(crate) fn register_reader_waiter(&self, token: Arc<Token>) -> bool {
        let mut inner = lock(&self.inner);
        let has_messages = inner.has_messages();
        let registered = inner.wait.register_reader_waiter(token, has_messages);
        if registered && !inner.wait.closed && inner.slot.is_none() {
            // A reader is now visibly present; wake any capacity-starved writer.
            inner.wait.notify_writers(&self.cond_write);
        }
        registered
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn try_send_fails_without_a_waiting_receiver() {
        let chan: Channel<i32> = Channel::new();
        match chan.try_send(1) {
            Err(TrySendError::Full(1)) => {}
            _ => panic!("try_send should fail without a parked receiver"),
        }
    }

    #[test]
    fn blocking_send_and_recv_rendezvous() {
        let chan = StdArc::new(Channel::new());
        let c2 = chan.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            c2.recv().unwrap()
        });
        chan.send(7).unwrap();
        assert_eq!(handle.join().unwrap(), 7);
    }

    #[test]
    fn close_waits_for_a_pending_value_to_drain() {
        let chan = StdArc::new(Channel::new());
        let sender = chan.clone();
        let send_done = StdArc::new(std::sync::atomic::AtomicBool::new(false));
        let sd2 = send_done.clone();
        let handle = thread::spawn(move || {
            sender.send(1).unwrap();
            sd2.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        // Give the sender a chance to park before any receiver shows up.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(chan.recv().unwrap(), 1);
        handle.join().unwrap();
        assert!(send_done.load(std::sync::atomic::Ordering::SeqCst));
    }
}

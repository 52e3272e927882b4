//! Public channel handles and constructors.

use std::sync::Arc;
use std::time::Duration;

use crate::base::ChannelStatus;
use crate::deadline::Deadline;
use crate::err::{RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError};
use crate::flavors::{bounded, rendezvous};
use crate::select::{recv_handle, send_handle, Case};
use crate::waiter::Token;

pub(crate) enum Flavor<T> {
    Bounded(bounded::Channel<T>),
    Rendezvous(rendezvous::Channel<T>),
}

/// Creates a rendezvous (zero-capacity, synchronous) channel: a send blocks
/// until a receiver is ready to take the value and vice versa.
pub fn rendezvous<T>() -> (Sender<T>, Receiver<T>) {
    let inner = Arc::new(Flavor::Rendezvous(rendezvous::Channel::new()));
    (Sender { inner: inner.clone() }, Receiver { inner })
}

/// Creates a buffered channel with the given fixed `capacity`.
///
/// `capacity == 0` is equivalent to [`rendezvous`]. `capacity > 0` yields a
/// FIFO queue that accepts sends without blocking until it is full.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let inner = if capacity == 0 {
        Arc::new(Flavor::Rendezvous(rendezvous::Channel::new()))
    } else {
        Arc::new(Flavor::Bounded(bounded::Channel::new(capacity)))
    };
    (Sender { inner: inner.clone() }, Receiver { inner })
}

/// The sending half of a channel created by [`bounded`] or [`rendezvous`].
///
/// Cloning a `Sender` gives another handle to the same underlying channel;
/// it does not create a new channel.
pub struct Sender<T> {
    pub(crate) inner: Arc<Flavor<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Sender { inner: self.inner.clone() }
    }
}

impl<T> Sender<T> {
    /// Blocks until the value is accepted or the channel is closed.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        match &*self.inner {
            Flavor::Bounded(c) => c.send(value),
            Flavor::Rendezvous(c) => c.send(value),
        }
    }

    /// Never blocks: accepts the value iff doing so would not require
    /// waiting.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        match &*self.inner {
            Flavor::Bounded(c) => c.try_send(value),
            Flavor::Rendezvous(c) => c.try_send(value),
        }
    }

    /// Like [`Sender::send`], but gives up once `timeout` has elapsed.
    pub fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), SendTimeoutError<T>> {
        let deadline = Deadline::after(timeout);
        match &*self.inner {
            Flavor::Bounded(c) => c.send_timeout(value, deadline),
            Flavor::Rendezvous(c) => c.send_timeout(value, deadline),
        }
    }

    /// Closes the channel. Idempotent; returns `true` iff this call is the
    /// one that closed it. Either the sending or the receiving handle may
    /// close a channel.
    pub fn close(&self) -> bool {
        match &*self.inner {
            Flavor::Bounded(c) => c.close(),
            Flavor::Rendezvous(c) => c.close(),
        }
    }

    /// `true` once the channel is closed and no further value can be
    /// retrieved from it.
    pub fn is_closed(&self) -> bool {
        match &*self.inner {
            Flavor::Bounded(c) => c.is_closed(),
            Flavor::Rendezvous(c) => c.is_closed(),
        }
    }

    /// The channel's fixed capacity, or `0` for a rendezvous channel.
    pub fn capacity(&self) -> usize {
        match &*self.inner {
            Flavor::Bounded(c) => c.capacity(),
            Flavor::Rendezvous(_) => 0,
        }
    }

    /// The number of values currently buffered.
    pub fn len(&self) -> usize {
        match &*self.inner {
            Flavor::Bounded(c) => c.len(),
            Flavor::Rendezvous(c) => c.len(),
        }
    }

    /// `true` iff no value is currently buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a send candidate for [`crate::select::select`]: attempting
    /// this candidate sends `value` and, on success, runs `action`.
    pub fn select_send<'a>(&'a self, value: T, action: impl FnOnce() + 'a) -> Case<'a>
    where
        T: 'a,
    {
        Case::new(send_handle(self, value, action))
    }
}

/// The receiving half of a channel created by [`bounded`] or [`rendezvous`].
///
/// Cloning a `Receiver` gives another handle to the same underlying channel.
pub struct Receiver<T> {
    pub(crate) inner: Arc<Flavor<T>>,
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Receiver { inner: self.inner.clone() }
    }
}

impl<T> Receiver<T> {
    /// Blocks until a value is available or the channel is closed and
    /// drained.
    pub fn recv(&self) -> Result<T, RecvError> {
        match &*self.inner {
            Flavor::Bounded(c) => c.recv(),
            Flavor::Rendezvous(c) => c.recv(),
        }
    }

    /// Never blocks.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        match &*self.inner {
            Flavor::Bounded(c) => c.try_recv(),
            Flavor::Rendezvous(c) => c.try_recv(),
        }
    }

    /// Like [`Receiver::recv`], but gives up once `timeout` has elapsed.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Deadline::after(timeout);
        match &*self.inner {
            Flavor::Bounded(c) => c.recv_timeout(deadline),
            Flavor::Rendezvous(c) => c.recv_timeout(deadline),
        }
    }

    /// Closes the channel. Idempotent; returns `true` iff this call is the
    /// one that closed it.
    pub fn close(&self) -> bool {
        match &*self.inner {
            Flavor::Bounded(c) => c.close(),
            Flavor::Rendezvous(c) => c.close(),
        }
    }

    /// `true` once the channel is closed and no further value can be
    /// retrieved from it.
    pub fn is_closed(&self) -> bool {
        match &*self.inner {
            Flavor::Bounded(c) => c.is_closed(),
            Flavor::Rendezvous(c) => c.is_closed(),
        }
    }

    /// The channel's fixed capacity, or `0` for a rendezvous channel.
    pub fn capacity(&self) -> usize {
        match &*self.inner {
            Flavor::Bounded(c) => c.capacity(),
            Flavor::Rendezvous(_) => 0,
        }
    }

    /// The number of values currently buffered.
    pub fn len(&self) -> usize {
        match &*self.inner {
            Flavor::Bounded(c) => c.len(),
            Flavor::Rendezvous(c) => c.len(),
        }
    }

    /// `true` iff no value is currently buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Repeatedly receives and applies `f` to each value, returning cleanly
    /// once the channel is closed and drained.
    pub fn for_each<F: FnMut(T)>(&self, mut f: F) {
        while let Ok(v) = self.recv() {
            f(v);
        }
    }

    /// Applies `f` to a value iff one is immediately available, without
    /// blocking. Returns `true` iff `f` was invoked.
    pub fn for_new<F: FnOnce(T)>(&self, f: F) -> bool {
        match self.try_recv() {
            Ok(v) => {
                f(v);
                true
            }
            Err(_) => false,
        }
    }

    /// Builds a receive candidate for [`crate::select::select`]: attempting
    /// this candidate receives a value and runs `action` with it on success.
    pub fn select_recv<'a, F>(&'a self, action: F) -> Case<'a>
    where
        T: 'a,
        F: FnOnce(T) + 'a,
    {
        Case::new(recv_handle(self, action))
    }

    /// An iterator that blocks on each `recv` until the channel closes.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { receiver: self }
    }

    /// An iterator that yields only values already available, never
    /// blocking.
    pub fn try_iter(&self) -> TryIter<'_, T> {
        TryIter { receiver: self }
    }
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        self.receiver.recv().ok()
    }
}

/// Blocking iterator returned by [`Receiver::iter`].
pub struct Iter<'a, T> {
    receiver: &'a Receiver<T>,
}

/// Non-blocking iterator returned by [`Receiver::try_iter`].
pub struct TryIter<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<T> Iterator for TryIter<'_, T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<'a, T> IntoIterator for &'a Receiver<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

pub(crate) fn status_for_reader<T>(inner: &Flavor<T>) -> ChannelStatus {
    match inner {
        Flavor::Bounded(c) => c.status_for_reader(),
        Flavor::Rendezvous(c) => c.status_for_reader(),
    }
}

pub(crate) fn status_for_writer<T>(inner: &Flavor<T>) -> ChannelStatus {
    match inner {
        Flavor::Bounded(c) => c.status_for_writer(),
        Flavor::Rendezvous(c) => c.status_for_writer(),
    }
}

pub(crate) fn select_try_recv<T>(inner: &Flavor<T>) -> Option<T> {
    match inner {
        Flavor::Bounded(c) => c.select_try_recv(),
        Flavor::Rendezvous(c) => c.select_try_recv(),
    }
}

pub(crate) fn select_try_send<T>(inner: &Flavor<T>, value: T) -> Result<(), T> {
    match inner {
        Flavor::Bounded(c) => c.select_try_send(value),
        Flavor::Rendezvous(c) => c.select_try_send(value),
    }
}

pub(crate) fn register_reader_waiter<T>(inner: &Flavor<T>, token: Arc<Token>) -> bool {
    match inner {
        Flavor::Bounded(c) => c.register_reader_waiter(token),
        Flavor::Rendezvous(c) => c.register_reader_waiter(token),
    }
}

pub(crate) fn unregister_reader_waiter<T>(inner: &Flavor<T>, token: &Arc<Token>) {
    match inner {
        Flavor::Bounded(c) => c.unregister_reader_waiter(token),
        Flavor::Rendezvous(c) => c.unregister_reader_waiter(token),
    }
}

pub(crate) fn register_writer_waiter<T>(inner: &Flavor<T>, token: Arc<Token>) -> bool {
    match inner {
        Flavor::Bounded(c) => c.register_writer_waiter(token),
        Flavor::Rendezvous(c) => c.register_writer_waiter(token),
    }
}

pub(crate) fn unregister_writer_waiter<T>(inner: &Flavor<T>, token: &Arc<Token>) {
    match inner {
        Flavor::Bounded(c) => c.unregister_writer_waiter(token),
        Flavor::Rendezvous(c) => c.unregister_writer_waiter(token),
    }
}

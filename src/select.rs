//! Multi-way select: wait on several channel operations, proceed with
//! exactly one.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::base::ChannelStatus;
use crate::channel::{
    register_reader_waiter, register_writer_waiter, select_try_recv, select_try_send,
    status_for_reader, status_for_writer, unregister_reader_waiter, unregister_writer_waiter,
    Receiver, Sender,
};
use crate::deadline::Deadline;
use crate::waiter::Token;

/// One proposed channel operation — a send-with-value or a recv — bound to
/// an after-action that runs only if this candidate is the one `select`
/// chooses.
///
/// Built with [`Sender::select_send`] or [`Receiver::select_recv`] and
/// consumed by exactly one call to [`select`], [`try_select`], or
/// [`select_timeout`].
pub struct Case<'a> {
    handle: Box<dyn SelectHandle + 'a>,
}

impl<'a> Case<'a> {
    pub(crate) fn new(handle: impl SelectHandle + 'a) -> Self {
        Case { handle: Box::new(handle) }
    }
}

/// Internal uniform interface select drives every candidate through,
/// regardless of the channel's element type or flavor.
pub(crate) trait SelectHandle {
    /// Attempts the operation without blocking; on success, runs the
    /// after-action and returns `true`.
    fn try_fire(&self) -> bool;

    /// Registers this candidate's token with its channel. Returns `false`
    /// (without registering) if the channel is already closed or the
    /// operation is already satisfiable — the caller should attempt it
    /// immediately instead.
    fn register(&self, token: Arc<Token>) -> bool;

    /// Removes this candidate's token registration, if any. Idempotent.
    fn unregister(&self, token: &Arc<Token>);

    /// Whether the operation can currently proceed without blocking.
    fn status(&self) -> ChannelStatus;
}

struct SendCase<'a, T> {
    sender: &'a Sender<T>,
    value: Cell<Option<T>>,
    action: Cell<Option<Box<dyn FnOnce() + 'a>>>,
}

impl<'a, T> SendCase<'a, T> {
    fn new(sender: &'a Sender<T>, value: T, action: impl FnOnce() + 'a) -> Self {
        SendCase {
            sender,
            value: Cell::new(Some(value)),
            action: Cell::new(Some(Box::new(action))),
        }
    }
}

impl<'a, T> SelectHandle for SendCase<'a, T> {
    fn try_fire(&self) -> bool {
        let Some(value) = self.value.take() else {
            return false;
        };
        match select_try_send(&self.sender.inner, value) {
            Ok(()) => {
                if let Some(action) = self.action.take() {
                    action();
                }
                true
            }
            Err(v) => {
                self.value.set(Some(v));
                false
            }
        }
    }

    fn register(&self, token: Arc<Token>) -> bool {
        register_writer_waiter(&self.sender.inner, token)
    }

    fn unregister(&self, token: &Arc<Token>) {
        unregister_writer_waiter(&self.sender.inner, token);
    }

    fn status(&self) -> ChannelStatus {
        status_for_writer(&self.sender.inner)
    }
}

struct RecvCase<'a, T> {
    receiver: &'a Receiver<T>,
    action: Cell<Option<Box<dyn FnOnce(T) + 'a>>>,
}

impl<'a, T> RecvCase<'a, T> {
    fn new(receiver: &'a Receiver<T>, action: impl FnOnce(T) + 'a) -> Self {
        RecvCase {
            receiver,
            action: Cell::new(Some(Box::new(action))),
        }
    }
}

impl<'a, T> SelectHandle for RecvCase<'a, T> {
    fn try_fire(&self) -> bool {
        let Some(value) = select_try_recv(&self.receiver.inner) else {
            return false;
        };
        if let Some(action) = self.action.take() {
            action(value);
        }
        true
    }

    fn register(&self, token: Arc<Token>) -> bool {
        register_reader_waiter(&self.receiver.inner, token)
    }

    fn unregister(&self, token: &Arc<Token>) {
        unregister_reader_waiter(&self.receiver.inner, token);
    }

    fn status(&self) -> ChannelStatus {
        status_for_reader(&self.receiver.inner)
    }
}

pub(crate) fn send_handle<'a, T: 'a>(
    sender: &'a Sender<T>,
    value: T,
    action: impl FnOnce() + 'a,
) -> impl SelectHandle + 'a {
    SendCase::new(sender, value, action)
}

pub(crate) fn recv_handle<'a, T: 'a>(
    receiver: &'a Receiver<T>,
    action: impl FnOnce(T) + 'a,
) -> impl SelectHandle + 'a {
    RecvCase::new(receiver, action)
}

/// Waits on every candidate and proceeds with exactly one, chosen fairly
/// among whichever are simultaneously ready. Blocks indefinitely if none is.
///
/// Returns `true` if an operation completed, `false` if a candidate's
/// channel was observed closed with nothing left to deliver.
pub fn select(cases: &mut [Case<'_>]) -> bool {
    run(cases, Deadline::unbounded())
}

/// Non-blocking: attempts every candidate once and returns immediately.
pub fn try_select(cases: &mut [Case<'_>]) -> bool {
    run(cases, Deadline::zero())
}

/// Like [`select`], but gives up once `timeout` has elapsed.
pub fn select_timeout(cases: &mut [Case<'_>], timeout: Duration) -> bool {
    run(cases, Deadline::after(timeout))
}

fn run(cases: &mut [Case<'_>], deadline: Deadline) -> bool {
    if cases.is_empty() {
        return false;
    }

    // The random shuffle is the sole source of fairness across channels that
    // are simultaneously ready; round-robin rotation inside each channel's
    // waiter queue (see `base::WaitState::notify_readers`/`notify_writers`)
    // handles fairness among select callers contending on the same channel.
    let mut order: Vec<usize> = (0..cases.len()).collect();
    order.shuffle(&mut rand::thread_rng());

    let token = Token::new();
    let mut registered: Vec<usize> = Vec::new();

    // Registration + fast path.
    for &i in &order {
        if cases[i].handle.register(token.clone()) {
            registered.push(i);
        } else if cases[i].handle.try_fire() {
            deregister(cases, &registered, &token);
            return true;
        }
    }

    if matches!(deadline, Deadline::Zero) {
        deregister(cases, &registered, &token);
        return false;
    }

    loop {
        let mut saw_closed = false;
        for i in 0..cases.len() {
            match cases[i].handle.status() {
                ChannelStatus::Available => {
                    if cases[i].handle.try_fire() {
                        deregister(cases, &registered, &token);
                        return true;
                    }
                }
                ChannelStatus::Closed => saw_closed = true,
                ChannelStatus::NotAvailable => {}
            }
        }
        if saw_closed {
            deregister(cases, &registered, &token);
            return false;
        }

        if deadline.has_elapsed() {
            deregister(cases, &registered, &token);
            return false;
        }
        if !token.acquire_deadline(deadline) {
            deregister(cases, &registered, &token);
            return false;
        }
        // Woken by a release; loop back and re-scan.
    }
}

fn deregister(cases: &mut [Case<'_>], registered: &[usize], token: &Arc<Token>) {
    for &i in registered {
        cases[i].handle.unregister(token);
    }
}

//! CSP-style channels and multi-way select.
//!
//! This crate reproduces the channel semantics popularized by Go — a
//! synchronous (rendezvous) flavor and an asynchronous (bounded, buffered)
//! flavor, plus a `select` operator that waits on several channel operations
//! and proceeds with exactly one — on top of ordinary thread-based
//! concurrency primitives: mutexes, condition variables, and a hand-rolled
//! counting semaphore. It is not lock-free, does not implement a
//! work-stealing runtime or green threads, and is not tied to any async
//! runtime; it synchronizes whatever OS threads the caller already has.
//!
//! ```
//! use chansel::bounded;
//!
//! let (tx, rx) = bounded(4);
//! tx.send(1).unwrap();
//! tx.send(2).unwrap();
//! assert_eq!(rx.recv(), Ok(1));
//! assert_eq!(rx.recv(), Ok(2));
//! ```
//!
//! `bounded(0)` and [`rendezvous`] both produce a zero-capacity channel: a
//! send blocks until a receiver is ready to take the value and vice versa.
//!
//! ```
//! use chansel::rendezvous;
//! use std::thread;
//!
//! let (tx, rx) = rendezvous();
//! thread::scope(|scope| {
//!     scope.spawn(|| tx.send("hello").unwrap());
//!     assert_eq!(rx.recv(), Ok("hello"));
//! });
//! ```
//!
//! [`select`] waits on several channel operations at once:
//!
//! ```
//! use chansel::{bounded, select};
//!
//! let (tx_a, rx_a) = bounded(1);
//! let (_tx_b, rx_b) = bounded::<i32>(1);
//! tx_a.send(42).unwrap();
//!
//! let mut got = None;
//! let mut cases = [
//!     rx_a.select_recv(|v| got = Some(v)),
//!     rx_b.select_recv(|v| got = Some(v)),
//! ];
//! assert!(select(&mut cases));
//! assert_eq!(got, Some(42));
//! ```

mod base;
mod channel;
mod deadline;
pub mod err;
mod flavors;
pub mod select;
mod waiter;

pub use channel::{bounded, rendezvous, Iter, Receiver, Sender, TryIter};
pub use err::{
    RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError,
};
pub use select::{select, select_timeout, try_select, Case};

//! Bounded condition-variable waits.

use std::sync::{Condvar, MutexGuard};
use std::time::{Duration, Instant};

/// An optional absolute point in time past which a blocking operation should
/// give up.
///
/// A `Deadline` never re-checks the caller's predicate; callers must loop
/// around spurious wake-ups themselves, the same way any condvar wait does.
#[derive(Clone, Copy)]
pub(crate) enum Deadline {
    /// Never time out.
    Unbounded,
    /// Time out immediately: used for the non-blocking `try_*` paths.
    Zero,
    /// Time out once `Instant::now() >= self`.
    At(Instant),
}

impl Deadline {
    pub(crate) fn unbounded() -> Self {
        Deadline::Unbounded
    }

    pub(crate) fn zero() -> Self {
        Deadline::Zero
    }

    pub(crate) fn after(timeout: Duration) -> Self {
        Deadline::At(Instant::now() + timeout)
    }

    /// `true` once the deadline has passed (always `false` for `Unbounded`,
    /// always `true` for `Zero`).
    pub(crate) fn has_elapsed(&self) -> bool {
        match self {
            Deadline::Unbounded => false,
            Deadline::Zero => true,
            Deadline::At(when) => Instant::now() >= *when,
        }
    }

    /// Waits on `cond`, consuming `guard`, and returns the reacquired guard
    /// plus whether the caller should keep waiting (`true`) or has run out of
    /// time (`false`).
    ///
    /// A `Zero` deadline returns `false` immediately without ever touching
    /// the condition variable.
    pub(crate) fn wait<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        cond: &Condvar,
    ) -> (MutexGuard<'a, T>, bool) {
        match self {
            Deadline::Zero => (guard, false),
            Deadline::Unbounded => {
                let guard = cond.wait(guard).unwrap_or_else(|e| e.into_inner());
                (guard, true)
            }
            Deadline::At(when) => {
                let now = Instant::now();
                if now >= *when {
                    return (guard, false);
                }
                let budget = *when - now;
                let (guard, result) = cond
                    .wait_timeout(guard, budget)
                    .unwrap_or_else(|e| e.into_inner());
                (guard, !result.timed_out())
            }
        }
    }
}

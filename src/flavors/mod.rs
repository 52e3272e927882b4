//! Channel flavor implementations: the actual state machines.
//!
//! Everything public-facing (handles, error mapping, `select` glue) lives in
//! [`crate::channel`]; this module only holds the two ways a channel can
//! store and hand off values.

pub(crate) mod bounded;
pub(crate) mod rendezvous;

//! Live game status bounded context.
//!
//! Queries servers over the game's status protocol and aggregates the
//! answers. A failure to reach one server becomes an inline placeholder and
//! never aborts the rest of a poll.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

//! Port contracts for game status queries.

pub mod probe;

pub use probe::{GameStatusProbe, ProbeError, ProbeResult};

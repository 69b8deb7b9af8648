//! Hosting integration tests over in-memory adapters.
//!
//! Tests are organized into modules by functionality:
//! - `allocation_tests`: Port assignment order, pinning, concurrent creation
//! - `authorization_tests`: Owner checks ahead of any runtime call
//! - `restart_tests`: Cancelled restarts leave the record restartable
//! - `status_tests`: Mixed reachable and unreachable polls

mod hosting {
    pub mod helpers;

    mod allocation_tests;
    mod authorization_tests;
    mod restart_tests;
    mod status_tests;
}

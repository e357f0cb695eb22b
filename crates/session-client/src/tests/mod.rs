//! Behavioural tests for the session layer.
//!
//! - `harness.rs`           - fake API server, profiles, tabs, helpers
//! - `single_flight.rs`     - one refresh for many expired requests
//! - `ordering.rs`          - replay order follows queue order
//! - `refresh_failure.rs`   - failed refresh rejects the queue, one sign-out
//! - `invalid_credential.rs`- non-expired 401s, replays rejected again, pass-through errors
//! - `session.rs`           - sign-in, sign-out, bootstrap, gate re-evaluation
//! - `cross_tab.rs`         - sign-out propagation between tabs
//! - `ssr.rs`               - server-rendered route guards

mod cross_tab;
mod session;

//! Session layer for the Tessera web client.
//!
//! This crate provides:
//! - `AuthenticatedClient`: bearer-attaching HTTP client whose response
//!   interception renews expired tokens through a single-flight
//!   `RefreshCoordinator` and replays the waiting requests
//! - `SessionContext`: one tab's session (sign-in, sign-out, bootstrap,
//!   cross-tab sign-out propagation) driven by an explicit lifecycle FSM
//! - `with_ssr_auth` / `with_ssr_guest`: route guards for server rendering
//! - `Transport` and `Navigator`: the seams to HTTP and to navigation

mod claims;
mod client;
mod context;
mod error;
mod navigator;
mod refresh;
mod session_fsm;
mod ssr;
mod transport;

#[cfg(test)]
mod tests;

pub use claims::decode_grants;
pub use client::{AuthenticatedClient, ClientContext, SignOutHook, TokenPair};
pub use context::{SessionContext, SessionOptions, SessionStateCallback, User};
pub use error::{ClientError, ClientResult, RefreshError, SessionError, SessionResult};
pub use navigator::{HistoryNavigator, Navigator};
pub use refresh::{
    Admission, PendingRefresh, RefreshCoordinator, RefreshOutcome, ReplayTurn, Resumed,
};
pub use session_fsm::session_machine;
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
pub use ssr::{with_ssr_auth, with_ssr_guest, PageOutcome};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TOKEN_EXPIRED_CODE};

//! Session lifecycle state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                ┌─────────────────┐
//!   ┌──────────► │    Anonymous    │ (initial)
//!   │            └──┬───────────┬──┘
//!   │     Bootstrap │           │ SignInAttempt
//!   │               ▼           ▼
//!   │  ┌───────────────┐   ┌───────────┐
//!   │  │ Bootstrapping │   │ SigningIn │
//!   │  └──┬─────────┬──┘   └─────┬─────┘
//!   │     │         │ UserLoaded │ SignInSucceeded
//!   │     │         ▼            ▼
//!   │     │      ┌─────────────────┐
//!   │     │      │  Authenticated  │
//!   │     │      └────────┬────────┘
//!   │     │ NoCredentials │ SignOutRequested (from any state)
//!   │     ▼               ▼
//!   │  Anonymous   ┌─────────────────┐
//!   └───────────── │   SigningOut    │
//!  SignOutComplete └─────────────────┘
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Anonymous)

    Anonymous => {
        Bootstrap => Bootstrapping,
        SignInAttempt => SigningIn,
        SignOutRequested => SigningOut
    },
    Bootstrapping => {
        UserLoaded => Authenticated,
        NoCredentials => Anonymous,
        SignOutRequested => SigningOut
    },
    SigningIn => {
        SignInSucceeded => Authenticated,
        SignOutRequested => SigningOut
    },
    Authenticated => {
        SignInAttempt => SigningIn,
        SignOutRequested => SigningOut
    },
    SigningOut => {
        SignOutRequested => SigningOut,
        SignOutComplete => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Bootstrapping,
    SigningIn,
    Authenticated,
    SigningOut,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    /// Returns true if the state is a transient/in-progress state.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionState::Bootstrapping | SessionState::SigningIn | SessionState::SigningOut
        )
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Anonymous => SessionState::Anonymous,
            SessionMachineState::Bootstrapping => SessionState::Bootstrapping,
            SessionMachineState::SigningIn => SessionState::SigningIn,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::SigningOut => SessionState::SigningOut,
        }
    }
}

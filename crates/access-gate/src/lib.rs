//! Authorization predicates for gated UI fragments and server-rendered routes.
//!
//! This crate provides:
//! - `authorize`: the pure permission/role evaluation
//! - `AuthorizationGate`: the session-aware variant used by presentation code
//!
//! Matching is exact string equality. There are no wildcards and no
//! permission hierarchy; an unknown or misspelled identifier never matches.

mod evaluator;
mod gate;

pub use evaluator::{authorize, AuthorizationRequirement, Grants};
pub use gate::{can, AuthorizationGate, SessionView};

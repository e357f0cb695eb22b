//! Session-aware authorization for presentation code.
//!
//! The gate is stricter than `authorize`: with no session it denies even the
//! empty requirement. It holds no session state of its own, so every call
//! re-evaluates against whatever the session is at that moment.

use crate::{authorize, AuthorizationRequirement, Grants};
use tracing::trace;

/// Read access to the ambient session's grants.
///
/// `None` means nobody is signed in.
pub trait SessionView {
    fn current_grants(&self) -> Option<Grants>;
}

impl SessionView for Option<Grants> {
    fn current_grants(&self) -> Option<Grants> {
        self.clone()
    }
}

impl SessionView for Grants {
    fn current_grants(&self) -> Option<Grants> {
        Some(self.clone())
    }
}

/// Returns true when a session exists and it satisfies `requirement`.
pub fn can<S: SessionView + ?Sized>(session: &S, requirement: &AuthorizationRequirement) -> bool {
    match session.current_grants() {
        Some(grants) => authorize(Some(&grants), requirement),
        None => false,
    }
}

/// Guards a renderable unit behind a requirement.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    requirement: AuthorizationRequirement,
}

impl AuthorizationGate {
    pub fn new(requirement: AuthorizationRequirement) -> Self {
        Self { requirement }
    }

    pub fn requirement(&self) -> &AuthorizationRequirement {
        &self.requirement
    }

    pub fn allows<S: SessionView + ?Sized>(&self, session: &S) -> bool {
        let allowed = can(session, &self.requirement);
        trace!(
            allowed,
            permissions = self.requirement.permissions.len(),
            roles = self.requirement.roles.len(),
            "Gate evaluated"
        );
        allowed
    }

    /// Produces the guarded content when allowed, nothing otherwise.
    pub fn render<S, T, F>(&self, session: &S, content: F) -> Option<T>
    where
        S: SessionView + ?Sized,
        F: FnOnce() -> T,
    {
        if self.allows(session) {
            Some(content())
        } else {
            None
        }
    }
}

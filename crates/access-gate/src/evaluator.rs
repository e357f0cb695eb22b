//! Permission and role evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Permissions and roles held by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Grants {
    pub fn new<P, R>(permissions: P, roles: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// What a fragment or route requires. Both lists are optional.
///
/// Deserializes from `{"permissions": [...], "roles": [...]}` with either key
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequirement {
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl AuthorizationRequirement {
    /// A requirement with no permissions and no roles.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn permissions<I>(permissions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::default().with_permissions(permissions)
    }

    pub fn roles<I>(roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::default().with_roles(roles)
    }

    pub fn with_permissions<I>(mut self, permissions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_roles<I>(mut self, roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// True when neither permissions nor roles are required.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }
}

/// Decide whether `user` satisfies `requirement`.
///
/// - every required permission must be held (AND)
/// - at least one required role must be held (OR)
/// - when both lists are given, both checks must pass
/// - an empty requirement always passes
///
/// A missing user is evaluated as empty grants, so it only passes the empty
/// requirement.
pub fn authorize(user: Option<&Grants>, requirement: &AuthorizationRequirement) -> bool {
    let empty = Grants::default();
    let grants = user.unwrap_or(&empty);

    if !requirement.permissions.is_empty() {
        let has_all = requirement
            .permissions
            .iter()
            .all(|permission| grants.has_permission(permission));
        if !has_all {
            return false;
        }
    }

    if !requirement.roles.is_empty() {
        let has_any = requirement.roles.iter().any(|role| grants.has_role(role));
        if !has_any {
            return false;
        }
    }

    true
}

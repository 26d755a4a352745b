//! Requester roles and the fixed rank table used for admission checks.
//!
//! `STAFF` and `REVIEWER` share a rank, so a minimum of either is satisfied
//! by both.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Observer,
    Staff,
    Reviewer,
    Manager,
    SystemAdmin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Observer,
        Role::Staff,
        Role::Reviewer,
        Role::Manager,
        Role::SystemAdmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Observer => "OBSERVER",
            Role::Staff => "STAFF",
            Role::Reviewer => "REVIEWER",
            Role::Manager => "MANAGER",
            Role::SystemAdmin => "SYSTEM_ADMIN",
        }
    }

    /// Position in the role hierarchy. Higher means more privileged.
    pub fn rank(self) -> u8 {
        match self {
            Role::Observer => 0,
            Role::Staff | Role::Reviewer => 1,
            Role::Manager => 2,
            Role::SystemAdmin => 3,
        }
    }

    /// Strict parse: case-insensitive, surrounding whitespace ignored,
    /// `-` and space accepted in place of `_`.
    pub fn parse(raw: &str) -> Option<Role> {
        let norm = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Role::ALL.into_iter().find(|r| r.as_str() == norm)
    }

    /// Coerce an arbitrary JSON value (as found in model output) into a role.
    /// Non-strings and unrecognised names yield `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Role> {
        value.as_str().and_then(Role::parse)
    }

    /// Total coercion for caller-supplied role strings. Unknown input is
    /// treated as the lowest privilege.
    pub fn from_str_lossy(raw: &str) -> Role {
        match Role::parse(raw) {
            Some(role) => role,
            None => {
                tracing::warn!(raw_role = %raw, "unrecognised role, treating as OBSERVER");
                Role::Observer
            }
        }
    }
}

/// `true` when `actual` ranks at or above `required`.
pub fn has_sufficient_role(actual: Role, required: Role) -> bool {
    actual.rank() >= required.rank()
}

/// String form of [`has_sufficient_role`]; never panics.
///
/// An unknown `actual` ranks as `OBSERVER`. An unknown `required` can
/// never be satisfied.
pub fn has_sufficient_role_str(actual: &str, required: &str) -> bool {
    match Role::parse(required) {
        Some(required) => has_sufficient_role(Role::from_str_lossy(actual), required),
        None => {
            tracing::warn!(required_role = %required, "unrecognised required role, denying");
            false
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`Role::from_str`] for names outside the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Role::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

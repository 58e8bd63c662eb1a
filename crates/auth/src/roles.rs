use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of an authenticated actor in the booking protocol.
///
/// A closed enum rather than an opaque string: invalid roles are
/// unrepresentable, and the negotiation turn check becomes a plain `match`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Tenant,
    Administrator,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Tenant => "tenant",
            ActorRole::Administrator => "administrator",
        }
    }
}

impl core::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown actor role: {0}")]
pub struct UnknownRole(String);

impl FromStr for ActorRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant" => Ok(ActorRole::Tenant),
            // The session layer historically calls administrators "admin".
            "administrator" | "admin" => Ok(ActorRole::Administrator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

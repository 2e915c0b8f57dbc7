//! User domain entity and role enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parcel::Address;

/// Account role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to parcel and user management.
    Admin,
    /// Manages parcel lifecycle for assigned parcels.
    Agent,
    /// Creates and tracks their own parcels.
    Customer,
    /// Delivers parcels; sees delivery assignments only.
    Courier,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Agent => write!(f, "agent"),
            Self::Customer => write!(f, "customer"),
            Self::Courier => write!(f, "courier"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            "customer" => Ok(Self::Customer),
            "courier" => Ok(Self::Courier),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// A user account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

const fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Agent, Role::Customer, Role::Courier] {
            let parsed: Role = role.to_string().parse().expect("parse role");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_user_defaults_active_when_absent() {
        let json = serde_json::json!({
            "_id": "u1",
            "name": "Sam",
            "email": "sam@example.com",
            "role": "agent",
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let user: User = serde_json::from_value(json).expect("deserialize user");
        assert!(user.is_active);
        assert_eq!(user.role, Role::Agent);
    }
}

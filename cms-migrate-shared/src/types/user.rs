use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Superadmin,
    Admin,
    Editor,
    Author,
    Contributor,
    Subscriber,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Superadmin => "SUPERADMIN",
            UserRole::Admin => "ADMIN",
            UserRole::Editor => "EDITOR",
            UserRole::Author => "AUTHOR",
            UserRole::Contributor => "CONTRIBUTOR",
            UserRole::Subscriber => "SUBSCRIBER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown user role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for UserRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPERADMIN" => Ok(UserRole::Superadmin),
            "ADMIN" | "ADMINISTRATOR" => Ok(UserRole::Admin),
            "EDITOR" => Ok(UserRole::Editor),
            "AUTHOR" => Ok(UserRole::Author),
            "CONTRIBUTOR" => Ok(UserRole::Contributor),
            "SUBSCRIBER" => Ok(UserRole::Subscriber),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// A user row ready to be upserted by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_wordpress_names() {
        assert_eq!("superadmin".parse::<UserRole>(), Ok(UserRole::Superadmin));
        assert_eq!("Administrator".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!(" author ".parse::<UserRole>(), Ok(UserRole::Author));
        assert!("owner".parse::<UserRole>().is_err());
    }
}

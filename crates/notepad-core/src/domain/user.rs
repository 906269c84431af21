use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Account role. Admins moderate users and may edit any chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// The other role.
    pub fn toggled(self) -> Self {
        match self {
            Role::User => Role::Admin,
            Role::Admin => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// User entity - represents an account in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Set while the account is suspended. A stamp in the past means the
    /// block has lapsed and is treated exactly like no block at all.
    pub blocked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role: Role::User,
            blocked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    /// The active block expiry, if the account is currently blocked.
    pub fn active_block(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.blocked_until.filter(|until| *until > now)
    }

    /// Suspend the account until `until`.
    pub fn block_until(&mut self, until: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), DomainError> {
        if until <= now {
            return Err(DomainError::Validation(
                "Block expiry must be in the future".to_string(),
            ));
        }
        self.blocked_until = Some(until);
        self.updated_at = now;
        Ok(())
    }

    pub fn unblock(&mut self, now: DateTime<Utc>) {
        self.blocked_until = None;
        self.updated_at = now;
    }

    pub fn toggle_role(&mut self, now: DateTime<Utc>) {
        self.role = self.role.toggled();
        self.updated_at = now;
    }

    /// Roles as carried in access tokens.
    pub fn token_roles(&self) -> Vec<String> {
        match self.role {
            Role::User => vec![Role::User.to_string()],
            Role::Admin => vec![Role::User.to_string(), Role::Admin.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn user() -> User {
        User::new("strummer".into(), "strummer@example.com".into(), "hash".into())
    }

    #[test]
    fn test_new_user_is_active_regular_user() {
        let u = user();
        assert_eq!(u.role, Role::User);
        assert!(!u.is_blocked(Utc::now()));
    }

    #[test]
    fn test_block_and_expiry() {
        let mut u = user();
        let now = Utc::now();
        u.block_until(now + TimeDelta::hours(2), now).unwrap();

        assert!(u.is_blocked(now));
        assert!(u.is_blocked(now + TimeDelta::hours(1)));
        assert!(!u.is_blocked(now + TimeDelta::hours(2)));
        assert_eq!(u.active_block(now + TimeDelta::hours(3)), None);
    }

    #[test]
    fn test_block_in_past_rejected() {
        let mut u = user();
        let now = Utc::now();
        let result = u.block_until(now - TimeDelta::minutes(1), now);
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(u.blocked_until.is_none());
    }

    #[test]
    fn test_unblock_clears_stamp() {
        let mut u = user();
        let now = Utc::now();
        u.block_until(now + TimeDelta::days(1), now).unwrap();
        u.unblock(now);
        assert!(u.blocked_until.is_none());
    }

    #[test]
    fn test_toggle_role_round_trips() {
        let mut u = user();
        let now = Utc::now();
        u.toggle_role(now);
        assert!(u.is_admin());
        assert_eq!(u.token_roles(), vec!["user".to_string(), "admin".to_string()]);
        u.toggle_role(now);
        assert_eq!(u.role, Role::User);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }
}

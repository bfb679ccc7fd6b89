//! User identity record types.
//!
//! These types represent validated domain objects separate from whatever row
//! or document shape the backing store uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercadito_core::{Email, Provenance, Role, UserId};

/// The sentinel stored as the password of OAuth-only accounts.
///
/// It is not a digest, so it can never verify against any presented
/// password; OAuth accounts are structurally unable to authenticate via the
/// password path.
pub const OAUTH_PASSWORD_SENTINEL: &str = "a";

/// An identity record as held by the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique user ID.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Email address (unique within the store, case-insensitive).
    pub email: Email,
    pub age: i32,
    /// Argon2 digest, or [`OAUTH_PASSWORD_SENTINEL`] for OAuth accounts.
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    /// How this account was created. OAuth accounts never pass the
    /// password login path.
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Full display name, as used in welcome and confirmation messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating a new identity record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub age: i32,
    /// Argon2 digest, or the OAuth sentinel.
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub provenance: Provenance,
}

/// Partial update applied to an existing record, keyed by email.
///
/// `None` fields keep the stored value. The password digest is deliberately
/// not part of the patch: profile edits never touch it.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let user = UserRecord {
            id: UserId::new(1),
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: Email::parse("ana@gmail.com").unwrap(),
            age: 30,
            password: "digest".to_string(),
            role: Role::User,
            phone: None,
            provenance: Provenance::Password,
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "Ana Diaz");
    }
}

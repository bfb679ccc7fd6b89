//! Session-related types.
//!
//! Types stored in the server session and in the client-visible `userData`
//! attribute cookie.

use serde::{Deserialize, Serialize};

use mercadito_core::{Email, Provenance, Role, UserId};

use crate::models::user::UserRecord;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's store ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<&UserRecord> for CurrentUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for the boolean "a login happened on this session" flag.
    pub const LOGGED: &str = "user_logged";

    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the OAuth CSRF state (one-time use).
    pub const OAUTH_STATE: &str = "oauth_state";
}

/// Name of the client-visible attribute cookie.
pub const USER_DATA_COOKIE: &str = "userData";

/// Client-visible snapshot of a user's display attributes and role.
///
/// Non-authoritative: route guards read it as a capability hint and never
/// re-verify it against the store. The admin variant omits `id` and `email`;
/// the OAuth variant additionally carries `last_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

impl UserData {
    /// Snapshot written after an admin login: display name and role only.
    #[must_use]
    pub fn for_admin(user: &UserRecord) -> Self {
        Self {
            id: None,
            first_name: user.first_name.clone(),
            last_name: None,
            role: user.role,
            email: None,
        }
    }

    /// Snapshot written after an ordinary password login.
    #[must_use]
    pub fn for_user(user: &UserRecord) -> Self {
        Self {
            id: Some(user.id),
            first_name: user.first_name.clone(),
            last_name: None,
            role: user.role,
            email: Some(user.email.clone()),
        }
    }

    /// Snapshot written after an OAuth login (includes the last name).
    #[must_use]
    pub fn for_oauth(user: &UserRecord) -> Self {
        Self {
            id: Some(user.id),
            first_name: user.first_name.clone(),
            last_name: Some(user.last_name.clone()),
            role: user.role,
            email: Some(user.email.clone()),
        }
    }

    /// Pick the snapshot variant appropriate for a record.
    #[must_use]
    pub fn for_record(user: &UserRecord) -> Self {
        if user.role.is_admin() {
            Self::for_admin(user)
        } else if user.provenance == Provenance::OAuth {
            Self::for_oauth(user)
        } else {
            Self::for_user(user)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use mercadito_core::Email;

    use super::*;

    fn record(role: Role, provenance: Provenance) -> UserRecord {
        UserRecord {
            id: UserId::new(7),
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: Email::parse("ana@gmail.com").unwrap(),
            age: 30,
            password: "digest".to_string(),
            role,
            phone: None,
            provenance,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_snapshot_omits_id_and_email() {
        let data = UserData::for_record(&record(Role::Admin, Provenance::Password));
        assert!(data.id.is_none());
        assert!(data.email.is_none());
        assert_eq!(data.role, Role::Admin);

        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("email").is_none());
        assert_eq!(json["first_name"], "Ana");
    }

    #[test]
    fn test_user_snapshot_has_id_and_email_but_no_last_name() {
        let data = UserData::for_record(&record(Role::User, Provenance::Password));
        assert_eq!(data.id, Some(UserId::new(7)));
        assert!(data.last_name.is_none());
        assert_eq!(data.email.as_ref().unwrap().as_str(), "ana@gmail.com");
    }

    #[test]
    fn test_oauth_snapshot_includes_last_name() {
        let data = UserData::for_record(&record(Role::User, Provenance::OAuth));
        assert_eq!(data.last_name.as_deref(), Some("Diaz"));
    }
}

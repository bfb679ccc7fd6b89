//! Authorization role and account provenance.

use serde::{Deserialize, Serialize};

/// Authorization role attached to an identity record.
///
/// The model is deliberately binary: either an ordinary shopper or the
/// transient administrative identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary registered user.
    #[default]
    User,
    /// Administrative user (materialized transiently for the reserved login).
    Admin,
}

impl Role {
    /// Whether this role grants administrative access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// How an identity record was created.
///
/// Replaces the email-domain allow-list heuristic the original system used
/// to tell password accounts from OAuth accounts. OAuth-only accounts carry
/// a sentinel password and must never authenticate via the password path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Registered locally with an email/password pair.
    #[default]
    Password,
    /// Created via third-party OAuth delegation (find-or-create).
    OAuth,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_provenance_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Provenance::OAuth).unwrap(),
            "\"oauth\""
        );
        assert_eq!(
            serde_json::to_string(&Provenance::Password).unwrap(),
            "\"password\""
        );
    }
}

//! Password authentication service.
//!
//! Registration, login, profile updates and account deletion against the
//! credential store. Passwords are hashed with Argon2id; login failures are
//! deliberately uniform so that an attacker cannot distinguish an unknown
//! email from a wrong password.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use mercadito_core::{Email, Provenance, Role};

use crate::models::{NewUser, UserPatch, UserRecord};
use crate::services::admin::AdminManager;
use crate::store::{StoreError, UserStore};

/// Validated registration input. Field presence is checked at the handler
/// boundary; this type only exists once all required fields are in hand.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub age: i32,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

/// Authentication operations over the credential store.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    admin: Arc<AdminManager>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, admin: Arc<AdminManager>) -> Self {
        Self { store, admin }
    }

    /// Register a new password-provenance account.
    ///
    /// # Errors
    ///
    /// [`AuthError::PasswordMismatch`] when the confirmation differs,
    /// [`AuthError::UserAlreadyExists`] when the email is taken.
    pub async fn register(&self, input: RegisterInput) -> Result<UserRecord, AuthError> {
        if input.password != input.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        if self.store.find_by_email(&input.email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let digest = hash_password(&input.password)?;
        let record = self
            .store
            .create(NewUser {
                first_name: input.first_name,
                last_name: input.last_name,
                email: input.email,
                age: input.age,
                password: digest,
                role: Role::User,
                phone: input.phone,
                provenance: Provenance::Password,
            })
            .await
            .map_err(|err| match err {
                // Lost a race with a concurrent registration of the same email.
                StoreError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id = %record.id, "user registered");
        Ok(record)
    }

    /// Authenticate a credential pair.
    ///
    /// The reserved admin pair is checked before the store: a match
    /// materializes the transient admin record and wins regardless of what
    /// the store holds. OAuth-provenance accounts never authenticate here.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] on any mismatch.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(AuthError::InvalidCredentials);
        };

        if self.admin.matches(&email, password) {
            let record = self.admin.materialize(&self.store).await?;
            tracing::info!(user_id = %record.id, "reserved admin logged in");
            return Ok(record);
        }

        let record = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if record.provenance == Provenance::OAuth {
            return Err(AuthError::InvalidCredentials);
        }

        if !verify_password(&record.password, password) {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %record.id, "user logged in");
        Ok(record)
    }

    /// Apply a profile patch to the account with the given email.
    ///
    /// The stored password digest is never touched by a profile edit.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`] when no account matches.
    pub async fn update_profile(
        &self,
        email: &Email,
        patch: UserPatch,
    ) -> Result<UserRecord, AuthError> {
        let record = self
            .store
            .update(email, patch)
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Store(other),
            })?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %record.id, "profile updated");
        Ok(record)
    }

    /// Delete the account with the given email.
    ///
    /// Cancels any pending reserved-admin expiry timer for the email first,
    /// so an explicit delete and the timer never race.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`] when no account matches.
    pub async fn delete_account(&self, email: &Email) -> Result<UserRecord, AuthError> {
        self.admin.cancel_expiry(email);

        let record = self
            .store
            .delete(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %record.id, "account deleted");
        Ok(record)
    }
}

/// Hash a password with Argon2id and a fresh random salt.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hash(err.to_string()))
}

/// Verify a password against a stored digest.
///
/// Anything that is not a parseable digest (the OAuth sentinel included)
/// verifies as false.
pub(crate) fn verify_password(digest: &str, password: &str) -> bool {
    PasswordHash::new(digest).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use crate::config::ReservedAdminConfig;
    use crate::models::OAUTH_PASSWORD_SENTINEL;
    use crate::store::MemoryUserStore;

    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(AdminManager::disabled()),
        )
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: Email::parse(email).unwrap(),
            age: 30,
            phone: None,
            password: "hunter2hunter2".to_string(),
            password_confirm: "hunter2hunter2".to_string(),
        }
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let digest = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password(&digest, "hunter2hunter2"));
        assert!(!verify_password(&digest, "wrong"));
    }

    #[test]
    fn test_sentinel_never_verifies() {
        assert!(!verify_password(OAUTH_PASSWORD_SENTINEL, "a"));
        assert!(!verify_password(OAUTH_PASSWORD_SENTINEL, ""));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let created = auth.register(register_input("ana@gmail.com")).await.unwrap();
        assert_eq!(created.role, Role::User);
        assert_eq!(created.provenance, Provenance::Password);
        // The digest is stored, never the plaintext.
        assert_ne!(created.password, "hunter2hunter2");

        let logged_in = auth.login("ana@gmail.com", "hunter2hunter2").await.unwrap();
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let auth = service();
        auth.register(register_input("ana@gmail.com")).await.unwrap();

        let err = auth.login("ana@gmail.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_same_error() {
        let auth = service();
        let err = auth.login("nobody@gmail.com", "whatever").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_mismatched_confirmation() {
        let auth = service();
        let mut input = register_input("ana@gmail.com");
        input.password_confirm = "different".to_string();

        let err = auth.register(input).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let auth = service();
        auth.register(register_input("ana@gmail.com")).await.unwrap();

        let err = auth.register(register_input("ana@gmail.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_password_digest() {
        let auth = service();
        let created = auth.register(register_input("ana@gmail.com")).await.unwrap();

        let updated = auth
            .update_profile(
                &created.email,
                UserPatch {
                    first_name: Some("Anita".to_string()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Anita");
        assert_eq!(updated.password, created.password);
        // And the original password still logs in.
        auth.login("ana@gmail.com", "hunter2hunter2").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_account_then_login_fails() {
        let auth = service();
        let created = auth.register(register_input("ana@gmail.com")).await.unwrap();

        auth.delete_account(&created.email).await.unwrap();
        let err = auth
            .login("ana@gmail.com", "hunter2hunter2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_delete_missing_account() {
        let auth = service();
        let err = auth
            .delete_account(&Email::parse("nobody@gmail.com").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_reserved_admin_login_materializes_record() {
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let admin = Arc::new(AdminManager::new(
            Some(ReservedAdminConfig {
                first_name: "Admin".to_string(),
                last_name: "Coder".to_string(),
                email: Email::parse("admincoder@coder.com").unwrap(),
                age: 0,
                password: SecretString::from("adminCod3r123"),
            }),
            std::time::Duration::from_secs(60),
        ));
        let auth = AuthService::new(Arc::clone(&store), admin);

        let record = auth
            .login("admincoder@coder.com", "adminCod3r123")
            .await
            .unwrap();
        assert_eq!(record.role, Role::Admin);
        assert!(
            store
                .find_by_email(&record.email)
                .await
                .unwrap()
                .is_some()
        );
    }
}

//! Transient reserved-admin identity.
//!
//! A single credential pair from configuration maps to an admin identity
//! that exists in the store only around its login: a matching login
//! materializes the record, and an expiry timer deletes it again after a
//! configured lifetime. Timers are tracked per email so that a
//! re-materialization resets the clock and an explicit account deletion
//! cancels the pending timer instead of racing it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::ExposeSecret;
use tokio::task::AbortHandle;

use mercadito_core::{Email, Provenance, Role};

use crate::config::{ReservedAdminConfig, StorefrontConfig};
use crate::models::NewUser;
use crate::models::UserRecord;
use crate::services::auth::{AuthError, hash_password};
use crate::store::{StoreError, UserStore};

/// Manages the reserved admin credential pair and its expiry timers.
pub struct AdminManager {
    template: Option<ReservedAdminConfig>,
    ttl: Duration,
    timers: Mutex<HashMap<String, AbortHandle>>,
}

impl AdminManager {
    #[must_use]
    pub fn new(template: Option<ReservedAdminConfig>, ttl: Duration) -> Self {
        Self {
            template,
            ttl,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// A manager with no reserved pair; `matches` is always false.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self::new(
            config.reserved_admin.clone(),
            Duration::from_secs(config.admin_ttl_secs),
        )
    }

    /// Whether a credential pair matches the reserved admin pair.
    #[must_use]
    pub fn matches(&self, email: &Email, password: &str) -> bool {
        self.template.as_ref().is_some_and(|template| {
            template.email == *email && template.password.expose_secret() == password
        })
    }

    /// Materialize the admin record in the store and (re)arm its expiry
    /// timer.
    ///
    /// If an admin record already exists (a previous timer was cancelled,
    /// or a concurrent login won the create), it is reused and the timer is
    /// reset. An ordinary account registered under the reserved email is
    /// never reused: the login fails and no timer is armed, so the expiry
    /// can never delete an account this manager did not create.
    ///
    /// # Errors
    ///
    /// Store failures, or [`AuthError::InvalidCredentials`] when the
    /// reserved email is held by a non-admin account (or no template is
    /// configured).
    pub async fn materialize(
        &self,
        store: &Arc<dyn UserStore>,
    ) -> Result<UserRecord, AuthError> {
        let template = self.template.as_ref().ok_or(AuthError::InvalidCredentials)?;

        let digest = hash_password(template.password.expose_secret())?;
        let record = match store
            .create(NewUser {
                first_name: template.first_name.clone(),
                last_name: template.last_name.clone(),
                email: template.email.clone(),
                age: template.age,
                password: digest,
                role: Role::Admin,
                phone: None,
                provenance: Provenance::Password,
            })
            .await
        {
            Ok(record) => record,
            Err(StoreError::Conflict(_)) => {
                let existing = store
                    .find_by_email(&template.email)
                    .await
                    .map_err(AuthError::Store)?
                    .ok_or_else(|| {
                        AuthError::Store(StoreError::Unavailable(
                            "admin record vanished during materialization".to_string(),
                        ))
                    })?;
                // Only a previously materialized admin record may be
                // reused. A regular account holding the reserved email must
                // neither grant admin access nor get an expiry timer.
                if existing.role != Role::Admin {
                    tracing::warn!(
                        email = %template.email,
                        "reserved admin email is held by a regular account"
                    );
                    return Err(AuthError::InvalidCredentials);
                }
                existing
            }
            Err(err) => return Err(AuthError::Store(err)),
        };

        self.arm_expiry(Arc::clone(store), record.email.clone());
        Ok(record)
    }

    /// Cancel the pending expiry timer for an email, if any.
    ///
    /// Called on explicit account deletion so the timer never fires against
    /// a record deleted by hand (or a future one reusing the email).
    pub fn cancel_expiry(&self, email: &Email) {
        #[allow(clippy::unwrap_used)] // lock poisoning is unrecoverable here
        let mut timers = self.timers.lock().unwrap();
        if let Some(handle) = timers.remove(email.as_str()) {
            handle.abort();
            tracing::debug!(%email, "cancelled reserved admin expiry timer");
        }
    }

    /// Spawn a deletion task for the email after the configured TTL,
    /// aborting any previously armed timer for the same email.
    fn arm_expiry(&self, store: Arc<dyn UserStore>, email: Email) {
        let ttl = self.ttl;
        let task_email = email.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            match store.delete(&task_email).await {
                Ok(Some(_)) => {
                    tracing::info!(email = %task_email, "reserved admin record expired");
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(
                        email = %task_email,
                        error = %err,
                        "failed to expire reserved admin record"
                    );
                }
            }
        });

        #[allow(clippy::unwrap_used)] // lock poisoning is unrecoverable here
        let mut timers = self.timers.lock().unwrap();
        if let Some(previous) = timers.insert(email.as_str().to_owned(), task.abort_handle()) {
            previous.abort();
        }
    }
}

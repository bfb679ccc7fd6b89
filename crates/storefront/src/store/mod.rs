//! Credential store adapter.
//!
//! The identity core only ever talks to the store through the [`UserStore`]
//! trait; the backing document store is an external collaborator. Every
//! failure is fatal for the current request and surfaces as a generic
//! internal error — the core performs no retries and draws no assumptions
//! about store durability.

pub mod memory;

pub use memory::MemoryUserStore;

use async_trait::async_trait;
use thiserror::Error;

use mercadito_core::{Email, UserId};

use crate::models::{NewUser, UserPatch, UserRecord};

/// Errors surfaced by a credential store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the operation failed outright.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint was violated (duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Opaque lookup/create/update/delete of identity records.
///
/// Mutating operations are keyed by email (the store-level unique key) and
/// return the affected record, `None` when nothing matched. Deletes are
/// idempotent by construction.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a record by its (case-insensitively unique) email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError>;

    /// Find a record by its ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Create a new record, assigning it an ID.
    ///
    /// Fails with [`StoreError::Conflict`] if the email is already taken.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Apply a partial update to the record with the given email.
    ///
    /// Returns the updated record, or `None` if no record matched.
    async fn update(
        &self,
        email: &Email,
        patch: UserPatch,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Delete the record with the given email.
    ///
    /// Returns the deleted record, or `None` if no record matched.
    async fn delete(&self, email: &Email) -> Result<Option<UserRecord>, StoreError>;
}

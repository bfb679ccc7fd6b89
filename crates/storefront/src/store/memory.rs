//! In-memory credential store.
//!
//! Keeps records in a `HashMap` keyed by email behind an async `RwLock`;
//! the lock is the sole serialization point, matching the concurrency model
//! of the document store it stands in for. There is no isolation guarantee
//! across concurrent updates to the same record: the last writer wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use mercadito_core::{Email, UserId};

use super::{StoreError, UserStore};
use crate::models::{NewUser, UserPatch, UserRecord};

/// In-memory [`UserStore`] implementation.
#[derive(Debug)]
pub struct MemoryUserStore {
    records: RwLock<HashMap<String, UserRecord>>,
    next_id: AtomicI32,
}

impl MemoryUserStore {
    /// Create an empty store. IDs start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicI32::new(1),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(email.as_str()).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.values().find(|r| r.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut records = self.records.write().await;

        if records.contains_key(user.email.as_str()) {
            return Err(StoreError::Conflict(format!(
                "email already exists: {}",
                user.email
            )));
        }

        let record = UserRecord {
            id: UserId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            age: user.age,
            password: user.password,
            role: user.role,
            phone: user.phone,
            provenance: user.provenance,
            created_at: Utc::now(),
        };

        records.insert(record.email.as_str().to_owned(), record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        email: &Email,
        patch: UserPatch,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut records = self.records.write().await;

        let Some(mut record) = records.remove(email.as_str()) else {
            return Ok(None);
        };

        if let Some(first_name) = patch.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            record.last_name = last_name;
        }
        if let Some(new_email) = patch.email {
            // Re-keying to an email held by a different record would break
            // the uniqueness invariant.
            if new_email != record.email && records.contains_key(new_email.as_str()) {
                records.insert(record.email.as_str().to_owned(), record);
                return Err(StoreError::Conflict(format!(
                    "email already exists: {new_email}"
                )));
            }
            record.email = new_email;
        }
        if let Some(phone) = patch.phone {
            record.phone = Some(phone);
        }

        records.insert(record.email.as_str().to_owned(), record.clone());
        Ok(Some(record))
    }

    async fn delete(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.remove(email.as_str()))
    }
}

//! In-memory storage backend.
//!
//! [`InMemoryDao`] implements [`Dao`] over a `DashMap` keyed
//! `{bucket}:{id}`. It mirrors the DynamoDB backend's observable
//! semantics: owners are kept verbatim, records without a TTL carry the
//! far-future deadline, and expiry is enforced at read time against the
//! injected [`Clock`]. It backs the endpoint tests and local development;
//! it is not a durability backend.
//!
//! The colon separator in the composite key is safe because bucket names
//! cannot contain colons.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::clock::{system_clock, Clock};
use crate::error::StoreError;
use crate::model::{Item, Key, OwnableItem};
use crate::store::{Dao, EXPIRES_SENTINEL};

#[derive(Debug, Clone)]
struct StoredEntry {
    owner: String,
    data: Map<String, Value>,
    expires: i64,
}

impl StoredEntry {
    fn is_expired(&self, now: i64) -> bool {
        self.expires < EXPIRES_SENTINEL && self.expires <= now
    }

    fn into_ownable(self, id: String, now: i64) -> OwnableItem {
        let ttl = (self.expires < EXPIRES_SENTINEL).then(|| self.expires - now);
        OwnableItem {
            item: Item {
                id,
                data: self.data,
                ttl,
            },
            owner: self.owner,
        }
    }
}

fn record_key(key: &Key) -> String {
    format!("{}:{}", key.bucket, key.id)
}

/// Thread-safe in-memory [`Dao`].
///
/// # Examples
///
/// ```
/// use argus::store::memory::InMemoryDao;
///
/// let dao = InMemoryDao::new();
/// assert!(dao.is_empty());
/// ```
#[derive(Debug)]
pub struct InMemoryDao {
    records: DashMap<String, StoredEntry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDao {
    /// Creates an empty DAO on the system clock.
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Creates an empty DAO on the given clock; tests pass a
    /// [`ManualClock`](crate::clock::ManualClock) for deterministic
    /// expiry.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Number of records held, including ones expired but not yet pruned.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the DAO holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryDao {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dao for InMemoryDao {
    async fn push(&self, key: &Key, item: &OwnableItem) -> Result<(), StoreError> {
        let now = self.clock.now_epoch_secs();
        let expires = match item.item.ttl {
            Some(ttl) => now.saturating_add(ttl),
            None => EXPIRES_SENTINEL,
        };
        self.records.insert(
            record_key(key),
            StoredEntry {
                owner: item.owner.clone(),
                data: item.item.data.clone(),
                expires,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &Key) -> Result<OwnableItem, StoreError> {
        let now = self.clock.now_epoch_secs();
        let entry = self
            .records
            .get(&record_key(key))
            .ok_or(StoreError::NotFound)?;
        if entry.is_expired(now) {
            return Err(StoreError::NotFound);
        }
        Ok(entry.value().clone().into_ownable(key.id.clone(), now))
    }

    async fn delete(&self, key: &Key) -> Result<OwnableItem, StoreError> {
        let now = self.clock.now_epoch_secs();
        let (_, entry) = self
            .records
            .remove(&record_key(key))
            .ok_or(StoreError::NotFound)?;
        if entry.is_expired(now) {
            return Err(StoreError::NotFound);
        }
        Ok(entry.into_ownable(key.id.clone(), now))
    }

    async fn get_all(&self, bucket: &str) -> Result<HashMap<String, OwnableItem>, StoreError> {
        let now = self.clock.now_epoch_secs();
        let prefix = format!("{bucket}:");
        let items = self
            .records
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix) && !entry.is_expired(now))
            .map(|entry| {
                let id = entry.key()[prefix.len()..].to_string();
                (id.clone(), entry.value().clone().into_ownable(id, now))
            })
            .collect();
        Ok(items)
    }
}

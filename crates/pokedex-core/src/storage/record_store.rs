//! Record store adapter
//!
//! Translates record operations into backend calls under the
//! `["pokemons", id]` key family.

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::storage::StorageImpl;
use crate::types::record::json_kind;
use crate::types::{KvKey, Record, RecordId, Result, StoreError};

/// Get/list/put/delete for pokemon records
pub struct RecordStore<B: StorageImpl> {
    backend: Arc<B>,
}

impl<B: StorageImpl> RecordStore<B> {
    /// Create a store over `backend`
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Fetch one record
    pub fn get(&self, id: RecordId) -> Result<Option<Record>> {
        let key = KvKey::record(id);
        match self.backend.get(&key)? {
            Some(value) => Ok(Some(decode(&key, value)?)),
            None => Ok(None),
        }
    }

    /// Every record, ascending by id
    pub fn list(&self) -> Result<Vec<Record>> {
        self.backend
            .list(&KvKey::collection())?
            .into_iter()
            .map(|(key, value)| decode(&key, value))
            .collect()
    }

    /// Store `record` under `id`, replacing whatever was there
    pub fn put(&self, id: RecordId, record: &Record) -> Result<()> {
        let value = serde_json::to_value(record).map_err(StoreError::from)?;
        self.backend.set(&KvKey::record(id), value)?;
        Ok(())
    }

    /// Remove a record; `false` if it did not exist
    pub fn delete(&self, id: RecordId) -> Result<bool> {
        Ok(self.backend.delete(&KvKey::record(id))?)
    }

    /// Whether a record is stored under `id` (point lookup)
    pub fn exists(&self, id: RecordId) -> Result<bool> {
        Ok(self.backend.get(&KvKey::record(id))?.is_some())
    }

    /// Remove every record; returns how many were removed
    pub fn delete_all(&self) -> Result<usize> {
        let mut removed = 0;
        for (key, _) in self.backend.list(&KvKey::collection())? {
            if self.backend.delete(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<B: StorageImpl> Clone for RecordStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

fn decode(key: &KvKey, value: Value) -> Result<Record> {
    Record::try_from(value).map_err(|other| {
        warn!(key = %key, kind = json_kind(&other), "stored record is not an object");
        StoreError::Corruption {
            line: 0,
            reason: format!("value at {} is {}, expected an object", key, json_kind(&other)),
        }
        .into()
    })
}

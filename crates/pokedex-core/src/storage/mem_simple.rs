//! Simple in-memory backend using DashMap
//!
//! Values live as JSON in a sharded concurrent map. Single-key operations lock
//! only the shard holding the key, which is what makes `atomic_add`
//! linearizable: the read, the add and the write happen under one entry guard.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tracing::trace;

use crate::storage::{KvBackend, StoreResult};
use crate::types::{KvKey, StoreError};

/// In-memory key-value backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Map of tuple key to JSON value
    entries: DashMap<KvKey, Value>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of stored entries across all key families
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every entry in key order
    pub(crate) fn snapshot(&self) -> Vec<(KvKey, Value)> {
        let mut all: Vec<(KvKey, Value)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Value that `atomic_add(key, delta)` would commit, without committing it
    pub(crate) fn peek_add(&self, key: &KvKey, delta: u64) -> StoreResult<u64> {
        let current = match self.entries.get(key) {
            Some(value) => counter_value(key, &value)?,
            None => 0,
        };
        current
            .checked_add(delta)
            .ok_or_else(|| StoreError::CounterOverflow(key.to_string()))
    }
}

fn counter_value(key: &KvKey, value: &Value) -> StoreResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| StoreError::NotACounter(key.to_string()))
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &KvKey) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).map(|value| value.value().clone()))
    }

    fn list(&self, prefix: &KvKey) -> StoreResult<Vec<(KvKey, Value)>> {
        // DashMap iterates in hash order; sort to honour key order.
        let mut matched: Vec<(KvKey, Value)> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        matched.sort_by(|a, b| a.0.cmp(&b.0));
        trace!(prefix = %prefix, count = matched.len(), "listed entries");
        Ok(matched)
    }

    fn set(&self, key: &KvKey, value: Value) -> StoreResult<()> {
        self.entries.insert(key.clone(), value);
        Ok(())
    }

    fn delete(&self, key: &KvKey) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn atomic_add(&self, key: &KvKey, delta: u64) -> StoreResult<u64> {
        // The entry guard holds the shard write lock until it is dropped.
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let current = counter_value(key, occupied.get())?;
                let next = current
                    .checked_add(delta)
                    .ok_or_else(|| StoreError::CounterOverflow(key.to_string()))?;
                occupied.insert(Value::from(next));
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Value::from(delta));
                Ok(delta)
            }
        }
    }
}

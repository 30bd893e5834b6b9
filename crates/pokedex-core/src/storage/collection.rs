//! Collection service
//!
//! The record operations the HTTP handlers call. Each one returns a domain
//! [`Error`] the handler maps to a status: `NotFound` for a missing id or an
//! empty collection, `AllocationFailed` when create cannot get an id.
//!
//! There is no lock at this level. Two updates of the same id race and the
//! last write wins; only id allocation is serialized, by the backend.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::{IdAllocator, RecordStore, StorageImpl};
use crate::types::{format_timestamp, Error, Record, RecordId, Result};

/// The pokemon collection
pub struct Collection<B: StorageImpl> {
    records: RecordStore<B>,
    allocator: IdAllocator<B>,
}

impl<B: StorageImpl> Collection<B> {
    /// Build the collection over a shared backend
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            records: RecordStore::new(Arc::clone(&backend)),
            allocator: IdAllocator::new(backend),
        }
    }

    /// Access the record store adapter
    pub fn records(&self) -> &RecordStore<B> {
        &self.records
    }

    /// Access the id allocator
    pub fn allocator(&self) -> &IdAllocator<B> {
        &self.allocator
    }

    /// Create a record from client fields, returning its id and the record as stored
    ///
    /// Allocation happens before anything is written, so a failed allocation
    /// leaves no partial record behind.
    pub fn create(&self, mut record: Record) -> Result<(RecordId, Record)> {
        let id = self.allocator.next_id()?;
        record.stamp(id, &format_timestamp(Utc::now()));
        self.records.put(id, &record)?;
        info!(id, "pokemon created");
        Ok((id, record))
    }

    /// Fetch one record
    pub fn get(&self, id: RecordId) -> Result<Record> {
        self.records.get(id)?.ok_or_else(|| missing(id))
    }

    /// Every record; an empty collection is `NotFound`
    pub fn list(&self) -> Result<Vec<Record>> {
        let records = self.records.list()?;
        if records.is_empty() {
            return Err(Error::not_found("no pokemon registered"));
        }
        debug!(count = records.len(), "listed pokemon");
        Ok(records)
    }

    /// Replace the fields of an existing record
    ///
    /// The new fields are not merged into the old ones. `id` and `createdAt`
    /// keep their stored values whatever the client sent.
    pub fn update(&self, id: RecordId, mut record: Record) -> Result<Record> {
        let existing = self.records.get(id)?.ok_or_else(|| missing(id))?;
        let created_at = existing
            .created_at()
            .map(str::to_string)
            .unwrap_or_else(|| format_timestamp(Utc::now()));
        record.stamp(id, &created_at);
        self.records.put(id, &record)?;
        info!(id, "pokemon updated");
        Ok(record)
    }

    /// Ensure a record exists before a mutation
    pub fn ensure_exists(&self, id: RecordId) -> Result<()> {
        if self.records.exists(id)? {
            Ok(())
        } else {
            Err(missing(id))
        }
    }

    /// Remove one record
    pub fn delete(&self, id: RecordId) -> Result<()> {
        self.ensure_exists(id)?;
        // A concurrent delete may win between the check and here.
        if !self.records.delete(id)? {
            return Err(missing(id));
        }
        info!(id, "pokemon deleted");
        Ok(())
    }

    /// Remove every record; the id counter is left untouched
    pub fn delete_all(&self) -> Result<usize> {
        let removed = self.records.delete_all()?;
        info!(removed, "collection cleared");
        Ok(removed)
    }
}

impl<B: StorageImpl> Clone for Collection<B> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            allocator: self.allocator.clone(),
        }
    }
}

fn missing(id: RecordId) -> Error {
    Error::not_found(format!("no pokemon with id {}", id))
}

/// Parse a path id: ASCII digits only, fitting in u64
pub fn parse_record_id(raw: &str) -> Result<RecordId> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(format!(
            "id must be a non-negative integer, got {:?}",
            raw
        )));
    }
    raw.parse::<RecordId>()
        .map_err(|_| Error::validation(format!("id {} is out of range", raw)))
}

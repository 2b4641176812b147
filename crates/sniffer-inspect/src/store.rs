//! Append-only record store.

use std::sync::Arc;

use sniffer_types::{Record, RecordId};

use crate::error::InspectError;

/// Ordered, append-only collection of captured records.
///
/// Records are kept in strictly increasing `message_id` order. The id
/// high-water mark survives [`RecordStore::clear`], so a transport that
/// replays old records after a clear is still rejected.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Arc<Record>>,
    last_id: Option<RecordId>,
    generation: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, returning the new number of records.
    ///
    /// Fails with [`InspectError::InvariantViolation`] when the id does not
    /// exceed the last appended id. The store is unchanged on failure.
    pub fn append(&mut self, record: impl Into<Arc<Record>>) -> Result<usize, InspectError> {
        let record = record.into();
        if let Some(last) = self.last_id {
            if record.message_id <= last {
                tracing::warn!(
                    last,
                    attempted = record.message_id,
                    "rejected out-of-order record"
                );
                return Err(InspectError::InvariantViolation {
                    last,
                    attempted: record.message_id,
                });
            }
        }

        self.last_id = Some(record.message_id);
        self.records.push(record);
        Ok(self.records.len())
    }

    /// Removes every record and bumps the generation.
    pub fn clear(&mut self) {
        let dropped = self.records.len();
        self.records.clear();
        self.generation += 1;
        tracing::debug!(dropped, generation = self.generation, "record store cleared");
    }

    /// The current contents, in append order.
    pub fn snapshot(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks a record up by id.
    pub fn get(&self, id: RecordId) -> Option<&Arc<Record>> {
        self.records
            .binary_search_by_key(&id, |r| r.message_id)
            .ok()
            .map(|index| &self.records[index])
    }

    /// Highest id ever appended, including records since cleared.
    pub fn last_id(&self) -> Option<RecordId> {
        self.last_id
    }

    /// Counter bumped on every clear. A reader that remembers how far it
    /// scanned may resume from there only while the generation is unchanged.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

//! Filtered view over the record store.

use std::sync::Arc;

use sniffer_types::{Record, RecordId};

/// The filtered subsequence of the store, in store order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    records: Vec<Arc<Record>>,
}

impl View {
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.message_id).collect()
    }

    /// Index of the record with `id`. The view inherits the store's id
    /// ordering, so this is a binary search.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records
            .binary_search_by_key(&id, |r| r.message_id)
            .ok()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Record>> {
        self.records.get(index)
    }

    pub fn find(&self, id: RecordId) -> Option<&Arc<Record>> {
        self.position(id).map(|index| &self.records[index])
    }

    pub(crate) fn push(&mut self, record: Arc<Record>) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}

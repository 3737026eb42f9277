//! In-memory record store.
//!
//! An ordinary associative container keyed by record id. The transport
//! never calls it directly; the server consumes it and ships the outcome
//! back as an encoded response payload. Each server owns its own store, so
//! several servers can coexist in one process.

use recwire_proto::Record;
use std::collections::HashMap;

/// Outcome of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

/// The tiny record store.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: HashMap<u32, Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` under its id. An existing record is never
    /// overwritten.
    pub fn try_add(&mut self, record: Record) -> AddOutcome {
        use std::collections::hash_map::Entry;

        match self.records.entry(record.id) {
            Entry::Occupied(_) => AddOutcome::AlreadyExists,
            Entry::Vacant(slot) => {
                slot.insert(record);
                AddOutcome::Added
            }
        }
    }

    /// Look up a record by id.
    pub fn try_get(&self, id: u32) -> Option<&Record> {
        self.records.get(&id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_get() {
        let mut store = RecordStore::new();
        assert_eq!(store.try_add(Record::add(7, "Ann", 30)), AddOutcome::Added);

        let found = store.try_get(7).unwrap();
        assert_eq!(found.name, "Ann");
        assert_eq!(found.age, 30);
    }

    #[test]
    fn test_duplicate_id_keeps_original() {
        let mut store = RecordStore::new();
        store.try_add(Record::add(7, "Ann", 30));
        assert_eq!(
            store.try_add(Record::add(7, "Bob", 44)),
            AddOutcome::AlreadyExists
        );
        assert_eq!(store.try_get(7).unwrap().name, "Ann");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_id() {
        let store = RecordStore::new();
        assert!(store.try_get(99).is_none());
        assert!(store.is_empty());
    }
}

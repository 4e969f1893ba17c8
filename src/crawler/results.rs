//! Extracted records and the buffer that delivers them
//!
//! Workers push records into the [`ResultStream`]; the consumer pops them in
//! completion order. The stream also owns the set of entity ids already
//! accepted, so "mark seen" and "push" are one critical section.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An extracted record awaiting delivery
///
/// Serializes as a flat JSON object with the entity id under `uid` followed by
/// the extracted fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingRecord {
    #[serde(rename = "uid")]
    entity_id: String,

    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl PendingRecord {
    /// Creates a record with no fields for the given entity
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            fields: Map::new(),
        }
    }

    /// Adds a field; `uid` is reserved for the entity id and is ignored
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a field; `uid` is reserved for the entity id and is ignored
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if key != "uid" {
            self.fields.insert(key, value.into());
        }
    }

    /// The id of the entity this record describes
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// All extracted fields (excluding the entity id)
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Looks up a single extracted field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Serializes the record as a single JSON line (without trailing newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Default)]
struct StreamInner {
    pending: VecDeque<PendingRecord>,
    seen: HashSet<String>,
}

/// FIFO buffer of records with entity-level deduplication
#[derive(Debug, Default)]
pub struct ResultStream {
    inner: Mutex<StreamInner>,
}

impl ResultStream {
    /// Creates an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StreamInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepts a record unless its entity id was accepted before
    ///
    /// Returns true if the record was buffered. No two buffered or delivered
    /// records ever share an entity id.
    pub fn offer(&self, record: PendingRecord) -> bool {
        let mut inner = self.lock();

        if !inner.seen.insert(record.entity_id.clone()) {
            return false;
        }

        inner.pending.push_back(record);
        true
    }

    /// Removes and returns the oldest buffered record
    pub fn pop(&self) -> Option<PendingRecord> {
        self.lock().pending.pop_front()
    }

    /// Returns whether a record for this entity id has been accepted
    pub fn has_seen(&self, entity_id: &str) -> bool {
        self.lock().seen.contains(entity_id)
    }

    /// Returns the number of buffered records
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Returns whether no record is buffered
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Returns the number of distinct entity ids accepted so far
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }
}

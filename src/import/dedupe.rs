use std::collections::HashSet;

use crate::model::IdentityKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateVerdict {
    /// Not seen in this batch or in the store.
    Fresh,
    /// Second occurrence within the current file.
    InBatch,
    /// Collides with an active persisted household.
    Persisted,
}

/// Call-scoped duplicate state: the keys staged so far in this import plus a
/// snapshot of the store's active keys. Nothing outlives the import call;
/// the storage-level unique index stays the final arbiter for writes that
/// race with other importers.
#[derive(Debug)]
pub struct Deduper {
    existing: HashSet<IdentityKey>,
    seen: HashSet<IdentityKey>,
}

impl Deduper {
    pub fn new(existing: HashSet<IdentityKey>) -> Self {
        Deduper {
            existing,
            seen: HashSet::new(),
        }
    }

    pub fn check(&mut self, key: IdentityKey) -> DuplicateVerdict {
        if self.existing.contains(&key) {
            return DuplicateVerdict::Persisted;
        }
        if !self.seen.insert(key) {
            return DuplicateVerdict::InBatch;
        }
        DuplicateVerdict::Fresh
    }
}

//! The allocation, pending-unreachable, and last-use/unreachable tables
//! (§2 items 4-6, §3).

use crate::domain::types::{ObjectId, ObjectType, SourceLocId, Timestamp};

/// Per-object allocation record, held in `live` or `unreachable` (§3).
#[derive(Debug, Clone)]
pub struct AllocInfo {
    pub object_type: ObjectType,
    pub allocation_site: SourceLocId,
    pub creation_time: Timestamp,
    pub creation_call_stack: Vec<SourceLocId>,
}

impl AllocInfo {
    #[must_use]
    pub fn new(
        object_type: ObjectType,
        allocation_site: SourceLocId,
        creation_time: Timestamp,
        creation_call_stack: Vec<SourceLocId>,
    ) -> Self {
        AllocInfo { object_type, allocation_site, creation_time, creation_call_stack }
    }

    /// A minimal record synthesized when an object is observed for the first
    /// time via `unreachable_object` or `add_dom_child` (§3, "Lifecycles").
    #[must_use]
    pub fn synthesize_dom() -> Self {
        AllocInfo {
            object_type: ObjectType::Dom,
            allocation_site: SourceLocId::UNKNOWN,
            creation_time: Timestamp::UNKNOWN,
            creation_call_stack: Vec::new(),
        }
    }
}

/// Per-object last-use/unreachable record, dense by object id (§3).
#[derive(Debug, Clone)]
pub struct LastUseUnreachableInfo {
    pub object_id: ObjectId,
    pub most_recent_use_time: Timestamp,
    pub most_recent_use_site: SourceLocId,
    pub unreachable_time: Timestamp,
    pub unreachable_site: SourceLocId,
}

impl LastUseUnreachableInfo {
    #[must_use]
    pub fn new(object_id: ObjectId) -> Self {
        LastUseUnreachableInfo {
            object_id,
            most_recent_use_time: Timestamp::UNKNOWN,
            most_recent_use_site: SourceLocId::UNKNOWN,
            unreachable_time: Timestamp::UNKNOWN,
            unreachable_site: SourceLocId::UNKNOWN,
        }
    }
}

/// An update-iid record queued for the update-IID binary stream (§3, §6.3).
///
/// `creation_time` is carried only as a sort key; it is not itself emitted.
#[derive(Debug, Clone, Copy)]
pub struct IidUpdateRecord {
    pub object_id: ObjectId,
    pub creation_time: Timestamp,
    pub new_site: SourceLocId,
}

/// The dense, indexed-by-object-id `info` array (§2 item 6, §9 design note).
///
/// Grows on demand to `max_id + 1`; sparse slots are left `None`. Object ids
/// are small non-negative integers assigned monotonically upstream, so a
/// growable `Vec` beats a hash map here.
#[derive(Debug, Default)]
pub struct InfoTable {
    entries: Vec<Option<LastUseUnreachableInfo>>,
}

impl InfoTable {
    #[must_use]
    pub fn new() -> Self {
        InfoTable { entries: Vec::new() }
    }

    fn ensure_capacity(&mut self, oid: ObjectId) {
        let idx = oid.0 as usize;
        if idx >= self.entries.len() {
            self.entries.resize_with(idx + 1, || None);
        }
    }

    /// Returns the entry for `oid`, creating a default one on first reference.
    pub fn get_or_create(&mut self, oid: ObjectId) -> &mut LastUseUnreachableInfo {
        self.ensure_capacity(oid);
        let idx = oid.0 as usize;
        self.entries[idx].get_or_insert_with(|| LastUseUnreachableInfo::new(oid))
    }

    #[must_use]
    pub fn get(&self, oid: ObjectId) -> Option<&LastUseUnreachableInfo> {
        self.entries.get(oid.0 as usize).and_then(Option::as_ref)
    }

    /// Consumes the table, returning its entries for finalization (§4.5).
    /// The order here is insertion/id order; finalization re-sorts it twice.
    #[must_use]
    pub fn into_entries(self) -> Vec<Option<LastUseUnreachableInfo>> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_grows_sparse_array() {
        let mut table = InfoTable::new();
        table.get_or_create(ObjectId(5));
        assert!(table.get(ObjectId(0)).is_none());
        assert!(table.get(ObjectId(4)).is_none());
        assert!(table.get(ObjectId(5)).is_some());
    }

    #[test]
    fn get_or_create_is_idempotent_by_id() {
        let mut table = InfoTable::new();
        table.get_or_create(ObjectId(3)).most_recent_use_time = Timestamp(42);
        assert_eq!(table.get_or_create(ObjectId(3)).most_recent_use_time, Timestamp(42));
    }
}

//! Append-only transaction log for the session.

use crate::models::BorrowRecord;

/// Ordered log of submitted records. Insertion order is authoritative.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<BorrowRecord>,
}

impl RecordStore {
    /// Append a record at the end of the log.
    pub fn append(&mut self, record: BorrowRecord) {
        self.records.push(record);
    }

    /// Records in append order.
    pub fn as_slice(&self) -> &[BorrowRecord] {
        &self.records
    }

    /// Records most recent first, for display.
    pub fn newest_first(&self) -> impl Iterator<Item = &BorrowRecord> {
        self.records.iter().rev()
    }

    /// Most recently appended record.
    pub fn latest(&self) -> Option<&BorrowRecord> {
        self.records.last()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_reverses_append_order() {
        let mut store = RecordStore::default();
        let first = BorrowRecord::return_all("1");
        let second = BorrowRecord::return_all("2");
        let third = BorrowRecord::return_all("3");
        store.append(first.clone());
        store.append(second.clone());
        store.append(third.clone());

        let shown: Vec<_> = store.newest_first().map(|r| r.id.clone()).collect();
        assert_eq!(shown, vec![third.id.clone(), second.id, first.id.clone()]);
        assert_eq!(store.as_slice()[0].id, first.id);
        assert_eq!(store.latest().map(|r| r.id.as_str()), Some(third.id.as_str()));
        assert_eq!(store.len(), 3);
    }
}

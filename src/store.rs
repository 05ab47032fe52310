//! In-memory user store with client-side pagination.
//!
//! The store is the only copy of the data: edits are never written back to
//! the remote source and are lost when the process exits.

use crate::user::{UserPatch, UserRecord};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Ordered, authoritative list of user records
#[derive(Debug, Clone, PartialEq)]
pub struct UserStore {
    records: Vec<UserRecord>,
    /// `None` once an id of `u64::MAX` has been seen
    next_id: Option<u64>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: Some(1),
        }
    }

    /// Replace the whole contents. Duplicate ids are passed through as-is.
    pub fn load(&mut self, records: Vec<UserRecord>) {
        self.next_id = match records.iter().map(|u| u.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        };
        self.records = records;
    }

    /// Append a record. The caller chooses the id, normally via `next_id()`.
    pub fn add(&mut self, record: UserRecord) {
        if let Some(next) = self.next_id {
            if record.id >= next {
                self.next_id = record.id.checked_add(1);
            }
        }
        self.records.push(record);
    }

    /// Apply `patch` to the first record with `id`. Returns false if none matched.
    pub fn update(&mut self, id: u64, patch: &UserPatch) -> bool {
        match self.records.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                patch.apply(user);
                true
            }
            None => false,
        }
    }

    /// Remove every record with `id`, returning how many went away
    pub fn remove(&mut self, id: u64) -> usize {
        let before = self.records.len();
        self.records.retain(|u| u.id != id);
        before - self.records.len()
    }

    /// Slice `[size * (n - 1), size * n)`; empty when out of range
    pub fn page(&self, page_number: usize, page_size: usize) -> &[UserRecord] {
        if page_number == 0 || page_size == 0 {
            return &[];
        }
        let start = page_size.saturating_mul(page_number - 1);
        if start >= self.records.len() {
            return &[];
        }
        let end = start.saturating_add(page_size).min(self.records.len());
        &self.records[start..end]
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.records.len().div_ceil(page_size)
    }

    /// Fresh id for a new record. Never reuses an id freed by `remove`;
    /// `None` when the id space is used up.
    pub fn next_id(&self) -> Option<u64> {
        self.next_id
    }

    pub fn get(&self, id: u64) -> Option<&UserRecord> {
        self.records.iter().find(|u| u.id == id)
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

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

    fn user(id: u64) -> UserRecord {
        UserRecord {
            id,
            name: format!("user{}", id),
            email: format!("user{}@example.com", id),
            role: "member".to_string(),
            status: id % 2 == 0,
            avatar: String::new(),
            last_login: None,
        }
    }

    fn store_of(n: u64) -> UserStore {
        let mut store = UserStore::new();
        store.load((1..=n).map(user).collect());
        store
    }

    #[test]
    fn test_empty_store() {
        let store = UserStore::new();
        assert_eq!(store.page_count(DEFAULT_PAGE_SIZE), 0);
        assert!(store.page(1, DEFAULT_PAGE_SIZE).is_empty());
        assert_eq!(store.next_id(), Some(1));
    }

    #[test]
    fn test_load_scenario() {
        let mut store = UserStore::new();
        store.load(vec![]);
        assert_eq!(store.page_count(10), 0);

        store.load((1..=25).map(user).collect());
        assert_eq!(store.page_count(10), 3);
        assert_eq!(store.page(3, 10).len(), 5);
        assert!(store.page(4, 10).is_empty());
        assert_eq!(store.page(2, 10)[0].id, 11);
    }

    #[test]
    fn test_page_count_matches_ceil() {
        for n in 0..40u64 {
            let store = store_of(n);
            for p in 1..12usize {
                let expected = (n as usize + p - 1) / p;
                assert_eq!(store.page_count(p), expected, "n={} p={}", n, p);
            }
        }
    }

    #[test]
    fn test_page_lengths() {
        for n in 1..40u64 {
            let store = store_of(n);
            for p in 1..12usize {
                let count = store.page_count(p);
                for page in 1..count {
                    assert_eq!(store.page(page, p).len(), p);
                }
                assert_eq!(store.page(count, p).len(), n as usize - p * (count - 1));
                assert!(store.page(0, p).is_empty());
                assert!(store.page(count + 1, p).is_empty());
            }
        }
    }

    #[test]
    fn test_zero_page_size() {
        let store = store_of(5);
        assert_eq!(store.page_count(0), 0);
        assert!(store.page(1, 0).is_empty());
    }

    #[test]
    fn test_add_then_remove_restores() {
        let mut store = store_of(4);
        let before = store.records().to_vec();
        let id = store.next_id().unwrap();
        store.add(user(id));
        assert_eq!(store.len(), 5);
        assert_eq!(store.records().last().unwrap().id, id);
        assert_eq!(store.remove(id), 1);
        assert_eq!(store.records(), before.as_slice());
    }

    #[test]
    fn test_update_unmatched_is_noop() {
        let mut store = store_of(3);
        let before = store.clone();
        let patch = UserPatch::full("x", "x@x", "x", true, "");
        assert!(!store.update(99, &patch));
        assert_eq!(store, before);
    }

    #[test]
    fn test_update_first_match_only() {
        let mut store = UserStore::new();
        store.load(vec![user(1), user(1), user(2)]);
        let patch = UserPatch {
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        assert!(store.update(1, &patch));
        assert_eq!(store.records()[0].name, "renamed");
        assert_eq!(store.records()[1].name, "user1");
    }

    #[test]
    fn test_remove_all_duplicates() {
        let mut store = UserStore::new();
        store.load(vec![user(1), user(2), user(1)]);
        assert_eq!(store.remove(1), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(42), 0);
    }

    #[test]
    fn test_next_id_not_reused_after_delete() {
        let mut store = store_of(3);
        assert_eq!(store.next_id(), Some(4));
        store.remove(2);
        // len + 1 would collide with id 3 here
        assert_eq!(store.next_id(), Some(4));
        store.add(user(4));
        assert_eq!(store.next_id(), Some(5));
    }

    #[test]
    fn test_load_seeds_next_id_from_max() {
        let mut store = UserStore::new();
        store.load(vec![user(10), user(3)]);
        assert_eq!(store.next_id(), Some(11));
        assert_eq!(store.get(3).unwrap().name, "user3");
        assert!(store.get(4).is_none());
    }

    #[test]
    fn test_load_max_id_exhausts_counter() {
        let mut store = UserStore::new();
        store.load(vec![user(2), user(u64::MAX)]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.next_id(), None);

        // a later reload with ordinary ids restores the counter
        store.load(vec![user(5)]);
        assert_eq!(store.next_id(), Some(6));
    }

    #[test]
    fn test_add_max_id_exhausts_counter() {
        let mut store = store_of(2);
        store.add(user(u64::MAX));
        assert_eq!(store.next_id(), None);
        store.add(user(7));
        assert_eq!(store.next_id(), None);
        assert_eq!(store.len(), 4);
    }
}

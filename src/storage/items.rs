//! Item repository for JSON storage
//!
//! Manages loading and saving items to items.json, and exposes the catalog to
//! the backup engine through the [`ItemStore`] trait.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{ExpireError, ExpireResult};
use crate::models::Item;

use super::file_io::{read_json, write_json_atomic};

/// Whole-catalog access used by backup and restore
pub trait ItemStore {
    /// Every item, active or not, oldest first
    fn get_all_ordered(&self) -> ExpireResult<Vec<Item>>;

    /// Drop the current catalog and insert `items`; returns the inserted count
    fn replace_all(&self, items: Vec<Item>) -> ExpireResult<usize>;

    /// Insert `items` alongside the current catalog; returns the inserted count
    ///
    /// Items carrying an id that already exists overwrite the stored item.
    /// Items with id 0 are assigned a fresh id.
    fn insert_many(&self, items: Vec<Item>) -> ExpireResult<usize>;
}

/// Serializable item data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ItemData {
    #[serde(default)]
    next_id: i64,
    items: Vec<Item>,
}

#[derive(Clone)]
struct ItemState {
    items: BTreeMap<i64, Item>,
    next_id: i64,
}

impl ItemState {
    fn empty() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Store an item, assigning an id if it has none
    fn put(&mut self, mut item: Item) -> ExpireResult<Item> {
        if item.id <= 0 {
            item.id = self.next_id;
        }
        let following = item.id.checked_add(1).ok_or_else(|| {
            ExpireError::Storage(format!("Item id {} leaves no room for new items", item.id))
        })?;

        item.truncate_timestamps();
        self.next_id = self.next_id.max(following);
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    /// Store every item in `items` on a copy of this state
    ///
    /// The copy is returned only if all items fit, so a failure leaves the
    /// caller's state untouched.
    fn with_all(&self, items: Vec<Item>) -> ExpireResult<(Self, usize)> {
        let mut next = self.clone();
        let mut count = 0;
        for item in items {
            next.put(item)?;
            count += 1;
        }
        Ok((next, count))
    }
}

/// Repository for item persistence
pub struct ItemRepository {
    path: PathBuf,
    state: RwLock<ItemState>,
}

impl ItemRepository {
    /// Create a new item repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(ItemState::empty()),
        }
    }

    fn read(&self) -> ExpireResult<std::sync::RwLockReadGuard<'_, ItemState>> {
        self.state
            .read()
            .map_err(|e| ExpireError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> ExpireResult<std::sync::RwLockWriteGuard<'_, ItemState>> {
        self.state
            .write()
            .map_err(|e| ExpireError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load items from disk
    pub fn load(&self) -> ExpireResult<()> {
        let file_data: ItemData = read_json(&self.path)?;
        let mut state = self.write()?;

        let (loaded, _) = ItemState::empty().with_all(file_data.items)?;
        *state = loaded;
        state.next_id = state.next_id.max(file_data.next_id);

        debug!(count = state.items.len(), path = %self.path.display(), "loaded items");
        Ok(())
    }

    /// Save items to disk
    pub fn save(&self) -> ExpireResult<()> {
        let state = self.read()?;

        let file_data = ItemData {
            next_id: state.next_id,
            items: state.items.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get an item by ID
    pub fn get(&self, id: i64) -> ExpireResult<Option<Item>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    /// Get all items ordered by creation time
    pub fn get_all(&self) -> ExpireResult<Vec<Item>> {
        let state = self.read()?;
        let mut items: Vec<_> = state.items.values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Get active items ordered by expiry date
    pub fn get_active(&self) -> ExpireResult<Vec<Item>> {
        let mut items: Vec<_> = self
            .read()?
            .items
            .values()
            .filter(|i| i.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Case-insensitive substring search over item names
    pub fn search(&self, query: &str) -> ExpireResult<Vec<Item>> {
        let query = query.trim().to_lowercase();
        let mut items: Vec<_> = self
            .read()?
            .items
            .values()
            .filter(|i| i.name.to_lowercase().contains(&query))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(items)
    }

    /// Insert a new item, assigning its id; returns the stored item
    pub fn insert(&self, item: Item) -> ExpireResult<Item> {
        let mut item = item;
        item.id = 0;
        self.write()?.put(item)
    }

    /// Insert or update an item
    pub fn upsert(&self, item: Item) -> ExpireResult<Item> {
        self.write()?.put(item)
    }

    /// Delete an item
    pub fn delete(&self, id: i64) -> ExpireResult<Option<Item>> {
        Ok(self.write()?.items.remove(&id))
    }

    /// Count items
    pub fn count(&self) -> ExpireResult<usize> {
        Ok(self.read()?.items.len())
    }
}

impl ItemStore for ItemRepository {
    fn get_all_ordered(&self) -> ExpireResult<Vec<Item>> {
        self.get_all()
    }

    fn replace_all(&self, items: Vec<Item>) -> ExpireResult<usize> {
        let inserted = {
            let mut state = self.write()?;
            let cleared = ItemState {
                items: BTreeMap::new(),
                next_id: state.next_id,
            };
            let (next, inserted) = cleared.with_all(items)?;
            *state = next;
            inserted
        };
        self.save()?;
        Ok(inserted)
    }

    fn insert_many(&self, items: Vec<Item>) -> ExpireResult<usize> {
        let inserted = {
            let mut state = self.write()?;
            let (next, inserted) = state.with_all(items)?;
            *state = next;
            inserted
        };
        self.save()?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ItemRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("items.json");
        let repo = ItemRepository::new(path);
        (temp_dir, repo)
    }

    fn warranty(name: &str, created_ms: i64) -> Item {
        let purchase = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let mut item = Item::warranty(name, purchase, purchase + Duration::days(365), None);
        item.created_at = DateTime::from_timestamp_millis(created_ms).unwrap();
        item
    }

    #[test]
    fn test_insert_assigns_ids() {
        let (_temp, repo) = create_test_repo();

        let a = repo.insert(warranty("A", 1)).unwrap();
        let b = repo.insert(warranty("B", 2)).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_save_and_load() {
        let (temp, repo) = create_test_repo();
        let item = repo.insert(warranty("Laptop", 5)).unwrap();
        repo.save().unwrap();

        let repo2 = ItemRepository::new(temp.path().join("items.json"));
        repo2.load().unwrap();

        let loaded = repo2.get(item.id).unwrap().unwrap();
        assert_eq!(loaded, item);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (temp, repo) = create_test_repo();
        repo.insert(warranty("A", 1)).unwrap();
        let b = repo.insert(warranty("B", 2)).unwrap();
        repo.delete(b.id).unwrap();
        repo.save().unwrap();

        let repo2 = ItemRepository::new(temp.path().join("items.json"));
        repo2.load().unwrap();
        let c = repo2.insert(warranty("C", 3)).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_get_all_ordered_by_creation() {
        let (_temp, repo) = create_test_repo();
        repo.insert(warranty("Newer", 200)).unwrap();
        repo.insert(warranty("Older", 100)).unwrap();

        let names: Vec<_> = repo
            .get_all_ordered()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Older", "Newer"]);
    }

    #[test]
    fn test_get_active_skips_inactive() {
        let (_temp, repo) = create_test_repo();
        let mut paused = warranty("Paused", 1);
        paused.is_active = false;
        repo.insert(paused).unwrap();
        repo.insert(warranty("Live", 2)).unwrap();

        let active = repo.get_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Live");
    }

    #[test]
    fn test_search() {
        let (_temp, repo) = create_test_repo();
        repo.insert(warranty("Samsung TV", 1)).unwrap();
        repo.insert(warranty("Dishwasher", 2)).unwrap();

        let found = repo.search("tv").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Samsung TV");
    }

    #[test]
    fn test_insert_many_keeps_ids_and_overwrites() {
        let (_temp, repo) = create_test_repo();
        let existing = repo.insert(warranty("Old name", 1)).unwrap();

        let mut replacement = warranty("New name", 1);
        replacement.id = existing.id;
        let mut restored = warranty("Restored", 2);
        restored.id = 40;
        let fresh = warranty("Fresh", 3);

        let count = repo
            .insert_many(vec![replacement, restored, fresh])
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(repo.count().unwrap(), 3);
        assert_eq!(repo.get(existing.id).unwrap().unwrap().name, "New name");
        assert_eq!(repo.get(40).unwrap().unwrap().name, "Restored");
        assert_eq!(repo.search("fresh").unwrap()[0].id, 41);
    }

    #[test]
    fn test_replace_all_persists() {
        let (temp, repo) = create_test_repo();
        repo.insert(warranty("Gone", 1)).unwrap();

        let count = repo.replace_all(vec![warranty("Kept", 2)]).unwrap();
        assert_eq!(count, 1);

        let repo2 = ItemRepository::new(temp.path().join("items.json"));
        repo2.load().unwrap();
        let all = repo2.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Kept");
        assert!(all[0].created_at < Utc::now());
    }

    #[test]
    fn test_upsert_truncates_timestamps() {
        let (_temp, repo) = create_test_repo();
        let mut item = warranty("Blender", 1);
        item.expiry_date = Utc::now() + Duration::days(30);
        item.updated_at = Utc::now();

        let stored = repo.upsert(item.clone()).unwrap();

        assert_eq!(stored.expiry_date.timestamp_millis(), item.expiry_date.timestamp_millis());
        assert_eq!(stored.expiry_date.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(stored.updated_at.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_max_id_is_rejected_without_changes() {
        let (_temp, repo) = create_test_repo();
        let existing = repo.insert(warranty("Existing", 1)).unwrap();

        let mut huge = warranty("Huge", 2);
        huge.id = i64::MAX;

        let err = repo.replace_all(vec![warranty("Fine", 3), huge.clone()]).unwrap_err();
        assert!(matches!(err, ExpireError::Storage(_)));
        assert!(repo.insert_many(vec![huge.clone()]).is_err());
        assert!(repo.upsert(huge).is_err());

        assert_eq!(repo.count().unwrap(), 1);
        assert!(repo.get(existing.id).unwrap().is_some());
        assert_eq!(repo.insert(warranty("Next", 4)).unwrap().id, 2);
    }
}

//! Item service
//!
//! Provides business logic for managing subscriptions and warranties:
//! validation, persistence, receipt images and audit logging.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ExpireError, ExpireResult};
use crate::models::{BillingFrequency, Item, ItemType};
use crate::storage::Storage;

/// Which items a listing should include
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemFilter {
    /// Active items only
    #[default]
    Active,
    /// Active and inactive items
    All,
    Subscriptions,
    Warranties,
}

/// Field changes for an existing item; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub clear_price: bool,
    pub purchase_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub billing_frequency: Option<BillingFrequency>,
    pub notification_config: Option<String>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && !self.clear_price
            && self.purchase_date.is_none()
            && self.expiry_date.is_none()
            && self.billing_frequency.is_none()
            && self.notification_config.is_none()
    }
}

/// Totals across the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total: usize,
    pub active: usize,
    pub subscriptions: usize,
    pub warranties: usize,
    /// Sum of normalized monthly prices of active subscriptions
    pub monthly_spend: f64,
    /// Active items expiring within the next week
    pub expiring_soon: usize,
    pub expired: usize,
}

/// Age after which inactive items are purged by default
pub const DEFAULT_PURGE_AGE_DAYS: i64 = 30;

/// Result of purging old inactive items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurgeReport {
    pub purged: Vec<Item>,
    pub items_remaining: usize,
    /// Bytes used by the item file and receipt images after the purge
    pub storage_bytes: u64,
}

/// Service for item management
pub struct ItemService<'a> {
    storage: &'a Storage,
}

impl<'a> ItemService<'a> {
    /// Create a new item service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Validate and persist a new item, returning it with its assigned id
    pub fn create(&self, item: Item) -> ExpireResult<Item> {
        let mut item = item;
        item.name = item.name.trim().to_string();
        item.image_reference = item
            .image_reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        item.validate()
            .map_err(|e| ExpireError::Validation(e.to_string()))?;

        let item = self.storage.items.insert(item)?;
        self.storage.items.save()?;

        self.storage.log_item_create(&item)?;
        debug!(id = item.id, name = %item.name, "created item");

        Ok(item)
    }

    /// Get an item by ID
    pub fn get(&self, id: i64) -> ExpireResult<Option<Item>> {
        self.storage.items.get(id)
    }

    /// Find an item by ID or exact name (case-insensitive)
    pub fn find(&self, identifier: &str) -> ExpireResult<Option<Item>> {
        if let Ok(id) = identifier.trim().parse::<i64>() {
            if let Some(item) = self.storage.items.get(id)? {
                return Ok(Some(item));
            }
        }

        let wanted = identifier.trim().to_lowercase();
        Ok(self
            .storage
            .items
            .get_all()?
            .into_iter()
            .find(|i| i.name.to_lowercase() == wanted))
    }

    fn require(&self, id: i64) -> ExpireResult<Item> {
        self.storage
            .items
            .get(id)?
            .ok_or_else(|| ExpireError::item_not_found(id.to_string()))
    }

    /// List items matching `filter`, soonest expiry first
    pub fn list(&self, filter: ItemFilter) -> ExpireResult<Vec<Item>> {
        let mut items = match filter {
            ItemFilter::Active => return self.storage.items.get_active(),
            ItemFilter::All => self.storage.items.get_all()?,
            ItemFilter::Subscriptions => self.of_type(ItemType::Subscription)?,
            ItemFilter::Warranties => self.of_type(ItemType::Warranty)?,
        };
        items.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    fn of_type(&self, item_type: ItemType) -> ExpireResult<Vec<Item>> {
        Ok(self
            .storage
            .items
            .get_active()?
            .into_iter()
            .filter(|i| i.item_type == item_type)
            .collect())
    }

    /// Search items by name
    pub fn search(&self, query: &str) -> ExpireResult<Vec<Item>> {
        self.storage.items.search(query)
    }

    /// Active items expiring within `days` of `now`, expired ones excluded
    pub fn expiring_within(&self, now: DateTime<Utc>, days: i64) -> ExpireResult<Vec<Item>> {
        Ok(self
            .storage
            .items
            .get_active()?
            .into_iter()
            .filter(|i| (0..=days).contains(&i.days_until_expiry(now)))
            .collect())
    }

    /// Apply field changes to an item
    pub fn update(&self, id: i64, changes: ItemUpdate) -> ExpireResult<Item> {
        let mut item = self.require(id)?;
        let before = item.clone();

        if let Some(name) = changes.name {
            item.name = name.trim().to_string();
        }
        if changes.clear_price {
            item.price = None;
        } else if let Some(price) = changes.price {
            item.price = Some(price);
        }
        if let Some(date) = changes.purchase_date {
            item.purchase_date = date;
        }
        if let Some(date) = changes.expiry_date {
            item.expiry_date = date;
        }
        if let Some(frequency) = changes.billing_frequency {
            if !item.is_subscription() {
                return Err(ExpireError::Validation(
                    "Only subscriptions have a billing frequency".into(),
                ));
            }
            item.billing_frequency = Some(frequency);
        }
        if let Some(config) = changes.notification_config {
            item.notification_config = Some(config).filter(|c| !c.trim().is_empty());
        }

        self.save_changed(before, item)
    }

    /// Activate or deactivate an item
    pub fn set_active(&self, id: i64, active: bool) -> ExpireResult<Item> {
        let mut item = self.require(id)?;
        if item.is_active == active {
            return Ok(item);
        }

        let before = item.clone();
        item.is_active = active;
        self.save_changed(before, item)
    }

    /// Copy a receipt image into the image store and attach it to an item
    ///
    /// A previously attached image is removed unless another item uses it.
    pub fn attach_image(&self, id: i64, source: &Path) -> ExpireResult<Item> {
        let mut item = self.require(id)?;
        let before = item.clone();

        let reference = self.storage.images.import_file(source)?;
        item.image_reference = Some(reference);
        let item = self.save_changed(before.clone(), item)?;

        if let Some(old) = before.image() {
            self.remove_image_if_unused(old)?;
        }
        Ok(item)
    }

    /// Delete an item and its receipt image
    pub fn delete(&self, id: i64) -> ExpireResult<Item> {
        let item = self
            .storage
            .items
            .delete(id)?
            .ok_or_else(|| ExpireError::item_not_found(id.to_string()))?;
        self.storage.items.save()?;

        if let Some(reference) = item.image() {
            self.remove_image_if_unused(reference)?;
        }

        self.storage.log_item_delete(&item)?;
        debug!(id = item.id, name = %item.name, "deleted item");

        Ok(item)
    }

    /// Inactive items last changed before `now - older_than`
    pub fn stale_inactive(
        &self,
        now: DateTime<Utc>,
        older_than: Duration,
    ) -> ExpireResult<Vec<Item>> {
        let cutoff = now
            .checked_sub_signed(older_than)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Ok(self
            .storage
            .items
            .get_all()?
            .into_iter()
            .filter(|i| !i.is_active && i.updated_at < cutoff)
            .collect())
    }

    /// Delete inactive items last changed before `now - older_than`
    ///
    /// Receipt images no other item uses are removed with them.
    pub fn purge_inactive(
        &self,
        now: DateTime<Utc>,
        older_than: Duration,
    ) -> ExpireResult<PurgeReport> {
        let purged = self.stale_inactive(now, older_than)?;

        if !purged.is_empty() {
            for item in &purged {
                self.storage.items.delete(item.id)?;
            }
            self.storage.items.save()?;

            for item in &purged {
                if let Some(reference) = item.image() {
                    self.remove_image_if_unused(reference)?;
                }
                self.storage.log_item_delete(item)?;
            }
        }

        let items_file = fs::metadata(self.storage.paths().items_file())
            .map(|m| m.len())
            .unwrap_or(0);
        let report = PurgeReport {
            items_remaining: self.storage.items.count()?,
            storage_bytes: items_file + self.storage.images.total_size()?,
            purged,
        };

        info!(
            purged = report.purged.len(),
            remaining = report.items_remaining,
            "purged inactive items"
        );
        Ok(report)
    }

    /// Totals for the whole catalog at `now`
    pub fn summary(&self, now: DateTime<Utc>) -> ExpireResult<CatalogSummary> {
        let items = self.storage.items.get_all()?;
        let mut summary = CatalogSummary {
            total: items.len(),
            ..Default::default()
        };

        for item in items.iter().filter(|i| i.is_active) {
            summary.active += 1;
            if item.is_subscription() {
                summary.subscriptions += 1;
                summary.monthly_spend += item.normalized_monthly_price();
            } else {
                summary.warranties += 1;
            }

            if item.is_expired(now) {
                summary.expired += 1;
            } else if item.is_expiring_soon(now) {
                summary.expiring_soon += 1;
            }
        }

        Ok(summary)
    }

    fn save_changed(&self, before: Item, mut item: Item) -> ExpireResult<Item> {
        item.validate()
            .map_err(|e| ExpireError::Validation(e.to_string()))?;
        item.touch();

        let item = self.storage.items.upsert(item)?;
        self.storage.items.save()?;

        self.storage.log_item_update(&before, &item)?;
        Ok(item)
    }

    fn remove_image_if_unused(&self, reference: &str) -> ExpireResult<()> {
        let still_used = self
            .storage
            .items
            .get_all()?
            .iter()
            .any(|i| i.image() == Some(reference));
        if still_used {
            return Ok(());
        }

        if let Err(e) = self.storage.images.delete(reference) {
            warn!(image = reference, error = %e, "failed to remove receipt image");
        }
        Ok(())
    }
}

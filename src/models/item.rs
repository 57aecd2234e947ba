//! Item model
//!
//! A tracked subscription or warranty/receipt. Items are the unit of the
//! catalog and the payload written into `items.json` inside a backup archive.

use chrono::{DateTime, Duration, Months, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::image::validate_image_reference;

/// Average number of weeks in a month, used to normalize weekly prices
pub const WEEKS_IN_MONTH: f64 = 4.33;

/// Number of months in a year, used to normalize annual prices
pub const MONTHS_IN_YEAR: f64 = 12.0;

/// Days ahead of expiry at which an item counts as "expiring soon"
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// Days ahead of expiry at which a warranty is flagged in its status
pub const WARRANTY_WARNING_DAYS: i64 = 30;

/// Kind of tracked item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A purchase receipt with a warranty end date
    Warranty,
    /// A recurring charge
    Subscription,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warranty => write!(f, "Warranty"),
            Self::Subscription => write!(f, "Subscription"),
        }
    }
}

/// How often a subscription is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BillingFrequency {
    Weekly,
    Monthly,
    Annual,
}

impl BillingFrequency {
    /// Parse a frequency from user input (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" | "w" => Some(Self::Weekly),
            "monthly" | "month" | "m" => Some(Self::Monthly),
            "annual" | "annually" | "yearly" | "year" | "y" => Some(Self::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "Weekly"),
            Self::Monthly => write!(f, "Monthly"),
            Self::Annual => write!(f, "Annual"),
        }
    }
}

/// Warranty coverage state relative to a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarrantyStatus {
    Expired,
    ExpiringSoon,
    Valid,
}

impl fmt::Display for WarrantyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "Expired"),
            Self::ExpiringSoon => write!(f, "Expiring soon"),
            Self::Valid => write!(f, "Valid"),
        }
    }
}

/// A subscription or warranty/receipt record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Store-assigned identity; 0 until persisted
    #[serde(default)]
    pub id: i64,

    /// Subscription or warranty
    #[serde(rename = "type")]
    pub item_type: ItemType,

    /// Display name
    pub name: String,

    /// Price per billing period, or purchase price for warranties
    #[serde(default)]
    pub price: Option<f64>,

    /// Purchase or subscription start date
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub purchase_date: DateTime<Utc>,

    /// Warranty end date, or next charge date for subscriptions
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expiry_date: DateTime<Utc>,

    /// Charge frequency (subscriptions only)
    #[serde(default)]
    pub billing_frequency: Option<BillingFrequency>,

    /// File name of the receipt image in the image store
    #[serde(default, alias = "imagePath")]
    pub image_reference: Option<String>,

    /// Serialized reminder configuration
    #[serde(default, alias = "notificationsConfig")]
    pub notification_config: Option<String>,

    /// Soft-delete flag
    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Current time at the millisecond precision items are persisted with
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

impl Item {
    /// Create a new, unsaved item
    pub fn new(
        item_type: ItemType,
        name: impl Into<String>,
        purchase_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: 0,
            item_type,
            name: name.into(),
            price: None,
            purchase_date: purchase_date.trunc_subsecs(3),
            expiry_date: expiry_date.trunc_subsecs(3),
            billing_frequency: None,
            image_reference: None,
            notification_config: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a subscription starting now and next charged on `next_billing`
    pub fn subscription(
        name: impl Into<String>,
        price: Option<f64>,
        frequency: BillingFrequency,
        next_billing: DateTime<Utc>,
    ) -> Self {
        let mut item = Self::new(ItemType::Subscription, name, now_millis(), next_billing);
        item.price = price;
        item.billing_frequency = Some(frequency);
        item
    }

    /// Create a warranty/receipt item
    pub fn warranty(
        name: impl Into<String>,
        purchase_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
        price: Option<f64>,
    ) -> Self {
        let mut item = Self::new(ItemType::Warranty, name, purchase_date, expiry_date);
        item.price = price;
        item
    }

    /// Refresh `updated_at` after a modification
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    /// Drop sub-millisecond precision from every timestamp
    ///
    /// Items are persisted with millisecond timestamps; a stored item equals
    /// the one read back only after this.
    pub fn truncate_timestamps(&mut self) {
        self.purchase_date = self.purchase_date.trunc_subsecs(3);
        self.expiry_date = self.expiry_date.trunc_subsecs(3);
        self.created_at = self.created_at.trunc_subsecs(3);
        self.updated_at = self.updated_at.trunc_subsecs(3);
    }

    /// Check if this is a subscription
    pub fn is_subscription(&self) -> bool {
        self.item_type == ItemType::Subscription
    }

    /// Check if this is a warranty/receipt
    pub fn is_warranty(&self) -> bool {
        self.item_type == ItemType::Warranty
    }

    /// The image reference, if one is set and not blank
    pub fn image(&self) -> Option<&str> {
        self.image_reference
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// Whole days from `now` until expiry (negative once expired)
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry_date - now).num_days()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.days_until_expiry(now) < 0
    }

    pub fn is_expiring_soon(&self, now: DateTime<Utc>) -> bool {
        (0..=EXPIRING_SOON_DAYS).contains(&self.days_until_expiry(now))
    }

    /// Coverage state for warranties
    pub fn warranty_status(&self, now: DateTime<Utc>) -> WarrantyStatus {
        let days = self.days_until_expiry(now);
        if days < 0 {
            WarrantyStatus::Expired
        } else if days <= WARRANTY_WARNING_DAYS {
            WarrantyStatus::ExpiringSoon
        } else {
            WarrantyStatus::Valid
        }
    }

    /// Elapsed fraction of the warranty period, clamped to 0.0..=1.0
    ///
    /// Subscriptions always report 0.0.
    pub fn warranty_progress(&self, now: DateTime<Utc>) -> f64 {
        if !self.is_warranty() {
            return 0.0;
        }

        let total_days = (self.expiry_date - self.purchase_date).num_days();
        if total_days <= 0 {
            return 1.0;
        }

        let elapsed_days = (now - self.purchase_date).num_days();
        (elapsed_days as f64 / total_days as f64).clamp(0.0, 1.0)
    }

    /// Price normalized to a monthly amount (0.0 for warranties or unpriced items)
    pub fn normalized_monthly_price(&self) -> f64 {
        let price = match (self.is_subscription(), self.price) {
            (true, Some(price)) => price,
            _ => return 0.0,
        };

        match self.billing_frequency {
            Some(BillingFrequency::Monthly) => price,
            Some(BillingFrequency::Annual) => price / MONTHS_IN_YEAR,
            Some(BillingFrequency::Weekly) => price * WEEKS_IN_MONTH,
            None => 0.0,
        }
    }

    /// The charge after the one recorded in `expiry_date`
    pub fn next_billing_date(&self) -> Option<DateTime<Utc>> {
        if !self.is_subscription() {
            return None;
        }

        match self.billing_frequency? {
            BillingFrequency::Weekly => self.expiry_date.checked_add_signed(Duration::weeks(1)),
            BillingFrequency::Monthly => self.expiry_date.checked_add_months(Months::new(1)),
            BillingFrequency::Annual => self.expiry_date.checked_add_months(Months::new(12)),
        }
    }

    /// All rule violations, in a stable order
    pub fn validation_errors(&self) -> Vec<ItemValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ItemValidationError::EmptyName);
        }

        if self.purchase_date.timestamp_millis() <= 0 {
            errors.push(ItemValidationError::MissingPurchaseDate);
        }

        if self.expiry_date.timestamp_millis() <= 0 {
            errors.push(ItemValidationError::MissingExpiryDate);
        }

        if self.expiry_date <= self.purchase_date {
            errors.push(ItemValidationError::ExpiryNotAfterPurchase);
        }

        if self.is_subscription() && self.billing_frequency.is_none() {
            errors.push(ItemValidationError::MissingBillingFrequency);
        }

        if let Some(price) = self.price {
            if !price.is_finite() {
                errors.push(ItemValidationError::NonFinitePrice);
            } else if price < 0.0 {
                errors.push(ItemValidationError::NegativePrice);
            }
        }

        if let Some(reference) = self.image() {
            if validate_image_reference(reference).is_err() {
                errors.push(ItemValidationError::UnsafeImageReference(reference.to_string()));
            }
        }

        errors
    }

    /// Validate the item, reporting the first rule it breaks
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyName,
    MissingPurchaseDate,
    MissingExpiryDate,
    ExpiryNotAfterPurchase,
    MissingBillingFrequency,
    NegativePrice,
    NonFinitePrice,
    UnsafeImageReference(String),
}

impl fmt::Display for ItemValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Item name cannot be empty"),
            Self::MissingPurchaseDate => write!(f, "Purchase date is required"),
            Self::MissingExpiryDate => write!(f, "Expiry date is required"),
            Self::ExpiryNotAfterPurchase => {
                write!(f, "Expiry date must be after the purchase date")
            }
            Self::MissingBillingFrequency => {
                write!(f, "Billing frequency is required for subscriptions")
            }
            Self::NegativePrice => write!(f, "Price cannot be negative"),
            Self::NonFinitePrice => write!(f, "Price must be a finite number"),
            Self::UnsafeImageReference(name) => {
                write!(f, "Image reference '{}' is not a plain file name", name)
            }
        }
    }
}

impl std::error::Error for ItemValidationError {}

//! Item CLI commands
//!
//! Implements CLI commands for managing subscriptions and warranties.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Months, NaiveDate, TimeZone, Utc};
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{
    format_catalog_summary, format_item_details, format_item_list, format_purge_report,
};
use crate::error::{ExpireError, ExpireResult};
use crate::models::{now_millis, BillingFrequency, Item};
use crate::services::{ItemFilter, ItemService, ItemUpdate, DEFAULT_PURGE_AGE_DAYS};
use crate::storage::Storage;

/// Item subcommands
#[derive(Subcommand)]
pub enum ItemCommands {
    /// Track a new subscription
    AddSubscription {
        /// Subscription name
        name: String,
        /// Price per billing period
        #[arg(short, long)]
        price: Option<f64>,
        /// Billing frequency (weekly, monthly, annual)
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
        /// Next charge date (YYYY-MM-DD), defaults to one period from today
        #[arg(short, long)]
        next: Option<String>,
    },
    /// Track a new warranty or receipt
    AddWarranty {
        /// Product name
        name: String,
        /// Purchase price
        #[arg(short, long)]
        price: Option<f64>,
        /// Purchase date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        purchased: Option<String>,
        /// Warranty end date (YYYY-MM-DD)
        #[arg(short, long, conflicts_with = "months")]
        expires: Option<String>,
        /// Warranty length in months
        #[arg(short, long)]
        months: Option<u32>,
        /// Receipt image to attach
        #[arg(short, long)]
        receipt: Option<PathBuf>,
    },
    /// List items
    List {
        /// Include inactive items
        #[arg(short, long)]
        all: bool,
        /// Only subscriptions or only warranties
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,
        /// Filter by name
        #[arg(short, long)]
        search: Option<String>,
        /// Only items expiring within this many days
        #[arg(short, long)]
        expiring: Option<i64>,
    },
    /// Show item details
    Show {
        /// Item name or ID
        item: String,
    },
    /// Edit an item
    Edit {
        /// Item name or ID
        item: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New price
        #[arg(short, long, conflicts_with = "clear_price")]
        price: Option<f64>,
        /// Remove the price
        #[arg(long)]
        clear_price: bool,
        /// New purchase or start date (YYYY-MM-DD)
        #[arg(long)]
        purchased: Option<String>,
        /// New expiry or next charge date (YYYY-MM-DD)
        #[arg(short, long)]
        expires: Option<String>,
        /// New billing frequency
        #[arg(short, long)]
        frequency: Option<String>,
        /// Receipt image to attach
        #[arg(short, long)]
        receipt: Option<PathBuf>,
    },
    /// Delete an item and its receipt image
    Remove {
        /// Item name or ID
        item: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Mark an item as active
    Activate {
        /// Item name or ID
        item: String,
    },
    /// Mark an item as inactive
    Deactivate {
        /// Item name or ID
        item: String,
    },
    /// Show catalog totals
    Summary,
    /// Permanently delete inactive items that have not changed in a while
    Purge {
        /// Minimum days since the item was last changed
        #[arg(short, long, default_value_t = DEFAULT_PURGE_AGE_DAYS)]
        days: i64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle an item command
pub fn handle_item_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ItemCommands,
) -> ExpireResult<()> {
    let service = ItemService::new(storage);
    let now = Utc::now();

    match cmd {
        ItemCommands::AddSubscription {
            name,
            price,
            frequency,
            next,
        } => {
            let frequency = parse_frequency(&frequency)?;
            let start = now_millis();

            let mut item = Item::subscription(name, price, frequency, start);
            item.expiry_date = match next {
                Some(date) => parse_date(&date)?,
                None => item.next_billing_date().unwrap_or(start),
            };
            item.notification_config = Some(settings.notifications.to_item_config());

            let item = service.create(item)?;
            println!("Added subscription: {} (ID: {})", item.name, item.id);
            println!(
                "  Next charge: {}",
                item.expiry_date.format(&settings.date_format)
            );
        }

        ItemCommands::AddWarranty {
            name,
            price,
            purchased,
            expires,
            months,
            receipt,
        } => {
            let purchase_date = match purchased {
                Some(date) => parse_date(&date)?,
                None => now_millis(),
            };
            let expiry_date = match (expires, months) {
                (Some(date), _) => parse_date(&date)?,
                (None, Some(months)) => purchase_date
                    .checked_add_months(Months::new(months))
                    .ok_or_else(|| ExpireError::Validation("Warranty length out of range".into()))?,
                (None, None) => {
                    return Err(ExpireError::Validation(
                        "Provide the warranty end with --expires or --months".into(),
                    ))
                }
            };

            let mut item = Item::warranty(name, purchase_date, expiry_date, price);
            item.notification_config = Some(settings.notifications.to_item_config());

            let mut item = service.create(item)?;
            if let Some(path) = receipt {
                item = service.attach_image(item.id, &path)?;
            }

            println!("Added warranty: {} (ID: {})", item.name, item.id);
            println!(
                "  Covered until: {}",
                item.expiry_date.format(&settings.date_format)
            );
            if let Some(image) = item.image() {
                println!("  Receipt: {}", image);
            }
        }

        ItemCommands::List {
            all,
            item_type,
            search,
            expiring,
        } => {
            let items = if let Some(query) = search {
                service.search(&query)?
            } else if let Some(days) = expiring {
                service.expiring_within(now, days)?
            } else {
                let filter = match item_type.as_deref().map(str::to_lowercase).as_deref() {
                    Some("subscription") | Some("subscriptions") => ItemFilter::Subscriptions,
                    Some("warranty") | Some("warranties") => ItemFilter::Warranties,
                    Some(other) => {
                        return Err(ExpireError::Validation(format!(
                            "Unknown item type '{}'. Use subscriptions or warranties",
                            other
                        )))
                    }
                    None if all => ItemFilter::All,
                    None => ItemFilter::Active,
                };
                service.list(filter)?
            };

            print!("{}", format_item_list(&items, settings, now));
            if items.is_empty() {
                println!();
            }
        }

        ItemCommands::Show { item } => {
            let item = find_item(&service, &item)?;
            print!("{}", format_item_details(&item, settings, now));
        }

        ItemCommands::Edit {
            item,
            name,
            price,
            clear_price,
            purchased,
            expires,
            frequency,
            receipt,
        } => {
            let existing = find_item(&service, &item)?;

            let changes = ItemUpdate {
                name,
                price,
                clear_price,
                purchase_date: purchased.as_deref().map(parse_date).transpose()?,
                expiry_date: expires.as_deref().map(parse_date).transpose()?,
                billing_frequency: frequency.as_deref().map(parse_frequency).transpose()?,
                notification_config: None,
            };

            if changes.is_empty() && receipt.is_none() {
                println!("No changes specified.");
                return Ok(());
            }

            let mut updated = existing;
            if !changes.is_empty() {
                updated = service.update(updated.id, changes)?;
            }
            if let Some(path) = receipt {
                updated = service.attach_image(updated.id, &path)?;
            }

            println!("Updated: {} (ID: {})", updated.name, updated.id);
        }

        ItemCommands::Remove { item, force } => {
            let item = find_item(&service, &item)?;

            if !force {
                println!("This will permanently delete '{}' and its receipt image.", item.name);
                println!("To proceed, run again with --force flag:");
                println!("  ksexpire item remove {} --force", item.id);
                return Ok(());
            }

            let removed = service.delete(item.id)?;
            println!("Deleted: {}", removed.name);
        }

        ItemCommands::Activate { item } => {
            let item = find_item(&service, &item)?;
            let item = service.set_active(item.id, true)?;
            println!("Activated: {}", item.name);
        }

        ItemCommands::Deactivate { item } => {
            let item = find_item(&service, &item)?;
            let item = service.set_active(item.id, false)?;
            println!("Deactivated: {}", item.name);
        }

        ItemCommands::Summary => {
            let summary = service.summary(now)?;
            print!("{}", format_catalog_summary(&summary, settings));
        }

        ItemCommands::Purge { days, force } => {
            let older_than = Duration::try_days(days)
                .filter(|d| *d >= Duration::zero())
                .ok_or_else(|| ExpireError::Validation(format!("Invalid purge age: {}", days)))?;

            if !force {
                let stale = service.stale_inactive(now, older_than)?;
                if stale.is_empty() {
                    println!("No inactive items older than {} day(s).", days);
                    return Ok(());
                }
                println!("This will permanently delete {} inactive item(s):", stale.len());
                for item in &stale {
                    println!("  {} (ID: {})", item.name, item.id);
                }
                println!("To proceed, run again with --force flag:");
                println!("  ksexpire item purge --days {} --force", days);
                return Ok(());
            }

            let report = service.purge_inactive(now, older_than)?;
            print!("{}", format_purge_report(&report));
        }
    }

    Ok(())
}

fn find_item(service: &ItemService, identifier: &str) -> ExpireResult<Item> {
    service
        .find(identifier)?
        .ok_or_else(|| ExpireError::item_not_found(identifier))
}

fn parse_frequency(s: &str) -> ExpireResult<BillingFrequency> {
    BillingFrequency::parse(s).ok_or_else(|| {
        ExpireError::Validation(format!(
            "Invalid billing frequency '{}'. Use weekly, monthly or annual",
            s
        ))
    })
}

/// Parse a YYYY-MM-DD date as midnight UTC
fn parse_date(s: &str) -> ExpireResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        ExpireError::Validation(format!("Invalid date format: {}. Use YYYY-MM-DD", s))
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ExpireError::Validation(format!("Invalid date: {}", s)))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

//! Item display formatting
//!
//! Formats subscriptions and warranties for terminal output in table and
//! detail views.

use chrono::{DateTime, Utc};

use crate::config::settings::Settings;
use crate::models::{Item, WarrantyStatus};
use crate::services::{CatalogSummary, PurgeReport};

use super::backup::format_size;

fn format_price(settings: &Settings, price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{}{:.2}", settings.currency_symbol, p),
        None => "-".to_string(),
    }
}

/// Short status label for an item at `now`
pub fn status_label(item: &Item, now: DateTime<Utc>) -> String {
    if !item.is_active {
        return "Inactive".to_string();
    }

    let days = item.days_until_expiry(now);
    if item.is_warranty() {
        return match item.warranty_status(now) {
            WarrantyStatus::Expired => "Expired".to_string(),
            WarrantyStatus::ExpiringSoon => format!("{} days left", days),
            WarrantyStatus::Valid => "Valid".to_string(),
        };
    }

    match days {
        d if d < 0 => "Overdue".to_string(),
        0 => "Renews today".to_string(),
        1 => "Renews tomorrow".to_string(),
        d => format!("Renews in {} days", d),
    }
}

/// Format a list of items as a table
pub fn format_item_list(items: &[Item], settings: &Settings, now: DateTime<Utc>) -> String {
    if items.is_empty() {
        return "No items found.".to_string();
    }

    let name_width = items
        .iter()
        .map(|i| i.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>4}  {:<name_width$}  {:<12}  {:>10}  {:<10}  {}\n",
        "ID",
        "Name",
        "Type",
        "Price",
        "Expires",
        "Status",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:->4}  {:-<name_width$}  {:-<12}  {:->10}  {:-<10}  {:-<16}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for item in items {
        let kind = match item.billing_frequency {
            Some(frequency) if item.is_subscription() => {
                format!("{}", frequency).to_lowercase()
            }
            _ => item.item_type.to_string().to_lowercase(),
        };

        output.push_str(&format!(
            "{:>4}  {:<name_width$}  {:<12}  {:>10}  {:<10}  {}\n",
            item.id,
            item.name,
            kind,
            format_price(settings, item.price),
            item.expiry_date.format(&settings.date_format),
            status_label(item, now),
            name_width = name_width,
        ));
    }

    output
}

/// Format a single item's details
pub fn format_item_details(item: &Item, settings: &Settings, now: DateTime<Utc>) -> String {
    let date = |d: DateTime<Utc>| d.format(&settings.date_format).to_string();

    let mut output = String::new();
    output.push_str(&format!("{}: {}\n", item.item_type, item.name));
    output.push_str(&format!("  ID:            {}\n", item.id));
    output.push_str(&format!("  Price:         {}\n", format_price(settings, item.price)));
    output.push_str(&format!(
        "  Active:        {}\n",
        if item.is_active { "Yes" } else { "No" }
    ));
    output.push_str(&format!("  Status:        {}\n", status_label(item, now)));
    output.push('\n');

    if item.is_subscription() {
        if let Some(frequency) = item.billing_frequency {
            output.push_str(&format!("  Billing:       {}\n", frequency));
        }
        output.push_str(&format!("  Started:       {}\n", date(item.purchase_date)));
        output.push_str(&format!("  Next charge:   {}\n", date(item.expiry_date)));
        if let Some(next) = item.next_billing_date() {
            output.push_str(&format!("  Following:     {}\n", date(next)));
        }
        output.push_str(&format!(
            "  Per month:     {}\n",
            format_price(settings, Some(item.normalized_monthly_price()))
        ));
    } else {
        output.push_str(&format!("  Purchased:     {}\n", date(item.purchase_date)));
        output.push_str(&format!("  Warranty ends: {}\n", date(item.expiry_date)));
        output.push_str(&format!(
            "  Elapsed:       {:.0}%\n",
            item.warranty_progress(now) * 100.0
        ));
    }

    if let Some(image) = item.image() {
        output.push_str(&format!("  Receipt:       {}\n", image));
    }
    if let Some(config) = &item.notification_config {
        output.push_str(&format!("  Reminders:     {}\n", config));
    }

    output
}

/// Format catalog totals
pub fn format_catalog_summary(summary: &CatalogSummary, settings: &Settings) -> String {
    let mut output = String::new();
    output.push_str("Catalog Summary\n");
    output.push_str("===============\n");
    output.push_str(&format!(
        "  Items:          {} ({} active)\n",
        summary.total, summary.active
    ));
    output.push_str(&format!("  Subscriptions:  {}\n", summary.subscriptions));
    output.push_str(&format!("  Warranties:     {}\n", summary.warranties));
    output.push_str(&format!(
        "  Monthly spend:  {}\n",
        format_price(settings, Some(summary.monthly_spend))
    ));
    output.push_str(&format!("  Expiring soon:  {}\n", summary.expiring_soon));
    output.push_str(&format!("  Expired:        {}\n", summary.expired));
    output
}

/// Format the outcome of purging inactive items
pub fn format_purge_report(report: &PurgeReport) -> String {
    let mut output = String::new();
    if report.purged.is_empty() {
        output.push_str("No inactive items to purge.\n");
    } else {
        output.push_str(&format!("Purged {} inactive item(s):\n", report.purged.len()));
        for item in &report.purged {
            output.push_str(&format!("  {} (ID: {})\n", item.name, item.id));
        }
    }
    output.push_str(&format!(
        "Items remaining: {} ({} on disk)\n",
        report.items_remaining,
        format_size(report.storage_bytes)
    ));
    output
}

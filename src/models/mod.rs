//! Core data models for ksexpire
//!
//! This module contains the data structures of the tracking domain: items
//! (subscriptions and warranties) and the image references that attach
//! receipt photos to them.

pub mod image;
pub mod item;

pub use image::{validate_image_reference, ImageReferenceError};
pub use item::{
    now_millis, BillingFrequency, Item, ItemType, ItemValidationError, WarrantyStatus,
};

//! # desk-core
//!
//! Core types and error types for AppDesk.
//!
//! This crate provides the foundational types shared across all AppDesk crates:
//! - The authenticated principal (`Identity`)
//! - App records managed through the admin API
//! - Cross-cutting error types

pub mod apps;
pub mod errors;
pub mod identity;

pub use apps::{AppList, AppRecord};
pub use identity::Identity;

//! Loyalty Core - Shared domain types.
//!
//! This crate provides the types shared by every loyalty component:
//! - `api` - The member-facing JSON API
//! - `cli` - Command-line tools for migrations, users and demo data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Database encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails and status enums
//! - [`password`] - Password strength estimation
//! - [`geo`] - Great-circle distance for the store locator
//! - [`tier`] - Membership tier thresholds and point multipliers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod geo;
pub mod password;
pub mod tier;
pub mod types;

pub use geo::{Coordinates, GeoError, calculate_distance};
pub use password::{PasswordStrength, StrengthReport};
pub use tier::{TierProgress, TierRule};
pub use types::*;

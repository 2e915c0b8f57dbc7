//! Parcelflow Core - Shared types library.
//!
//! This crate provides common types used across all Parcelflow components:
//! - `client` - Typed, cache-aware REST API client
//! - `dashboard` - Headless page controllers and route guards
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no cache
//! state. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Domain entities, status enums, and the API response envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

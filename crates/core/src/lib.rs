//! Perche Core - Shared types library.
//!
//! This crate provides common types used across all Perche components:
//! - `server` - Admin API (auth, users, organizations, SDK wizard, billing)
//! - `pipeline` - Workflow worker (crawl, map, embed, package, deploy)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, platforms,
//!   statuses, and field mappings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

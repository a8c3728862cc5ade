//! Catalog Core - Shared types library.
//!
//! This crate provides the types shared by the catalog components:
//! - `web` - Server-rendered catalog frontend
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The backend's
//! wire format (camelCase JSON, prices as numbers) is encoded here so every
//! consumer agrees on it.
//!
//! # Modules
//!
//! - [`types`] - Product records, prices, pagination, and type-safe IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

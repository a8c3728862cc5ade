//! Product catalog web frontend library.
//!
//! This crate provides the catalog frontend as a library, allowing it to be
//! tested and reused. The `catalog-web` binary wires it to configuration,
//! tracing, and Sentry.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod uploads;

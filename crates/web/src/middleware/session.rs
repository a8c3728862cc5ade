//! Session middleware configuration.
//!
//! Sessions are kept in memory: they only hold form drafts and products the
//! visitor has already seen, all of which can be rebuilt.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::CatalogConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "catalog_session";

/// Session expiry time in seconds (1 day).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &CatalogConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

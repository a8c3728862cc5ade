//! Session-held view state.
//!
//! Each visitor's form drafts and the products they have already seen live in
//! their session. Entries that fail to deserialize are treated as absent.

use catalog_core::{Product, ProductId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use crate::forms::{BulkForm, ProductForm};

/// Session keys for catalog view state.
pub mod keys {
    /// Key for the single-product form draft.
    pub const PRODUCT_FORM: &str = "product_form";

    /// Key for the bulk-upload form draft.
    pub const BULK_FORM: &str = "bulk_form";

    /// Prefix of cached product entries, followed by the product ID.
    pub const PRODUCT_PREFIX: &str = "product_";

    /// IDs of the cached products, oldest first.
    pub const CACHED_PRODUCTS: &str = "cached_products";
}

/// Most products one session caches; the oldest are evicted first.
pub const MAX_CACHED_PRODUCTS: usize = 48;

/// Session key a product is cached under.
#[must_use]
pub fn product_cache_key(id: &ProductId) -> String {
    format!("{}{id}", keys::PRODUCT_PREFIX)
}

async fn load_or_default<T>(session: &Session, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match session.get::<T>(key).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable session entry");
            T::default()
        }
    }
}

async fn store<T: Serialize>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(key, value).await
}

// =============================================================================
// Form Drafts
// =============================================================================

/// Load the single-product draft, or an empty form.
pub async fn load_product_form(session: &Session) -> ProductForm {
    load_or_default(session, keys::PRODUCT_FORM).await
}

/// Save the single-product draft.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn save_product_form(
    session: &Session,
    form: &ProductForm,
) -> Result<(), tower_sessions::session::Error> {
    store(session, keys::PRODUCT_FORM, form).await
}

/// Load the bulk draft, or a form with one empty row.
pub async fn load_bulk_form(session: &Session) -> BulkForm {
    load_or_default(session, keys::BULK_FORM).await
}

/// Save the bulk draft.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn save_bulk_form(
    session: &Session,
    form: &BulkForm,
) -> Result<(), tower_sessions::session::Error> {
    store(session, keys::BULK_FORM, form).await
}

// =============================================================================
// Product Cache
// =============================================================================

/// A product this visitor has already seen, if cached.
///
/// Malformed entries are ignored and the caller falls back to the backend.
pub async fn cached_product(session: &Session, id: &ProductId) -> Option<Product> {
    let key = product_cache_key(id);
    match session.get::<Product>(&key).await {
        Ok(product) => product.filter(|product| &product.id == id),
        Err(e) => {
            tracing::debug!(key, error = %e, "Ignoring malformed cached product");
            None
        }
    }
}

/// Cache products for later detail views.
///
/// Products cached again move to the newest end. Beyond
/// [`MAX_CACHED_PRODUCTS`] the oldest entries are removed, though never any
/// of `products` itself.
///
/// # Errors
///
/// Returns the first error from the session store.
pub async fn cache_products(
    session: &Session,
    products: &[Product],
) -> Result<(), tower_sessions::session::Error> {
    if products.is_empty() {
        return Ok(());
    }

    let mut cached: Vec<ProductId> = load_or_default(session, keys::CACHED_PRODUCTS).await;
    for product in products {
        store(session, &product_cache_key(&product.id), product).await?;
        cached.retain(|id| id != &product.id);
        cached.push(product.id.clone());
    }

    let excess = cached
        .len()
        .saturating_sub(MAX_CACHED_PRODUCTS.max(products.len()));
    for id in cached.drain(..excess) {
        session.remove_value(&product_cache_key(&id)).await?;
    }

    store(session, keys::CACHED_PRODUCTS, &cached).await
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError, ProductService};
use crate::config::CatalogConfig;
use crate::uploads::UploadTracker;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the backend client, and the upload jobs.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CatalogConfig,
    products: ProductService,
    uploads: UploadTracker,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: CatalogConfig) -> Result<Self, ApiError> {
        let products = ProductService::new(ApiClient::new(&config.api)?);
        let uploads = UploadTracker::new(config.upload_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                uploads,
            }),
        })
    }

    /// Get a reference to the catalog configuration.
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    /// Get a reference to the product service.
    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    /// Get a reference to the upload tracker.
    #[must_use]
    pub fn uploads(&self) -> &UploadTracker {
        &self.inner.uploads
    }
}

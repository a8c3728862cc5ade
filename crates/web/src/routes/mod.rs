//! HTTP route handlers for the catalog frontend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing (page 1)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Product listing (?page=N)
//! GET  /products/new           - New product form
//! POST /products/new           - New product form actions (multipart)
//! GET  /products/{id}          - Product detail (?image=N)
//!
//! # Bulk upload
//! GET  /bulk-upload            - Bulk form
//! POST /bulk-upload            - Bulk form actions (multipart)
//!
//! # Uploads
//! GET  /uploads/{id}           - Upload progress, applies the result
//! GET  /uploads/{id}/events    - Upload status (server-sent events)
//! POST /uploads/{id}/cancel    - Cancel an upload
//! ```

pub mod bulk;
pub mod product_form;
pub mod products;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use catalog_core::UploadId;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::forms::FlashMessage;
use crate::middleware::{create_session_layer, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

// =============================================================================
// Shared Views
// =============================================================================

/// One-shot message above a form.
#[derive(Clone)]
pub struct MessageView {
    pub class: &'static str,
    pub text: String,
}

impl From<FlashMessage> for MessageView {
    fn from(message: FlashMessage) -> Self {
        Self {
            class: message.kind.css_class(),
            text: message.text,
        }
    }
}

/// An upload a locked form is waiting on.
#[derive(Clone)]
pub struct UploadView {
    pub id: String,
    pub percent: u8,
}

impl UploadView {
    async fn load(state: &AppState, id: UploadId) -> Self {
        let percent = state
            .uploads()
            .status(id)
            .await
            .map_or(0, |(_, status)| status.percent());

        Self {
            id: id.to_string(),
            percent,
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/new", get(product_form::show).post(product_form::submit))
        .route("/{id}", get(products::show))
}

/// Create the upload routes router.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(uploads::show))
        .route("/{id}/events", get(uploads::events))
        .route("/{id}/cancel", post(uploads::cancel))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .nest("/products", product_routes())
        .route("/bulk-upload", get(bulk::show).post(bulk::submit))
        .nest("/uploads", upload_routes())
}

/// Build the complete application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let body_limit = DefaultBodyLimit::max(state.config().max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        // Top to bottom is outermost to innermost
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(request_id_middleware))
                .layer(session_layer)
                .layer(from_fn(security_headers_middleware))
                .layer(body_limit),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

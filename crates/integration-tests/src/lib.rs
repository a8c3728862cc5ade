//! Integration tests for the catalog frontend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-integration-tests
//! ```
//!
//! Each test starts its own [`FakeBackend`] and frontend on ephemeral ports,
//! so tests run in parallel without shared state. The fake backend records
//! every request it receives, which lets tests assert both what the visitor
//! sees and what reached the backend.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use catalog_core::{PaginatedResponse, Product, ProductId};
use catalog_web::config::CatalogConfig;
use catalog_web::routes;
use catalog_web::state::AppState;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::net::TcpListener;

/// Product name the fake backend rejects with a conflict.
pub const REJECTED_NAME: &str = "Duplicate";

/// Message the fake backend returns for a rejected product.
pub const REJECTED_MESSAGE: &str = "Product already exists";

/// Product name the fake backend holds for a long time before answering.
pub const SLOW_NAME: &str = "Slow";

/// A few bytes that pass as a PNG upload.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

// =============================================================================
// Fake Backend
// =============================================================================

/// A multipart upload as received by the fake backend.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    /// The parsed JSON part (`product` or `products`).
    pub metadata: serde_json::Value,
    /// File names of the `files` parts, in order.
    pub files: Vec<String>,
}

/// In-memory stand-in for the catalog REST API.
#[derive(Debug, Default)]
pub struct FakeBackend {
    products: Vec<Product>,
    list_requests: AtomicUsize,
    detail_requests: Mutex<HashMap<String, usize>>,
    created: Mutex<Vec<ReceivedUpload>>,
    bulk: Mutex<Vec<ReceivedUpload>>,
}

impl FakeBackend {
    /// A backend holding `count` products named `Product 1..=count`.
    #[must_use]
    pub fn with_products(count: usize) -> Self {
        let products = (1..=count)
            .map(|n| Product {
                id: ProductId::new(format!("p-{n}")),
                name: format!("Product {n}"),
                description: format!("Description {n}"),
                price: Decimal::new(1000 + i64::try_from(n).unwrap(), 2),
                image_urls: vec![
                    format!("https://cdn.test/p-{n}/1.png"),
                    format!("https://cdn.test/p-{n}/2.png"),
                ],
            })
            .collect();

        Self {
            products,
            ..Self::default()
        }
    }

    /// Number of listing requests received.
    pub fn list_requests(&self) -> usize {
        self.list_requests.load(Ordering::SeqCst)
    }

    /// Number of detail requests received for one product.
    pub fn detail_requests(&self, id: &str) -> usize {
        self.detail_requests
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Single-product uploads received.
    pub fn created(&self) -> Vec<ReceivedUpload> {
        self.created.lock().unwrap().clone()
    }

    /// Bulk uploads received.
    pub fn bulk_uploads(&self) -> Vec<ReceivedUpload> {
        self.bulk.lock().unwrap().clone()
    }

    fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/api/products", get(list_products))
            .route("/api/products/upload", post(create_product))
            .route("/api/products/bulk-upload", post(bulk_upload))
            .route("/api/products/{id}", get(get_product))
            .with_state(self)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: u32,
    page_size: u32,
}

async fn list_products(
    State(backend): State<Arc<FakeBackend>>,
    Query(query): Query<ListQuery>,
) -> Json<PaginatedResponse<Product>> {
    backend.list_requests.fetch_add(1, Ordering::SeqCst);

    let size = query.page_size.max(1) as usize;
    let total = backend.products.len();
    let data = backend
        .products
        .iter()
        .skip((query.page.max(1) as usize - 1) * size)
        .take(size)
        .cloned()
        .collect();

    Json(PaginatedResponse {
        data,
        total: total as u64,
        page: query.page,
        page_size: query.page_size,
        total_pages: u32::try_from(total.div_ceil(size)).unwrap(),
    })
}

async fn get_product(State(backend): State<Arc<FakeBackend>>, Path(id): Path<String>) -> Response {
    *backend
        .detail_requests
        .lock()
        .unwrap()
        .entry(id.clone())
        .or_default() += 1;

    match backend.products.iter().find(|p| p.id.as_str() == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": "Product not found" })),
        )
            .into_response(),
    }
}

async fn read_upload(mut multipart: Multipart, json_part: &str) -> ReceivedUpload {
    let mut metadata = serde_json::Value::Null;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let bytes = field.bytes().await.unwrap();

        if name == json_part {
            metadata = serde_json::from_slice(&bytes).unwrap();
        } else if name == "files" {
            files.push(file_name.unwrap_or_default());
        }
    }

    ReceivedUpload { metadata, files }
}

async fn create_product(State(backend): State<Arc<FakeBackend>>, multipart: Multipart) -> Response {
    let upload = read_upload(multipart, "product").await;
    let name = upload.metadata["name"].as_str().unwrap_or_default().to_string();

    if name == SLOW_NAME {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    if name == REJECTED_NAME {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "message": REJECTED_MESSAGE })),
        )
            .into_response();
    }

    let mut created = backend.created.lock().unwrap();
    let product = serde_json::json!({
        "id": format!("new-{}", created.len() + 1),
        "name": name,
        "description": upload.metadata["description"],
        "price": upload.metadata["price"],
        "imageUrls": upload
            .files
            .iter()
            .map(|file| format!("https://cdn.test/uploads/{file}"))
            .collect::<Vec<_>>(),
    });
    created.push(upload);

    (StatusCode::CREATED, Json(product)).into_response()
}

async fn bulk_upload(State(backend): State<Arc<FakeBackend>>, multipart: Multipart) -> Response {
    let upload = read_upload(multipart, "products").await;
    let count = upload.files.len();
    backend.bulk.lock().unwrap().push(upload);

    Json(serde_json::json!({ "created": count })).into_response()
}

// =============================================================================
// Test Context
// =============================================================================

/// A running frontend wired to its own fake backend.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub backend: Arc<FakeBackend>,
}

impl TestContext {
    /// Start a frontend over a backend with five products.
    pub async fn new() -> Self {
        Self::start(FakeBackend::with_products(5), &[]).await
    }

    /// Start a frontend over `backend`, with extra configuration variables.
    pub async fn start(backend: FakeBackend, vars: &[(&str, &str)]) -> Self {
        let backend = Arc::new(backend);
        let backend_addr = serve(Arc::clone(&backend).router()).await;

        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        env.entry("CATALOG_API_BASE".to_string())
            .or_insert_with(|| format!("http://{backend_addr}"));
        env.entry("CATALOG_REDIRECT_DELAY_MS".to_string())
            .or_insert_with(|| "0".to_string());

        let config = CatalogConfig::from_lookup(|key| env.get(key).cloned()).unwrap();
        let state = AppState::new(config).unwrap();
        let frontend_addr = serve(routes::app(state)).await;

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            client,
            base_url: format!("http://{frontend_addr}"),
            backend,
        }
    }

    /// Absolute URL of a frontend path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a frontend path without following redirects.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET a frontend path and return its body.
    pub async fn get_text(&self, path: &str) -> String {
        self.get(path).await.text().await.unwrap()
    }

    /// POST a multipart form to a frontend path.
    pub async fn post_form(&self, path: &str, form: Form) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    /// POST with an empty body.
    pub async fn post_empty(&self, path: &str) -> reqwest::Response {
        self.client.post(self.url(path)).send().await.unwrap()
    }

    /// Poll an upload's status page until it stops reporting progress.
    pub async fn wait_for_upload(&self, id: &str) -> UploadOutcome {
        for _ in 0..200 {
            let response = self.get(&format!("/uploads/{id}")).await;
            if response.status().is_redirection() {
                return UploadOutcome::Redirected(location(&response).unwrap_or_default());
            }
            assert_eq!(response.status(), StatusCode::OK, "upload {id} status page");

            let body = response.text().await.unwrap();
            if body.contains("data-redirect-to") {
                return UploadOutcome::Done(body);
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("upload {id} did not finish");
    }
}

/// How an upload's status page ended up.
#[derive(Debug)]
pub enum UploadOutcome {
    /// The success page, with its body.
    Done(String),
    /// Sent back to a form, with the redirect target.
    Redirected(String),
}

// =============================================================================
// Helpers
// =============================================================================

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A PNG file part.
#[must_use]
pub fn png(file_name: &str) -> Part {
    Part::bytes(PNG_BYTES.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .unwrap()
}

/// The product form as a multipart body.
#[must_use]
pub fn product_form(name: &str, description: &str, price: &str, action: &str) -> Form {
    Form::new()
        .text("name", name.to_string())
        .text("description", description.to_string())
        .text("price", price.to_string())
        .text("action", action.to_string())
}

/// The upload a rendered form page is waiting on.
#[must_use]
pub fn pending_upload_id(body: &str) -> Option<String> {
    attribute_values(body, "data-upload-id=\"").into_iter().next()
}

/// Row IDs of a rendered bulk form, in display order.
#[must_use]
pub fn bulk_row_ids(body: &str) -> Vec<String> {
    attribute_values(body, "name=\"name_")
}

fn attribute_values(body: &str, prefix: &str) -> Vec<String> {
    body.match_indices(prefix)
        .filter_map(|(start, _)| {
            let rest = body.get(start + prefix.len()..)?;
            rest.find('"').and_then(|end| rest.get(..end)).map(String::from)
        })
        .collect()
}

/// Location header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

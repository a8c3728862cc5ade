//! Product listing and detail handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog_core::{PageRequest, Pagination, Product, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::filters;
use crate::models::session;
use crate::state::AppState;

/// Product card data for the listing.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub thumbnail: Option<String>,
}

/// Product detail data.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: Option<String>,
    pub thumbnails: Vec<ThumbnailView>,
}

/// One entry of the thumbnail strip.
#[derive(Clone)]
pub struct ThumbnailView {
    pub index: usize,
    pub url: String,
    pub selected: bool,
}

/// Pagination controls.
#[derive(Clone)]
pub struct PaginationView {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: u32,
    pub next_page: u32,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            thumbnail: product.primary_image().map(String::from),
        }
    }
}

impl ProductView {
    /// Detail view with the image at `selected` shown large.
    ///
    /// An out-of-range index falls back to the primary image.
    #[must_use]
    pub fn new(product: &Product, selected: Option<usize>) -> Self {
        let selected = selected
            .filter(|index| *index < product.image_urls.len())
            .unwrap_or(0);

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image: product.image_urls.get(selected).cloned(),
            thumbnails: product
                .image_urls
                .iter()
                .enumerate()
                .map(|(index, url)| ThumbnailView {
                    index,
                    url: url.clone(),
                    selected: index == selected,
                })
                .collect(),
        }
    }
}

impl From<Pagination> for PaginationView {
    fn from(pagination: Pagination) -> Self {
        Self {
            current_page: pagination.current_page(),
            total_pages: pagination.total_pages(),
            has_previous: pagination.has_previous(),
            has_next: pagination.has_next(),
            previous_page: pagination.previous_page().unwrap_or(1),
            next_page: pagination
                .next_page()
                .unwrap_or_else(|| pagination.total_pages()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<String>,
}

impl ListingQuery {
    /// Requested page, 1-indexed. Missing or unreadable values mean page 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse::<i64>().ok())
            .map_or(1, |page| u32::try_from(page.max(1)).unwrap_or(u32::MAX))
    }
}

/// Detail query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub image: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
    pub error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Missing product page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub id: String,
}

/// Failed product lookup template.
#[derive(Template, WebTemplate)]
#[template(path = "products/error.html")]
pub struct ProductErrorTemplate {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display one page of the product listing.
///
/// Backend failures render the listing's error state rather than an error
/// page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> ProductsIndexTemplate {
    let request = PageRequest::new(query.page(), state.config().page_size);

    match state.products().get_products(request).await {
        Ok(page) => {
            if let Err(e) = session::cache_products(&session, &page.data).await {
                tracing::warn!("Failed to cache listed products: {e}");
            }

            ProductsIndexTemplate {
                products: page.data.iter().map(ProductCardView::from).collect(),
                pagination: page.pagination().into(),
                error: None,
            }
        }
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            ProductsIndexTemplate {
                products: Vec::new(),
                pagination: Pagination::new(request.page(), request.page()).into(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Display a product's detail page.
///
/// Products already seen in this session are served from the session cache
/// without contacting the backend.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let id = ProductId::new(id);
    let selected = query
        .image
        .as_deref()
        .and_then(|index| index.trim().parse::<usize>().ok());

    let product = if let Some(product) = session::cached_product(&session, &id).await {
        tracing::debug!(product_id = %id, "Serving product from session cache");
        product
    } else {
        match state.products().get_product_by_id(&id).await {
            Ok(product) => {
                if let Err(e) = session::cache_products(&session, std::slice::from_ref(&product)).await {
                    tracing::warn!("Failed to cache product {id}: {e}");
                }
                product
            }
            Err(ApiError::NotFound(_)) => {
                return (
                    StatusCode::NOT_FOUND,
                    ProductNotFoundTemplate { id: id.to_string() },
                )
                    .into_response();
            }
            Err(e) => {
                tracing::error!("Failed to fetch product {id}: {e}");
                return (
                    StatusCode::BAD_GATEWAY,
                    ProductErrorTemplate {
                        message: e.to_string(),
                    },
                )
                    .into_response();
            }
        }
    };

    ProductShowTemplate {
        product: ProductView::new(&product, selected),
    }
    .into_response()
}

//! Typed product operations on the catalog backend.

use catalog_core::{
    BulkUploadPayload, CreateProductPayload, PageRequest, PaginatedResponse, Product, ProductId,
};
use reqwest::StatusCode;
use reqwest::multipart::Form;
use tracing::{debug, instrument};

use super::progress::{ProgressCounter, total_bytes};
use super::{ApiClient, ApiError};

/// Product operations: listing, lookup, creation, and bulk upload.
#[derive(Clone)]
pub struct ProductService {
    client: ApiClient,
}

impl ProductService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Get one page of products.
    ///
    /// # Errors
    ///
    /// Propagates transport and HTTP errors.
    #[instrument(skip(self), fields(page = request.page(), page_size = request.page_size()))]
    pub async fn get_products(
        &self,
        request: PageRequest,
    ) -> Result<PaginatedResponse<Product>, ApiError> {
        let mut url = self.client.endpoint(&["products"])?;
        url.query_pairs_mut()
            .append_pair("page", &request.page().to_string())
            .append_pair("pageSize", &request.page_size().to_string());

        let page: PaginatedResponse<Product> = self.client.send_json(self.client.get(url)).await?;
        debug!(
            items = page.data.len(),
            total_pages = page.total_pages,
            "Fetched product page"
        );
        Ok(page)
    }

    /// Get a single product by its ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] on 404, otherwise propagates transport
    /// and HTTP errors.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product_by_id(&self, id: &ProductId) -> Result<Product, ApiError> {
        let url = self.client.endpoint(&["products", id.as_str()])?;

        match self.client.send_json(self.client.get(url)).await {
            Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                ..
            }) => Err(ApiError::NotFound(id.to_string())),
            other => other,
        }
    }

    /// Create a product with its images in one multipart request.
    ///
    /// The request carries a `product` part with the JSON metadata and one
    /// `files` part per image. `on_progress` receives upload percentages as
    /// the image bytes are sent. No validation happens here.
    ///
    /// # Errors
    ///
    /// Propagates transport and HTTP errors.
    #[instrument(skip(self, payload, on_progress), fields(name = %payload.name, images = payload.images.len()))]
    pub async fn create_product<F>(
        &self,
        payload: &CreateProductPayload,
        on_progress: F,
    ) -> Result<Product, ApiError>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let metadata = serde_json::to_string(&payload.metadata())?;
        let counter = ProgressCounter::new(total_bytes(&payload.images), on_progress);

        let mut form = Form::new().text("product", metadata);
        for image in &payload.images {
            form = form.part("files", counter.file_part(image)?);
        }

        let url = self.client.endpoint(&["products", "upload"])?;
        let product: Product = self
            .client
            .send_json(self.client.post(url).multipart(form))
            .await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Upload several products at once, one image per product.
    ///
    /// The request carries a `products` part with a JSON array of the entries
    /// and one `files` part per entry, in the same order. The response body
    /// is not interpreted: the batch either succeeds or fails as a whole.
    ///
    /// # Errors
    ///
    /// Propagates transport and HTTP errors.
    #[instrument(skip(self, payload, on_progress), fields(products = payload.len()))]
    pub async fn bulk_upload<F>(
        &self,
        payload: &BulkUploadPayload,
        on_progress: F,
    ) -> Result<(), ApiError>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let products = serde_json::to_string(payload.products())?;
        let counter = ProgressCounter::new(total_bytes(payload.files()), on_progress);

        let mut form = Form::new().text("products", products);
        for file in payload.files() {
            form = form.part("files", counter.file_part(file)?);
        }

        let url = self.client.endpoint(&["products", "bulk-upload"])?;
        self.client.send(self.client.post(url).multipart(form)).await?;

        tracing::info!(products = payload.len(), "Bulk upload accepted");
        Ok(())
    }
}

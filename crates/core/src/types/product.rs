//! Product records and the transient payloads used to create them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by the catalog backend.
///
/// Products are created by the backend on submission and are read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Ordered image URLs; the first one is the primary thumbnail.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl Product {
    /// The primary (thumbnail) image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// An in-memory image file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageFile {
    /// Create an image file.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Image bytes are omitted from debug output; they can be megabytes long.
impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// The JSON metadata sent alongside the images of a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductMetadata<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: Price,
}

/// Input for creating a single product.
///
/// Exists only for the duration of one submit action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductPayload {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<ImageFile>,
}

impl CreateProductPayload {
    /// The metadata part of the multipart request.
    #[must_use]
    pub fn metadata(&self) -> ProductMetadata<'_> {
        ProductMetadata {
            name: &self.name,
            description: &self.description,
            price: self.price,
        }
    }
}

/// One product entry of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkProductInput {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Input for a bulk upload: one file per product, in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkUploadPayload {
    products: Vec<BulkProductInput>,
    files: Vec<ImageFile>,
}

impl BulkUploadPayload {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a product together with its image.
    pub fn push(&mut self, product: BulkProductInput, file: ImageFile) {
        self.products.push(product);
        self.files.push(file);
    }

    /// Product entries in submission order.
    #[must_use]
    pub fn products(&self) -> &[BulkProductInput] {
        &self.products
    }

    /// Files in submission order, one per product.
    #[must_use]
    pub fn files(&self) -> &[ImageFile] {
        &self.files
    }

    /// Number of products in the payload.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the payload carries no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

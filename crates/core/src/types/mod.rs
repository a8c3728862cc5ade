//! Core types for the product catalog.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod id;
pub mod page;
pub mod price;
pub mod product;

pub use id::{ProductId, RowId, UploadId};
pub use page::{PageRequest, PaginatedResponse, Pagination};
pub use price::{Price, PriceError};
pub use product::{
    BulkProductInput, BulkUploadPayload, CreateProductPayload, ImageFile, Product, ProductMetadata,
};

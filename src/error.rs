use crate::domain::cart::SessionId;
use crate::domain::catalog::{CategoryId, PageId, ProductId, StockShortfall};
use crate::domain::checkout::CheckoutState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
    #[error("Out of stock: {product_id} requested {requested}, available {available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Line item not found: {0}")]
    LineItemNotFound(ProductId),
    #[error("Insufficient stock for {} line item(s)", .0.len())]
    InsufficientStock(Vec<StockShortfall>),
    #[error("Invalid checkout transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: CheckoutState,
        to: CheckoutState,
    },
    #[error("Cart for session {0} changed after checkout was submitted")]
    CartChanged(SessionId),
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),
    #[error("No category with slug: {0}")]
    CategorySlugNotFound(String),
    #[error("Page not found: {0}")]
    PageNotFound(PageId),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, StoreError>;

use super::cart::{Cart, SessionId};
use super::catalog::{
    Category, CategoryId, Page, PageId, Product, ProductId, ProductUpdate, StockReservation,
};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence for products, categories and pages, shared by every session.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn put_product(&self, product: Product) -> Result<()>;
    /// Applies `update` to the stored product in one step with respect to
    /// stock decrements, and returns the result. Fails with
    /// `StoreError::ProductNotFound` when the product does not exist.
    async fn update_product(&self, id: &ProductId, update: &ProductUpdate) -> Result<Product>;
    /// Returns whether a product was deleted.
    async fn delete_product(&self, id: &ProductId) -> Result<bool>;

    /// Takes stock for every reservation, or for none of them.
    ///
    /// The check and the decrement happen as one step per call: concurrent
    /// callers can never both take the last unit. Fails with
    /// `StoreError::InsufficientStock` listing every reservation that cannot be
    /// met; a missing product counts as zero stock.
    async fn decrement_stock_all(&self, reservations: &[StockReservation]) -> Result<()>;

    /// Conditionally takes `amount` units of one product.
    async fn decrement_stock(&self, id: &ProductId, amount: u32) -> Result<()> {
        self.decrement_stock_all(&[StockReservation {
            product_id: id.clone(),
            quantity: amount,
        }])
        .await
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn put_category(&self, category: Category) -> Result<()>;
    async fn delete_category(&self, id: &CategoryId) -> Result<bool>;

    async fn get_page(&self, id: &PageId) -> Result<Option<Page>>;
    /// Pages ordered by `sorting`.
    async fn list_pages(&self) -> Result<Vec<Page>>;
    async fn put_page(&self, page: Page) -> Result<()>;
    async fn delete_page(&self, id: &PageId) -> Result<bool>;
}

/// Session-scoped cart persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session's cart, or an empty one if the session has none.
    async fn load_cart(&self, session_id: &SessionId) -> Result<Cart>;
    async fn save_cart(&self, cart: Cart) -> Result<()>;
    async fn remove_cart(&self, session_id: &SessionId) -> Result<()>;
}

pub type CatalogStoreRef = Arc<dyn CatalogStore>;
pub type SessionStoreRef = Arc<dyn SessionStore>;

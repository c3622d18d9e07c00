use crate::config::Settings;
use crate::domain::cart::{Cart, SessionId};
use crate::domain::catalog::{
    Category, CategoryId, Page, PageId, Product, ProductId, ProductUpdate, StockReservation,
    StockShortfall,
    merge_reservations,
};
use crate::domain::ports::{CatalogStore, SessionStore};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use moka::future::Cache;
use moka::notification::RemovalCause;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Default)]
struct CatalogData {
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
    pages: HashMap<PageId, Page>,
}

/// A thread-safe in-memory catalog.
///
/// All entities live behind one `RwLock`, so a multi-product stock decrement
/// checks and applies every line under a single write guard.
#[derive(Default, Clone)]
pub struct InMemoryCatalogStore {
    data: Arc<RwLock<CatalogData>>,
}

impl InMemoryCatalogStore {
    /// Creates a new, empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let data = self.data.read().await;
        Ok(data.products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let data = self.data.read().await;
        let mut products: Vec<Product> = data.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        let mut data = self.data.write().await;
        data.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn update_product(&self, id: &ProductId, update: &ProductUpdate) -> Result<Product> {
        let mut data = self.data.write().await;
        let product = data
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))?;
        update.apply_to(product);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> {
        let mut data = self.data.write().await;
        Ok(data.products.remove(id).is_some())
    }

    async fn decrement_stock_all(&self, reservations: &[StockReservation]) -> Result<()> {
        let reservations = merge_reservations(reservations);
        let mut data = self.data.write().await;

        let shortfalls: Vec<StockShortfall> = reservations
            .iter()
            .filter_map(|r| {
                let available = data.products.get(&r.product_id).map_or(0, |p| p.stock);
                (available < r.quantity).then(|| StockShortfall {
                    product_id: r.product_id.clone(),
                    requested: r.quantity,
                    available,
                })
            })
            .collect();
        if !shortfalls.is_empty() {
            return Err(StoreError::InsufficientStock(shortfalls));
        }

        for r in &reservations {
            if let Some(product) = data.products.get_mut(&r.product_id) {
                product.stock -= r.quantity;
            }
        }
        Ok(())
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        let data = self.data.read().await;
        Ok(data.categories.get(id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let data = self.data.read().await;
        let mut categories: Vec<Category> = data.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(categories)
    }

    async fn put_category(&self, category: Category) -> Result<()> {
        let mut data = self.data.write().await;
        data.categories.insert(category.id.clone(), category);
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<bool> {
        let mut data = self.data.write().await;
        Ok(data.categories.remove(id).is_some())
    }

    async fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        let data = self.data.read().await;
        Ok(data.pages.get(id).cloned())
    }

    async fn list_pages(&self) -> Result<Vec<Page>> {
        let data = self.data.read().await;
        let mut pages: Vec<Page> = data.pages.values().cloned().collect();
        pages.sort_by(|a, b| a.sorting.cmp(&b.sorting).then_with(|| a.slug.cmp(&b.slug)));
        Ok(pages)
    }

    async fn put_page(&self, page: Page) -> Result<()> {
        let mut data = self.data.write().await;
        data.pages.insert(page.id.clone(), page);
        Ok(())
    }

    async fn delete_page(&self, id: &PageId) -> Result<bool> {
        let mut data = self.data.write().await;
        Ok(data.pages.remove(id).is_some())
    }
}

/// Cart storage keyed by session.
///
/// Backed by a `moka` cache: a session untouched for the idle timeout expires
/// together with its cart. Past `max_sessions` the cache evicts live carts as
/// well; each such eviction is logged as a warning so an undersized capacity
/// shows up in the logs instead of as silently emptied carts.
#[derive(Clone)]
pub struct InMemorySessionStore {
    carts: Cache<SessionId, Cart>,
}

impl InMemorySessionStore {
    pub fn new(idle_timeout: Duration, max_sessions: u64) -> Self {
        let carts = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_timeout)
            .eviction_listener(|session: Arc<SessionId>, cart: Cart, cause| {
                if matches!(cause, RemovalCause::Size) {
                    warn!(
                        session = %session,
                        items = cart.item_count(),
                        "Session cart evicted at capacity"
                    );
                }
            })
            .build();
        Self { carts }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.session_idle_timeout, settings.session_capacity)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_cart(&self, session_id: &SessionId) -> Result<Cart> {
        Ok(self
            .carts
            .get(session_id)
            .await
            .unwrap_or_else(|| Cart::new(session_id.clone())))
    }

    async fn save_cart(&self, cart: Cart) -> Result<()> {
        self.carts.insert(cart.session_id().clone(), cart).await;
        Ok(())
    }

    async fn remove_cart(&self, session_id: &SessionId) -> Result<()> {
        self.carts.invalidate(session_id).await;
        Ok(())
    }
}

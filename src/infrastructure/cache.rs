//! Read-through cache for storefront navigation.
//!
//! Every storefront page renders the category and page menus, so these lists
//! are served from a `moka` cache with a TTL. Writes that go through the
//! decorator invalidate the affected list at once. Product reads always hit the
//! underlying store because carts and checkout need live price and stock.

use crate::domain::catalog::{
    Category, CategoryId, Page, PageId, Product, ProductId, ProductUpdate, StockReservation,
};
use crate::domain::ports::{CatalogStore, CatalogStoreRef};
use crate::error::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const CATEGORIES_KEY: &str = "categories";
const PAGES_KEY: &str = "pages";

#[derive(Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Pages(Arc<Vec<Page>>),
}

/// `CatalogStore` decorator caching category and page listings.
#[derive(Clone)]
pub struct CachedCatalogStore {
    inner: CatalogStoreRef,
    cache: Cache<&'static str, CacheValue>,
}

impl CachedCatalogStore {
    pub fn new(inner: CatalogStoreRef, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self { inner, cache }
    }
}

#[async_trait]
impl CatalogStore for CachedCatalogStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        self.inner.list_products().await
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        self.inner.put_product(product).await
    }

    async fn update_product(&self, id: &ProductId, update: &ProductUpdate) -> Result<Product> {
        self.inner.update_product(id, update).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> {
        self.inner.delete_product(id).await
    }

    async fn decrement_stock_all(&self, reservations: &[StockReservation]) -> Result<()> {
        self.inner.decrement_stock_all(reservations).await
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        self.inner.get_category(id).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(CATEGORIES_KEY).await {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let categories = self.inner.list_categories().await?;
        self.cache
            .insert(
                CATEGORIES_KEY,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;
        Ok(categories)
    }

    async fn put_category(&self, category: Category) -> Result<()> {
        self.inner.put_category(category).await?;
        self.cache.invalidate(CATEGORIES_KEY).await;
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<bool> {
        let deleted = self.inner.delete_category(id).await?;
        self.cache.invalidate(CATEGORIES_KEY).await;
        Ok(deleted)
    }

    async fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        self.inner.get_page(id).await
    }

    async fn list_pages(&self) -> Result<Vec<Page>> {
        if let Some(CacheValue::Pages(pages)) = self.cache.get(PAGES_KEY).await {
            debug!("Cache hit for pages");
            return Ok(pages.as_ref().clone());
        }

        let pages = self.inner.list_pages().await?;
        self.cache
            .insert(PAGES_KEY, CacheValue::Pages(Arc::new(pages.clone())))
            .await;
        Ok(pages)
    }

    async fn put_page(&self, page: Page) -> Result<()> {
        self.inner.put_page(page).await?;
        self.cache.invalidate(PAGES_KEY).await;
        Ok(())
    }

    async fn delete_page(&self, id: &PageId) -> Result<bool> {
        let deleted = self.inner.delete_page(id).await?;
        self.cache.invalidate(PAGES_KEY).await;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryCatalogStore;

    fn category(id: &str, title: &str) -> Category {
        Category::new(id.into(), title)
    }

    #[tokio::test]
    async fn test_listing_served_from_cache() {
        let backing = Arc::new(InMemoryCatalogStore::new());
        let cached = CachedCatalogStore::new(backing.clone(), Duration::from_secs(60));

        backing.put_category(category("c1", "Fruit")).await.unwrap();
        assert_eq!(cached.list_categories().await.unwrap().len(), 1);

        // Bypasses the decorator, so the cached listing stays in place.
        backing.put_category(category("c2", "Vegetables")).await.unwrap();
        assert_eq!(cached.list_categories().await.unwrap().len(), 1);

        cached.put_category(category("c3", "Herbs")).await.unwrap();
        assert_eq!(cached.list_categories().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_writes_invalidate() {
        let cached = CachedCatalogStore::new(
            Arc::new(InMemoryCatalogStore::new()),
            Duration::from_secs(60),
        );

        assert!(cached.list_categories().await.unwrap().is_empty());
        cached.put_category(category("c1", "Fruit")).await.unwrap();
        assert_eq!(cached.list_categories().await.unwrap().len(), 1);

        cached.delete_category(&"c1".into()).await.unwrap();
        assert!(cached.list_categories().await.unwrap().is_empty());

        assert!(cached.list_pages().await.unwrap().is_empty());
        cached
            .put_page(Page {
                id: "home".into(),
                title: "Home".into(),
                slug: "home".into(),
                content: String::new(),
                sorting: 0,
            })
            .await
            .unwrap();
        assert_eq!(cached.list_pages().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_refreshes_after_ttl() {
        let backing = Arc::new(InMemoryCatalogStore::new());
        let cached = CachedCatalogStore::new(backing.clone(), Duration::from_millis(50));

        assert!(cached.list_categories().await.unwrap().is_empty());
        backing.put_category(category("c1", "Fruit")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cached.list_categories().await.unwrap().len(), 1);
    }
}

use crate::domain::cart::{Cart, SessionId};
use crate::domain::catalog::{
    Category, CategoryId, Page, PageId, Product, ProductId, ProductUpdate, StockReservation,
    StockShortfall,
    merge_reservations,
};
use crate::domain::ports::{CatalogStore, SessionStore};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing products.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for storing categories.
pub const CF_CATEGORIES: &str = "categories";
/// Column Family for storing content pages.
pub const CF_PAGES: &str = "pages";
/// Column Family for storing session carts.
pub const CF_SESSIONS: &str = "sessions";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for the catalog and for session carts using separate Column
/// Families, one JSON document per key.
///
/// Every product write holds `stock_guard`. Stock decrements and product
/// updates keep it across their read and their single write, so checking and
/// taking stock is one conditional step for every handle cloned from this
/// store, and no edit can write back a stock level read before a decrement.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    stock_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that every required column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_PRODUCTS, CF_CATEGORIES, CF_PAGES, CF_SESSIONS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            stock_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            StoreError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key.as_bytes(), bytes)?;
        Ok(())
    }

    fn delete_key(&self, cf_name: &str, key: &str) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        let existed = self.db.get_pinned_cf(cf, key.as_bytes())?.is_some();
        if existed {
            self.db.delete_cf(cf, key.as_bytes())?;
        }
        Ok(existed)
    }

    fn list_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl CatalogStore for RocksDBStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        self.get_json(CF_PRODUCTS, id.as_str())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        // Keys iterate in byte order, which is product id order.
        self.list_json(CF_PRODUCTS)
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        let _guard = self.stock_guard.lock().await;
        self.put_json(CF_PRODUCTS, product.id.as_str(), &product)
    }

    async fn update_product(&self, id: &ProductId, update: &ProductUpdate) -> Result<Product> {
        let _guard = self.stock_guard.lock().await;
        let mut product: Product = self
            .get_json(CF_PRODUCTS, id.as_str())?
            .ok_or_else(|| StoreError::ProductNotFound(id.clone()))?;
        update.apply_to(&mut product);
        self.put_json(CF_PRODUCTS, id.as_str(), &product)?;
        Ok(product)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> {
        let _guard = self.stock_guard.lock().await;
        self.delete_key(CF_PRODUCTS, id.as_str())
    }

    async fn decrement_stock_all(&self, reservations: &[StockReservation]) -> Result<()> {
        let reservations = merge_reservations(reservations);
        let _guard = self.stock_guard.lock().await;

        let mut updated = Vec::with_capacity(reservations.len());
        let mut shortfalls = Vec::new();
        for r in &reservations {
            match self.get_json::<Product>(CF_PRODUCTS, r.product_id.as_str())? {
                Some(mut product) if product.stock >= r.quantity => {
                    product.stock -= r.quantity;
                    updated.push(product);
                }
                found => shortfalls.push(StockShortfall {
                    product_id: r.product_id.clone(),
                    requested: r.quantity,
                    available: found.map_or(0, |p| p.stock),
                }),
            }
        }
        if !shortfalls.is_empty() {
            return Err(StoreError::InsufficientStock(shortfalls));
        }

        let cf = self.cf(CF_PRODUCTS)?;
        let mut batch = WriteBatch::default();
        for product in &updated {
            batch.put_cf(cf, product.id.as_str().as_bytes(), serde_json::to_vec(product)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        self.get_json(CF_CATEGORIES, id.as_str())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self.list_json(CF_CATEGORIES)?;
        categories.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(categories)
    }

    async fn put_category(&self, category: Category) -> Result<()> {
        self.put_json(CF_CATEGORIES, category.id.as_str(), &category)
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<bool> {
        self.delete_key(CF_CATEGORIES, id.as_str())
    }

    async fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        self.get_json(CF_PAGES, id.as_str())
    }

    async fn list_pages(&self) -> Result<Vec<Page>> {
        let mut pages: Vec<Page> = self.list_json(CF_PAGES)?;
        pages.sort_by(|a, b| a.sorting.cmp(&b.sorting).then_with(|| a.slug.cmp(&b.slug)));
        Ok(pages)
    }

    async fn put_page(&self, page: Page) -> Result<()> {
        self.put_json(CF_PAGES, page.id.as_str(), &page)
    }

    async fn delete_page(&self, id: &PageId) -> Result<bool> {
        self.delete_key(CF_PAGES, id.as_str())
    }
}

#[async_trait]
impl SessionStore for RocksDBStore {
    async fn load_cart(&self, session_id: &SessionId) -> Result<Cart> {
        Ok(self
            .get_json(CF_SESSIONS, session_id.as_str())?
            .unwrap_or_else(|| Cart::new(session_id.clone())))
    }

    async fn save_cart(&self, cart: Cart) -> Result<()> {
        self.put_json(CF_SESSIONS, cart.session_id().as_str(), &cart)
    }

    async fn remove_cart(&self, session_id: &SessionId) -> Result<()> {
        self.delete_key(CF_SESSIONS, session_id.as_str())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn product(id: &str, stock: u32) -> Product {
        Product::new(
            id.into(),
            format!("Product {id}"),
            Money::new(dec!(10)).unwrap(),
            stock,
            "general".into(),
        )
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in [CF_PRODUCTS, CF_CATEGORIES, CF_PAGES, CF_SESSIONS] {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_product_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let p = product("p1", 3);
        store.put_product(p.clone()).await.unwrap();

        let retrieved = store.get_product(&p.id).await.unwrap().unwrap();
        assert_eq!(retrieved, p);
        assert_eq!(store.list_products().await.unwrap(), vec![p.clone()]);
        assert!(store.get_product(&"p2".into()).await.unwrap().is_none());

        assert!(store.delete_product(&p.id).await.unwrap());
        assert!(!store.delete_product(&p.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rocksdb_decrement_all_or_nothing() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        store.put_product(product("a", 5)).await.unwrap();
        store.put_product(product("b", 1)).await.unwrap();

        let result = store
            .decrement_stock_all(&[
                StockReservation {
                    product_id: "a".into(),
                    quantity: 2,
                },
                StockReservation {
                    product_id: "b".into(),
                    quantity: 2,
                },
            ])
            .await;
        assert!(matches!(result, Err(StoreError::InsufficientStock(ref s)) if s.len() == 1));
        assert_eq!(store.get_product(&"a".into()).await.unwrap().unwrap().stock, 5);

        store.decrement_stock(&"a".into(), 5).await.unwrap();
        assert_eq!(store.get_product(&"a".into()).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_rocksdb_session_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let session: SessionId = "s1".into();

        let mut cart = Cart::new(session.clone());
        cart.add(&product("p1", 3), 2).unwrap();
        store.save_cart(cart.clone()).await.unwrap();
        assert_eq!(store.load_cart(&session).await.unwrap(), cart);

        store.remove_cart(&session).await.unwrap();
        assert!(store.load_cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rocksdb_last_units_sold_once() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        store.put_product(product("hot", 3)).await.unwrap();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.decrement_stock(&"hot".into(), 1).await })
            })
            .collect();

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => sold += 1,
                Err(StoreError::InsufficientStock(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(sold, 3);
        assert_eq!(store.get_product(&"hot".into()).await.unwrap().unwrap().stock, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rocksdb_updates_keep_concurrent_decrements() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        store.put_product(product("p", 20)).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    store.decrement_stock(&"p".into(), 1).await
                } else {
                    let update = ProductUpdate {
                        price: Some(Money::new(rust_decimal::Decimal::from(i)).unwrap()),
                        ..Default::default()
                    };
                    store.update_product(&"p".into(), &update).await.map(|_| ())
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_product(&"p".into()).await.unwrap().unwrap().stock, 10);
    }
}


use crate::domain::catalog::{
    Category, CategoryId, Page, PageId, Product, ProductId, ProductUpdate, slugify,
};
use crate::domain::money::Money;
use crate::domain::ports::CatalogStoreRef;
use crate::error::{Result, StoreError};
use tracing::info;

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    /// Explicit id, or `None` to generate one.
    pub id: Option<ProductId>,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub category: CategoryId,
}

/// Validated catalog maintenance.
///
/// Writes go through the catalog port, so a cached catalog sees every change.
#[derive(Clone)]
pub struct CatalogAdmin {
    catalog: CatalogStoreRef,
}

fn required_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::ValidationError(
            "Title must have a value.".to_string(),
        ));
    }
    Ok(title.to_string())
}

impl CatalogAdmin {
    pub fn new(catalog: CatalogStoreRef) -> Self {
        Self { catalog }
    }

    async fn category_slug_taken(&self, slug: &str, except: Option<&CategoryId>) -> Result<bool> {
        Ok(self
            .catalog
            .list_categories()
            .await?
            .iter()
            .any(|c| c.slug == slug && Some(&c.id) != except))
    }

    pub async fn add_category(&self, title: &str) -> Result<Category> {
        let title = required_title(title)?;
        let category = Category::new(CategoryId::generate(), title);
        if self.category_slug_taken(&category.slug, None).await? {
            return Err(StoreError::ValidationError(
                "Category title exists, choose another.".to_string(),
            ));
        }
        self.catalog.put_category(category.clone()).await?;
        info!(category = %category.slug, "Category added");
        Ok(category)
    }

    pub async fn edit_category(&self, id: &CategoryId, title: &str) -> Result<Category> {
        let title = required_title(title)?;
        if self.catalog.get_category(id).await?.is_none() {
            return Err(StoreError::CategoryNotFound(id.clone()));
        }
        let category = Category::new(id.clone(), title);
        if self.category_slug_taken(&category.slug, Some(id)).await? {
            return Err(StoreError::ValidationError(
                "Category title exists, choose another.".to_string(),
            ));
        }
        self.catalog.put_category(category.clone()).await?;
        Ok(category)
    }

    pub async fn delete_category(&self, id: &CategoryId) -> Result<()> {
        if !self.catalog.delete_category(id).await? {
            return Err(StoreError::CategoryNotFound(id.clone()));
        }
        Ok(())
    }

    /// Returns the category whose slug matches `title`, creating it if needed.
    pub async fn ensure_category(&self, title: &str) -> Result<Category> {
        let slug = slugify(title);
        if let Some(existing) = self
            .catalog
            .list_categories()
            .await?
            .into_iter()
            .find(|c| c.slug == slug)
        {
            return Ok(existing);
        }
        self.add_category(title).await
    }

    async fn require_category(&self, id: &CategoryId) -> Result<()> {
        match self.catalog.get_category(id).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::CategoryNotFound(id.clone())),
        }
    }

    async fn product_slug_taken(&self, slug: &str, except: &ProductId) -> Result<bool> {
        Ok(self
            .catalog
            .list_products()
            .await?
            .iter()
            .any(|p| p.slug == slug && &p.id != except))
    }

    pub async fn add_product(&self, draft: ProductDraft) -> Result<Product> {
        let title = required_title(&draft.title)?;
        self.require_category(&draft.category).await?;

        let id = draft.id.unwrap_or_else(ProductId::generate);
        if self.catalog.get_product(&id).await?.is_some() {
            return Err(StoreError::ValidationError(format!(
                "Product {id} already exists"
            )));
        }

        let mut product = Product::new(id, title, draft.price, draft.stock, draft.category);
        product.description = draft.description;
        if self.product_slug_taken(&product.slug, &product.id).await? {
            return Err(StoreError::ValidationError(
                "Product title exists, choose another.".to_string(),
            ));
        }
        self.catalog.put_product(product.clone()).await?;
        info!(product = %product.id, "Product added");
        Ok(product)
    }

    /// Validates `update` and applies it through the store, which leaves every
    /// field the update does not name untouched.
    pub async fn edit_product(&self, id: &ProductId, mut update: ProductUpdate) -> Result<Product> {
        if let Some(title) = update.title.take() {
            let title = required_title(&title)?;
            if self.product_slug_taken(&slugify(&title), id).await? {
                return Err(StoreError::ValidationError(
                    "Product title exists, choose another.".to_string(),
                ));
            }
            update.title = Some(title);
        }
        if let Some(category) = &update.category {
            self.require_category(category).await?;
        }

        let product = self.catalog.update_product(id, &update).await?;
        info!(product = %product.id, "Product edited");
        Ok(product)
    }

    /// Every product, ordered by id.
    pub async fn products(&self) -> Result<Vec<Product>> {
        let mut products = self.catalog.list_products().await?;
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        if !self.catalog.delete_product(id).await? {
            return Err(StoreError::ProductNotFound(id.clone()));
        }
        Ok(())
    }

    /// Inserts or replaces a product under its id, creating its category from
    /// a title when missing. Used to seed the catalog.
    pub async fn import_product(
        &self,
        id: ProductId,
        title: &str,
        price: Money,
        stock: u32,
        category_title: &str,
    ) -> Result<Product> {
        let title = required_title(title)?;
        let category = self.ensure_category(category_title).await?;
        if self.catalog.get_product(&id).await?.is_some() {
            let update = ProductUpdate {
                title: Some(title),
                price: Some(price),
                stock: Some(stock),
                category: Some(category.id),
                ..Default::default()
            };
            return self.catalog.update_product(&id, &update).await;
        }
        let product = Product::new(id, title, price, stock, category.id);
        self.catalog.put_product(product.clone()).await?;
        Ok(product)
    }

    async fn page_slug_taken(&self, slug: &str, except: Option<&PageId>) -> Result<bool> {
        Ok(self
            .catalog
            .list_pages()
            .await?
            .iter()
            .any(|p| p.slug == slug && Some(&p.id) != except))
    }

    /// Adds a page. An empty `slug` is derived from the title.
    pub async fn add_page(&self, title: &str, slug: &str, content: &str) -> Result<Page> {
        let title = required_title(title)?;
        let slug = match slugify(slug) {
            s if s.is_empty() => slugify(&title),
            s => s,
        };
        if self.page_slug_taken(&slug, None).await? {
            return Err(StoreError::ValidationError(
                "Page slug exists, choose another.".to_string(),
            ));
        }
        let page = Page {
            id: PageId::generate(),
            title,
            slug,
            content: content.to_string(),
            sorting: Page::DEFAULT_SORTING,
        };
        self.catalog.put_page(page.clone()).await?;
        info!(page = %page.slug, "Page added");
        Ok(page)
    }

    pub async fn edit_page(
        &self,
        id: &PageId,
        title: &str,
        slug: &str,
        content: &str,
    ) -> Result<Page> {
        let mut page = self
            .catalog
            .get_page(id)
            .await?
            .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
        page.title = required_title(title)?;
        page.slug = match slugify(slug) {
            s if s.is_empty() => slugify(&page.title),
            s => s,
        };
        if self.page_slug_taken(&page.slug, Some(id)).await? {
            return Err(StoreError::ValidationError(
                "Page slug exists, choose another.".to_string(),
            ));
        }
        page.content = content.to_string();
        self.catalog.put_page(page.clone()).await?;
        Ok(page)
    }

    pub async fn delete_page(&self, id: &PageId) -> Result<()> {
        if !self.catalog.delete_page(id).await? {
            return Err(StoreError::PageNotFound(id.clone()));
        }
        Ok(())
    }

    /// Sets each page's sorting to its 1-based position in `ids`.
    pub async fn reorder_pages(&self, ids: &[PageId]) -> Result<()> {
        for (position, id) in ids.iter().enumerate() {
            let mut page = self
                .catalog
                .get_page(id)
                .await?
                .ok_or_else(|| StoreError::PageNotFound(id.clone()))?;
            page.sorting = u32::try_from(position + 1).unwrap_or(u32::MAX);
            self.catalog.put_page(page).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CatalogStore;
    use crate::infrastructure::cache::CachedCatalogStore;
    use crate::infrastructure::in_memory::InMemoryCatalogStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    fn admin() -> (CatalogStoreRef, CatalogAdmin) {
        let catalog: CatalogStoreRef = Arc::new(InMemoryCatalogStore::new());
        (catalog.clone(), CatalogAdmin::new(catalog))
    }

    fn draft(title: &str, category: &CategoryId) -> ProductDraft {
        ProductDraft {
            id: None,
            title: title.to_string(),
            description: String::new(),
            price: Money::new(dec!(9.99)).unwrap(),
            stock: 5,
            category: category.clone(),
        }
    }

    #[tokio::test]
    async fn test_add_category_validation() {
        let (_, admin) = admin();

        assert!(matches!(
            admin.add_category("   ").await,
            Err(StoreError::ValidationError(msg)) if msg == "Title must have a value."
        ));

        let category = admin.add_category("Fresh Fruit").await.unwrap();
        assert_eq!(category.slug, "fresh-fruit");

        assert!(matches!(
            admin.add_category("fresh  fruit").await,
            Err(StoreError::ValidationError(msg)) if msg == "Category title exists, choose another."
        ));
    }

    #[tokio::test]
    async fn test_edit_category_keeps_own_slug() {
        let (_, admin) = admin();
        let category = admin.add_category("Fruit").await.unwrap();
        admin.add_category("Vegetables").await.unwrap();

        let edited = admin.edit_category(&category.id, "fruit").await.unwrap();
        assert_eq!(edited.title, "fruit");
        assert!(admin.edit_category(&category.id, "Vegetables").await.is_err());
        assert!(matches!(
            admin.edit_category(&"missing".into(), "X").await,
            Err(StoreError::CategoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_category_is_idempotent() {
        let (catalog, admin) = admin();
        let first = admin.ensure_category("Drinks").await.unwrap();
        let second = admin.ensure_category("drinks").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(catalog.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_product_lifecycle() {
        let (catalog, admin) = admin();
        let category = admin.add_category("Tea").await.unwrap();

        assert!(matches!(
            admin.add_product(draft("Green Tea", &"nope".into())).await,
            Err(StoreError::CategoryNotFound(_))
        ));

        let product = admin.add_product(draft("Green Tea", &category.id)).await.unwrap();
        assert_eq!(product.slug, "green-tea");
        assert!(admin.add_product(draft("green tea", &category.id)).await.is_err());

        let edited = admin
            .edit_product(
                &product.id,
                ProductUpdate {
                    price: Some(Money::new(dec!(12)).unwrap()),
                    stock: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.price, Money::new(dec!(12)).unwrap());
        assert_eq!(edited.title, "Green Tea");

        let stored = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);

        admin.delete_product(&product.id).await.unwrap();
        assert!(matches!(
            admin.delete_product(&product.id).await,
            Err(StoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_import_product_upserts() {
        let (catalog, admin) = admin();
        admin
            .import_product("p1".into(), "Apple", Money::new(dec!(1)).unwrap(), 10, "Fruit")
            .await
            .unwrap();
        admin
            .import_product("p1".into(), "Apple", Money::new(dec!(2)).unwrap(), 4, "Fruit")
            .await
            .unwrap();

        let products = catalog.list_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].stock, 4);
        assert_eq!(catalog.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pages_add_and_reorder() {
        let (catalog, admin) = admin();
        let home = admin.add_page("Home", "", "Welcome").await.unwrap();
        let about = admin.add_page("About Us", "", "").await.unwrap();
        assert_eq!(about.slug, "about-us");
        assert_eq!(home.sorting, Page::DEFAULT_SORTING);
        assert!(admin.add_page("Another", "home", "").await.is_err());

        admin
            .reorder_pages(&[about.id.clone(), home.id.clone()])
            .await
            .unwrap();
        let slugs: Vec<_> = catalog
            .list_pages()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, vec!["about-us", "home"]);

        let edited = admin
            .edit_page(&home.id, "Home", "start", "Hello")
            .await
            .unwrap();
        assert_eq!(edited.slug, "start");
        admin.delete_page(&about.id).await.unwrap();
        assert!(admin.delete_page(&about.id).await.is_err());
    }

    #[tokio::test]
    async fn test_admin_writes_refresh_cached_navigation() {
        let cached: CatalogStoreRef = Arc::new(CachedCatalogStore::new(
            Arc::new(InMemoryCatalogStore::new()),
            Duration::from_secs(300),
        ));
        let admin = CatalogAdmin::new(cached.clone());

        assert!(cached.list_categories().await.unwrap().is_empty());
        admin.add_category("Fruit").await.unwrap();
        assert_eq!(cached.list_categories().await.unwrap().len(), 1);
    }
}

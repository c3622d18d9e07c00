use super::cart_engine::CartEngine;
use super::checkout::CheckoutCoordinator;
use crate::domain::cart::{Cart, CartSummary, SessionId};
use crate::domain::catalog::{Category, Page, Product, ProductId};
use crate::domain::checkout::{Checkout, CheckoutState};
use crate::domain::ports::{CatalogStoreRef, SessionStoreRef};
use crate::error::{Result, StoreError};
use serde::Serialize;

/// Menus rendered on every storefront page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub pages: Vec<Page>,
    pub categories: Vec<Category>,
}

/// Session-facing entry point of the store.
///
/// Each cart call loads the session's cart, runs the engine operation and saves
/// the result, so no cart state is held between requests.
#[derive(Clone)]
pub struct Storefront {
    catalog: CatalogStoreRef,
    sessions: SessionStoreRef,
    engine: CartEngine,
    coordinator: CheckoutCoordinator,
}

impl Storefront {
    pub fn new(catalog: CatalogStoreRef, sessions: SessionStoreRef) -> Self {
        Self {
            engine: CartEngine::new(catalog.clone()),
            coordinator: CheckoutCoordinator::new(catalog.clone()),
            catalog,
            sessions,
        }
    }

    pub async fn cart(&self, session_id: &SessionId) -> Result<Cart> {
        self.sessions.load_cart(session_id).await
    }

    pub async fn cart_summary(&self, session_id: &SessionId) -> Result<CartSummary> {
        Ok(self.cart(session_id).await?.summary())
    }

    pub async fn add_to_cart(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let cart = self.cart(session_id).await?;
        let cart = self.engine.add_item(cart, product_id, quantity).await?;
        self.sessions.save_cart(cart.clone()).await?;
        Ok(cart)
    }

    pub async fn update_cart_item(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let cart = self.cart(session_id).await?;
        let cart = self
            .engine
            .update_quantity(cart, product_id, quantity)
            .await?;
        self.sessions.save_cart(cart.clone()).await?;
        Ok(cart)
    }

    pub async fn remove_from_cart(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
    ) -> Result<Cart> {
        let cart = self.cart(session_id).await?;
        let cart = self.engine.remove_item(cart, product_id);
        self.sessions.save_cart(cart.clone()).await?;
        Ok(cart)
    }

    pub async fn clear_cart(&self, session_id: &SessionId) -> Result<Cart> {
        let cart = self.cart(session_id).await?;
        let cart = self.engine.clear(cart);
        self.sessions.save_cart(cart.clone()).await?;
        Ok(cart)
    }

    /// Submits the session's cart. A committed order ends the cart's life.
    pub async fn checkout(&self, session_id: &SessionId) -> Result<Checkout> {
        let cart = self.cart(session_id).await?;
        let checkout = self.coordinator.submit(cart).await?;
        self.settle(&checkout).await?;
        Ok(checkout)
    }

    /// Confirms a checkout that was waiting on changed prices.
    ///
    /// Fails with `CartChanged` when the session's cart was modified after the
    /// checkout was submitted; the buyer has to check out the new cart instead.
    pub async fn confirm_checkout(&self, checkout: Checkout) -> Result<Checkout> {
        let current = self.cart(checkout.session_id()).await?;
        if !checkout.submitted_from(&current) {
            return Err(StoreError::CartChanged(checkout.session_id().clone()));
        }
        let checkout = self.coordinator.confirm(checkout).await?;
        self.settle(&checkout).await?;
        Ok(checkout)
    }

    async fn settle(&self, checkout: &Checkout) -> Result<()> {
        if checkout.state() == CheckoutState::Committed {
            self.sessions.remove_cart(checkout.session_id()).await?;
        }
        Ok(())
    }

    pub async fn navigation(&self) -> Result<Navigation> {
        Ok(Navigation {
            pages: self.catalog.list_pages().await?,
            categories: self.catalog.list_categories().await?,
        })
    }

    /// Products listed under the category with `slug`.
    pub async fn products_in_category(&self, slug: &str) -> Result<Vec<Product>> {
        let category = self
            .catalog
            .list_categories()
            .await?
            .into_iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| StoreError::CategorySlugNotFound(slug.to_string()))?;
        Ok(self
            .catalog
            .list_products()
            .await?
            .into_iter()
            .filter(|p| p.category == category.id)
            .collect())
    }
}

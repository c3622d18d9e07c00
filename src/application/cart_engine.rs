use crate::domain::cart::Cart;
use crate::domain::catalog::{Product, ProductId};
use crate::domain::money::Money;
use crate::domain::ports::CatalogStoreRef;
use crate::error::{Result, StoreError};
use tracing::debug;

/// Applies cart operations against live catalog data.
///
/// The engine holds no cart state of its own: every operation takes the cart
/// and hands the updated cart back, and the caller decides where it lives.
#[derive(Clone)]
pub struct CartEngine {
    catalog: CatalogStoreRef,
}

impl CartEngine {
    pub fn new(catalog: CatalogStoreRef) -> Self {
        Self { catalog }
    }

    async fn product(&self, product_id: &ProductId) -> Result<Product> {
        self.catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))
    }

    /// Adds `quantity` units at the current catalog price, or merges into the
    /// existing line for the product.
    pub async fn add_item(
        &self,
        mut cart: Cart,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let product = self.product(product_id).await?;
        cart.add(&product, quantity)?;
        debug!(
            session = %cart.session_id(),
            product = %product_id,
            quantity,
            "Added item to cart"
        );
        Ok(cart)
    }

    /// Sets the quantity of an existing line. Zero is rejected; use
    /// [`CartEngine::remove_item`] instead.
    pub async fn update_quantity(
        &self,
        mut cart: Cart,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if !cart.contains(product_id) {
            return Err(StoreError::LineItemNotFound(product_id.clone()));
        }
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let product = self.product(product_id).await?;
        cart.set_quantity(&product, quantity)?;
        debug!(
            session = %cart.session_id(),
            product = %product_id,
            quantity,
            "Updated cart quantity"
        );
        Ok(cart)
    }

    /// Removes the product's line. Removing an absent product is a no-op.
    pub fn remove_item(&self, mut cart: Cart, product_id: &ProductId) -> Cart {
        if cart.remove(product_id) {
            debug!(session = %cart.session_id(), product = %product_id, "Removed cart line");
        }
        cart
    }

    pub fn compute_total(cart: &Cart) -> Money {
        cart.total()
    }

    pub fn clear(&self, mut cart: Cart) -> Cart {
        cart.clear();
        cart
    }
}

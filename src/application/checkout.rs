use crate::domain::cart::Cart;
use crate::domain::catalog::StockShortfall;
use crate::domain::checkout::{Checkout, CheckoutState, PriceChange, ValidationReport};
use crate::domain::ports::CatalogStoreRef;
use crate::error::{Result, StoreError};
use tracing::{info, warn};

/// Drives a cart through validation and order placement.
///
/// Validation re-reads every line from the catalog and reports all problems at
/// once. Stock is only taken at commit, through the catalog's all-or-nothing
/// conditional decrement, so a buyer who loses a race for the last unit gets a
/// rejected checkout rather than an oversold product.
#[derive(Clone)]
pub struct CheckoutCoordinator {
    catalog: CatalogStoreRef,
}

impl CheckoutCoordinator {
    pub fn new(catalog: CatalogStoreRef) -> Self {
        Self { catalog }
    }

    /// Checks every line against live stock and price.
    pub async fn validate(&self, cart: &Cart) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();
        for line in cart.lines() {
            let product = self.catalog.get_product(&line.product_id).await?;
            let available = product.as_ref().map_or(0, |p| p.stock);
            if available < line.quantity {
                report.shortfalls.push(StockShortfall {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available,
                });
            }
            if let Some(product) = product
                && product.price != line.unit_price
            {
                report.price_changes.push(PriceChange {
                    product_id: line.product_id.clone(),
                    previous: line.unit_price,
                    current: product.price,
                });
            }
        }
        Ok(report)
    }

    /// Submits a cart for checkout.
    ///
    /// Returns the checkout in one of three states: `Committed` when the cart
    /// validated cleanly and stock was taken, `AwaitingConfirmation` when prices
    /// moved, or `Rejected` listing every line short of stock.
    pub async fn submit(&self, cart: Cart) -> Result<Checkout> {
        if cart.is_empty() {
            return Err(StoreError::ValidationError(
                "Cannot check out an empty cart".to_string(),
            ));
        }
        let mut checkout = Checkout::new(cart);
        checkout.begin_validation()?;
        self.run(checkout).await
    }

    /// Accepts the re-priced lines of a checkout awaiting confirmation.
    ///
    /// Validation runs again, so prices that moved a second time come back for
    /// another confirmation.
    pub async fn confirm(&self, mut checkout: Checkout) -> Result<Checkout> {
        if checkout.state() != CheckoutState::AwaitingConfirmation {
            return Err(StoreError::InvalidTransition {
                from: checkout.state(),
                to: CheckoutState::Validating,
            });
        }
        checkout.begin_validation()?;
        self.run(checkout).await
    }

    async fn run(&self, mut checkout: Checkout) -> Result<Checkout> {
        let report = self.validate(checkout.cart()).await?;
        checkout.apply_validation(report)?;

        match checkout.state() {
            CheckoutState::Validating => self.commit(checkout).await,
            CheckoutState::AwaitingConfirmation => {
                info!(
                    session = %checkout.session_id(),
                    changes = checkout.price_changes().len(),
                    "Checkout awaiting price confirmation"
                );
                Ok(checkout)
            }
            _ => {
                warn!(
                    session = %checkout.session_id(),
                    shortfalls = checkout.shortfalls().len(),
                    "Checkout rejected"
                );
                Ok(checkout)
            }
        }
    }

    async fn commit(&self, mut checkout: Checkout) -> Result<Checkout> {
        let reservations = checkout.cart().reservations();
        match self.catalog.decrement_stock_all(&reservations).await {
            Ok(()) => {
                let receipt = checkout.commit()?;
                info!(
                    session = %receipt.session_id,
                    order = %receipt.order_id,
                    total = %receipt.total,
                    "Checkout committed"
                );
                Ok(checkout)
            }
            Err(StoreError::InsufficientStock(shortfalls)) => {
                warn!(
                    session = %checkout.session_id(),
                    shortfalls = shortfalls.len(),
                    "Stock taken by a concurrent checkout"
                );
                checkout.reject(shortfalls)?;
                Ok(checkout)
            }
            Err(e) => Err(e),
        }
    }
}

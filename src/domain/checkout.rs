use super::cart::{Cart, SessionId};
use super::catalog::{ProductId, StockShortfall};
use super::money::Money;
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Cart as accumulated by the buyer.
    Draft,
    /// Lines are being checked against live catalog state.
    Validating,
    /// Prices moved since the lines were added; the buyer must confirm.
    AwaitingConfirmation,
    Committed,
    Rejected,
}

impl CheckoutState {
    pub fn can_transition_to(self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (Draft, Validating)
                | (Validating, AwaitingConfirmation)
                | (Validating, Committed)
                | (Validating, Rejected)
                | (AwaitingConfirmation, Validating)
        )
    }
}

/// Notice that a line was moved to the live catalog price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub product_id: ProductId,
    pub previous: Money,
    pub current: Money,
}

/// Outcome of checking every line of a cart against live catalog state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub shortfalls: Vec<StockShortfall>,
    pub price_changes: Vec<PriceChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: Uuid,
    pub session_id: SessionId,
    pub lines: Vec<OrderLine>,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// One checkout attempt for a cart.
///
/// The cart held here is the working copy: it is re-priced when prices change
/// and cleared once the order commits. A rejected checkout keeps the cart exactly
/// as submitted. `submitted` stays as the buyer's cart was at submission, so a
/// confirmation can tell whether the session cart moved on since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    state: CheckoutState,
    submitted: Cart,
    cart: Cart,
    price_changes: Vec<PriceChange>,
    shortfalls: Vec<StockShortfall>,
    receipt: Option<OrderReceipt>,
}

impl Checkout {
    pub fn new(cart: Cart) -> Self {
        Self {
            state: CheckoutState::Draft,
            submitted: cart.clone(),
            cart,
            price_changes: Vec::new(),
            shortfalls: Vec::new(),
            receipt: None,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Whether `cart` is still the cart this checkout was submitted with.
    pub fn submitted_from(&self, cart: &Cart) -> bool {
        &self.submitted == cart
    }

    pub fn session_id(&self) -> &SessionId {
        self.cart.session_id()
    }

    /// Price notices from the most recent validation.
    pub fn price_changes(&self) -> &[PriceChange] {
        &self.price_changes
    }

    /// Every line that could not be fulfilled, when rejected.
    pub fn shortfalls(&self) -> &[StockShortfall] {
        &self.shortfalls
    }

    pub fn receipt(&self) -> Option<&OrderReceipt> {
        self.receipt.as_ref()
    }

    /// The checkout-time error for a rejected checkout.
    pub fn rejection(&self) -> Option<StoreError> {
        (self.state == CheckoutState::Rejected)
            .then(|| StoreError::InsufficientStock(self.shortfalls.clone()))
    }

    fn transition(&mut self, next: CheckoutState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Enters validation, either from a fresh submission or a re-confirmation.
    pub fn begin_validation(&mut self) -> Result<()> {
        self.transition(CheckoutState::Validating)
    }

    /// Applies a validation report.
    ///
    /// Shortfalls reject the checkout and leave the cart untouched. Otherwise
    /// price changes re-price the cart and wait for confirmation. A clean report
    /// keeps the checkout in `Validating`, ready to commit.
    pub fn apply_validation(&mut self, report: ValidationReport) -> Result<()> {
        if self.state != CheckoutState::Validating {
            return Err(StoreError::InvalidTransition {
                from: self.state,
                to: CheckoutState::Validating,
            });
        }

        if !report.shortfalls.is_empty() {
            return self.reject(report.shortfalls);
        }

        let mut cart = self.cart.clone();
        for change in &report.price_changes {
            cart.reprice(&change.product_id, change.current)?;
        }
        self.cart = cart;
        self.price_changes = report.price_changes;
        if !self.price_changes.is_empty() {
            self.transition(CheckoutState::AwaitingConfirmation)?;
        }
        Ok(())
    }

    pub fn reject(&mut self, shortfalls: Vec<StockShortfall>) -> Result<()> {
        self.transition(CheckoutState::Rejected)?;
        self.shortfalls = shortfalls;
        Ok(())
    }

    /// Marks the order as placed, clearing the cart into a receipt.
    pub fn commit(&mut self) -> Result<&OrderReceipt> {
        self.transition(CheckoutState::Committed)?;
        let receipt = OrderReceipt {
            order_id: Uuid::new_v4(),
            session_id: self.cart.session_id().clone(),
            lines: self
                .cart
                .lines()
                .iter()
                .map(|line| OrderLine {
                    product_id: line.product_id.clone(),
                    title: line.title.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
            total: self.cart.total(),
        };
        self.cart.clear();
        Ok(&*self.receipt.insert(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Product;
    use rust_decimal_macros::dec;

    fn cart_with(price: rust_decimal::Decimal, quantity: u32) -> Cart {
        let product = Product::new(
            "p".into(),
            "Widget",
            Money::new(price).unwrap(),
            10,
            "general".into(),
        );
        let mut cart = Cart::new("s1".into());
        cart.add(&product, quantity).unwrap();
        cart
    }

    #[test]
    fn test_state_transitions() {
        use CheckoutState::*;
        assert!(Draft.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Committed));
        assert!(AwaitingConfirmation.can_transition_to(Validating));
        assert!(!Draft.can_transition_to(Committed));
        assert!(!Rejected.can_transition_to(Validating));
        assert!(!Committed.can_transition_to(Validating));
    }

    #[test]
    fn test_commit_requires_validation() {
        let mut checkout = Checkout::new(cart_with(dec!(5), 1));
        assert!(matches!(
            checkout.commit(),
            Err(StoreError::InvalidTransition {
                from: CheckoutState::Draft,
                to: CheckoutState::Committed,
            })
        ));
    }

    #[test]
    fn test_clean_validation_then_commit() {
        let mut checkout = Checkout::new(cart_with(dec!(5), 2));
        checkout.begin_validation().unwrap();
        checkout.apply_validation(ValidationReport::default()).unwrap();
        assert_eq!(checkout.state(), CheckoutState::Validating);

        let receipt = checkout.commit().unwrap().clone();
        assert_eq!(receipt.total, Money::new(dec!(10)).unwrap());
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(checkout.state(), CheckoutState::Committed);
        assert!(checkout.cart().is_empty());
    }

    #[test]
    fn test_price_change_reprices_and_waits() {
        let mut checkout = Checkout::new(cart_with(dec!(500), 2));
        checkout.begin_validation().unwrap();
        checkout
            .apply_validation(ValidationReport {
                shortfalls: vec![],
                price_changes: vec![PriceChange {
                    product_id: "p".into(),
                    previous: Money::new(dec!(500)).unwrap(),
                    current: Money::new(dec!(600)).unwrap(),
                }],
            })
            .unwrap();

        assert_eq!(checkout.state(), CheckoutState::AwaitingConfirmation);
        assert_eq!(checkout.cart().total(), Money::new(dec!(1200)).unwrap());
        assert!(checkout.commit().is_err());
    }

    #[test]
    fn test_shortfall_rejects_without_touching_cart() {
        let cart = cart_with(dec!(5), 2);
        let mut checkout = Checkout::new(cart.clone());
        checkout.begin_validation().unwrap();
        checkout
            .apply_validation(ValidationReport {
                shortfalls: vec![StockShortfall {
                    product_id: "p".into(),
                    requested: 2,
                    available: 1,
                }],
                price_changes: vec![PriceChange {
                    product_id: "p".into(),
                    previous: Money::new(dec!(5)).unwrap(),
                    current: Money::new(dec!(6)).unwrap(),
                }],
            })
            .unwrap();

        assert_eq!(checkout.state(), CheckoutState::Rejected);
        assert_eq!(checkout.cart(), &cart);
        assert!(matches!(
            checkout.rejection(),
            Some(StoreError::InsufficientStock(ref lines)) if lines.len() == 1
        ));
        assert!(checkout.begin_validation().is_err());
    }

    #[test]
    fn test_submitted_cart_survives_repricing() {
        let cart = cart_with(dec!(500), 2);
        let mut checkout = Checkout::new(cart.clone());
        checkout.begin_validation().unwrap();
        checkout
            .apply_validation(ValidationReport {
                shortfalls: vec![],
                price_changes: vec![PriceChange {
                    product_id: "p".into(),
                    previous: Money::new(dec!(500)).unwrap(),
                    current: Money::new(dec!(600)).unwrap(),
                }],
            })
            .unwrap();

        assert_ne!(checkout.cart(), &cart);
        assert!(checkout.submitted_from(&cart));

        let mut grown = cart.clone();
        grown.clear();
        assert!(!checkout.submitted_from(&grown));
    }
}

use super::catalog::{Product, ProductId, StockReservation};
use super::money::Money;
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the browsing session that owns a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One product-plus-quantity entry of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    /// Product title when the line was added, for display.
    pub title: String,
    pub quantity: u32,
    /// Catalog price captured when the line was added.
    pub unit_price: Money,
}

impl CartLineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

fn checked_total(lines: &[CartLineItem]) -> Option<Money> {
    lines.iter().try_fold(Money::ZERO, |total, line| {
        total.checked_add(line.unit_price.checked_times(line.quantity)?)
    })
}

/// The line items collected by one session.
///
/// A cart never holds two lines for the same product, its total is always
/// derived from the lines on read, and every mutation keeps that total
/// representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    session_id: SessionId,
    lines: Vec<CartLineItem>,
}

impl Cart {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            lines: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Line items in the order they were first added.
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    pub fn line(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of quantity × snapshot price over all lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLineItem::line_total).sum()
    }

    /// Adds `quantity` units of `product`, merging into an existing line.
    ///
    /// A merged line keeps the price it was first added at.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let existing = self.line(&product.id).map_or(0, |line| line.quantity);
        let requested = existing.saturating_add(quantity);
        if !product.has_stock_for(requested) {
            return Err(StoreError::OutOfStock {
                product_id: product.id.clone(),
                requested,
                available: product.stock,
            });
        }

        let mut lines = self.lines.clone();
        match lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => line.quantity = requested,
            None => lines.push(CartLineItem {
                product_id: product.id.clone(),
                title: product.title.clone(),
                quantity,
                unit_price: product.price,
            }),
        }
        self.replace_lines(lines, requested)
    }

    /// Installs `lines` if their total is representable; otherwise the cart is
    /// left as it was and `quantity` is reported as invalid.
    fn replace_lines(&mut self, lines: Vec<CartLineItem>, quantity: u32) -> Result<()> {
        if checked_total(&lines).is_none() {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        self.lines = lines;
        Ok(())
    }

    /// Replaces the quantity of an existing line, validated against `product`'s stock.
    pub fn set_quantity(&mut self, product: &Product, quantity: u32) -> Result<()> {
        if !self.contains(&product.id) {
            return Err(StoreError::LineItemNotFound(product.id.clone()));
        }
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        if !product.has_stock_for(quantity) {
            return Err(StoreError::OutOfStock {
                product_id: product.id.clone(),
                requested: quantity,
                available: product.stock,
            });
        }

        let mut lines = self.lines.clone();
        if let Some(line) = lines.iter_mut().find(|line| line.product_id == product.id) {
            line.quantity = quantity;
        }
        self.replace_lines(lines, quantity)
    }

    /// Removes the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Moves a line to a new unit price. Used only when the buyer has been
    /// shown the price change.
    pub(crate) fn reprice(&mut self, product_id: &ProductId, unit_price: Money) -> Result<()> {
        let mut lines = self.lines.clone();
        let Some(line) = lines.iter_mut().find(|line| &line.product_id == product_id) else {
            return Ok(());
        };
        line.unit_price = unit_price;
        let quantity = line.quantity;
        self.replace_lines(lines, quantity)
    }

    /// One stock reservation per line.
    pub fn reservations(&self) -> Vec<StockReservation> {
        self.lines
            .iter()
            .map(|line| StockReservation {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            session_id: self.session_id.clone(),
            lines: self
                .lines
                .iter()
                .map(|line| LineSummary {
                    product_id: line.product_id.clone(),
                    title: line.title.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })
                .collect(),
            item_count: self.item_count(),
            total: self.total(),
        }
    }
}

/// Render-ready view of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub session_id: SessionId,
    pub lines: Vec<LineSummary>,
    pub item_count: u64,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSummary {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

use super::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a product in the catalog.
    ProductId
);
string_id!(
    /// Identifier of a category in the catalog.
    CategoryId
);
string_id!(PageId);

/// Builds the URL-safe slug for a title: whitespace runs become `-`, letters
/// are lowercased.
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// A product offered for sale.
///
/// Price and stock are owned by the catalog. Carts copy the price at add time,
/// and only admin operations or a committed checkout change these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    /// Units available for sale.
    pub stock: u32,
    pub category: CategoryId,
}

impl Product {
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        price: Money,
        stock: u32,
        category: CategoryId,
    ) -> Self {
        let title = title.into();
        Self {
            id,
            slug: slugify(&title),
            title,
            description: String::new(),
            price,
            stock,
            category,
        }
    }

    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

/// Partial product edit; `None` leaves a field as it is.
///
/// Stores apply an update in place under their write guard, so fields it does
/// not name, stock in particular, keep whatever value a concurrent checkout
/// left there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub category: Option<CategoryId>,
}

impl ProductUpdate {
    /// Writes the named fields into `product`. A new title also moves the slug.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.slug = slugify(title);
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub slug: String,
}

impl Category {
    pub fn new(id: CategoryId, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id,
            slug: slugify(&title),
            title,
        }
    }
}

/// A content page shown in the storefront header, ordered by `sorting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub sorting: u32,
}

impl Page {
    /// Sorting assigned to pages that have never been reordered.
    pub const DEFAULT_SORTING: u32 = 100;
}

/// A request to take `quantity` units of a product out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservation {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Sums reservations per product, keeping the order products first appear in.
pub fn merge_reservations(reservations: &[StockReservation]) -> Vec<StockReservation> {
    let mut merged: Vec<StockReservation> = Vec::with_capacity(reservations.len());
    for reservation in reservations {
        match merged
            .iter_mut()
            .find(|r| r.product_id == reservation.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(reservation.quantity)
            }
            None => merged.push(reservation.clone()),
        }
    }
    merged
}

/// A line that cannot be fulfilled from the current stock.
///
/// `available` is zero when the product no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortfall {
    pub product_id: ProductId,
    pub requested: u32,
    pub available: u32,
}

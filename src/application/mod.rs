//! Application layer orchestrating the domain against the storage ports.
//!
//! `CartEngine` and `CheckoutCoordinator` hold the cart and checkout rules,
//! `Storefront` binds them to session storage, and `CatalogAdmin` performs
//! validated catalog maintenance.

pub mod admin;
pub mod cart_engine;
pub mod checkout;
pub mod storefront;

//! Domain model: catalog entities, carts, checkout state and the storage ports.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod money;
pub mod ports;

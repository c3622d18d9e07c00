//! Adapters between the storefront services and the command-line driver.

pub mod csv;
pub mod script;

use crate::domain::catalog::ProductId;
use crate::error::{Result, StoreError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of a catalog seed file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ProductRecord {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub stock: u32,
    /// Category title; the category is created when missing.
    pub category: String,
}

/// Reads catalog products from a CSV source with the columns
/// `id, title, price, stock, category`.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn products(self) -> impl Iterator<Item = Result<ProductRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(StoreError::from))
    }
}

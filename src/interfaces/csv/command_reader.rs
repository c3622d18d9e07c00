use crate::domain::cart::SessionId;
use crate::domain::catalog::ProductId;
use crate::error::{Result, StoreError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Add,
    Update,
    Remove,
    Clear,
    Checkout,
    Confirm,
}

/// One storefront action performed by a session.
///
/// `product` and `quantity` are left empty for actions that do not use them.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CartCommand {
    pub action: CartAction,
    pub session: SessionId,
    pub product: Option<ProductId>,
    pub quantity: Option<u32>,
}

/// Reads cart commands from a CSV source with the columns
/// `action, session, product, quantity`.
///
/// Commands are deserialized lazily so long scripts stream through.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<CartCommand>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(StoreError::from))
    }
}

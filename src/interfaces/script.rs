use super::csv::catalog_reader::CatalogReader;
use super::csv::command_reader::{CartAction, CartCommand, CommandReader};
use super::csv::report_writer::{ReportKind, ReportWriter};
use crate::application::admin::CatalogAdmin;
use crate::application::storefront::Storefront;
use crate::domain::cart::SessionId;
use crate::domain::catalog::ProductId;
use crate::domain::checkout::{Checkout, CheckoutState, OrderReceipt};
use crate::domain::money::Money;
use crate::error::{Result, StoreError};
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};
use tracing::{info, warn};

/// Replays a script of storefront commands.
///
/// Plays the part of the web layer: it keeps checkouts that await price
/// confirmation between commands and remembers which sessions it has seen so
/// their carts can be reported at the end.
pub struct ScriptRunner {
    storefront: Storefront,
    admin: CatalogAdmin,
    pending: HashMap<SessionId, Checkout>,
    sessions: BTreeSet<SessionId>,
    orders: Vec<OrderReceipt>,
}

fn product_of(command: &CartCommand) -> Result<&ProductId> {
    command.product.as_ref().ok_or_else(|| {
        StoreError::ValidationError(format!("{:?} requires a product", command.action))
    })
}

fn quantity_of(command: &CartCommand) -> Result<u32> {
    command.quantity.ok_or_else(|| {
        StoreError::ValidationError(format!("{:?} requires a quantity", command.action))
    })
}

impl ScriptRunner {
    pub fn new(storefront: Storefront, admin: CatalogAdmin) -> Self {
        Self {
            storefront,
            admin,
            pending: HashMap::new(),
            sessions: BTreeSet::new(),
            orders: Vec::new(),
        }
    }

    /// Upserts every product of a catalog CSV. Bad rows are logged and skipped.
    pub async fn seed_catalog<R: Read>(&self, source: R) -> Result<usize> {
        let mut imported = 0;
        for record in CatalogReader::new(source).products() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Error reading product: {e}");
                    continue;
                }
            };
            let result = match Money::new(record.price) {
                Ok(price) => {
                    self.admin
                        .import_product(
                            record.id,
                            &record.title,
                            price,
                            record.stock,
                            &record.category,
                        )
                        .await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(_) => imported += 1,
                Err(e) => warn!("Error importing product: {e}"),
            }
        }
        info!(imported, "Catalog seeded");
        Ok(imported)
    }

    /// Runs every command of a script. A failing command is logged and does not
    /// stop the run.
    pub async fn run<R: Read>(&mut self, source: R) {
        for command in CommandReader::new(source).commands() {
            match command {
                Ok(command) => {
                    if let Err(e) = self.apply(command).await {
                        warn!("Error processing command: {e}");
                    }
                }
                Err(e) => warn!("Error reading command: {e}"),
            }
        }
    }

    pub async fn apply(&mut self, command: CartCommand) -> Result<()> {
        let session = command.session.clone();
        self.sessions.insert(session.clone());

        match command.action {
            CartAction::Add => {
                let product = product_of(&command)?;
                let quantity = quantity_of(&command)?;
                self.storefront
                    .add_to_cart(&session, product, quantity)
                    .await?;
            }
            CartAction::Update => {
                let product = product_of(&command)?;
                let quantity = quantity_of(&command)?;
                self.storefront
                    .update_cart_item(&session, product, quantity)
                    .await?;
            }
            CartAction::Remove => {
                let product = product_of(&command)?;
                self.storefront.remove_from_cart(&session, product).await?;
            }
            CartAction::Clear => {
                self.storefront.clear_cart(&session).await?;
            }
            CartAction::Checkout => {
                let checkout = self.storefront.checkout(&session).await?;
                return self.settle(checkout);
            }
            CartAction::Confirm => {
                let checkout = self.pending.remove(&session).ok_or_else(|| {
                    StoreError::ValidationError(format!(
                        "No checkout awaiting confirmation for session {session}"
                    ))
                })?;
                let checkout = self.storefront.confirm_checkout(checkout).await?;
                return self.settle(checkout);
            }
        }

        // The cart changed, so an earlier price confirmation no longer covers it.
        self.pending.remove(&session);
        Ok(())
    }

    fn settle(&mut self, checkout: Checkout) -> Result<()> {
        let session = checkout.session_id().clone();
        match checkout.state() {
            CheckoutState::Committed => {
                if let Some(receipt) = checkout.receipt() {
                    self.orders.push(receipt.clone());
                }
                Ok(())
            }
            CheckoutState::AwaitingConfirmation => {
                for change in checkout.price_changes() {
                    info!(
                        session = %session,
                        product = %change.product_id,
                        previous = %change.previous,
                        current = %change.current,
                        "Price changed"
                    );
                }
                self.pending.insert(session, checkout);
                Ok(())
            }
            _ => Err(checkout.rejection().unwrap_or_else(|| {
                StoreError::ValidationError(format!("Checkout ended in {:?}", checkout.state()))
            })),
        }
    }

    pub fn orders(&self) -> &[OrderReceipt] {
        &self.orders
    }

    pub async fn write_report<W: Write>(&self, kind: ReportKind, sink: W) -> Result<()> {
        let mut writer = ReportWriter::new(sink);
        match kind {
            ReportKind::Stock => {
                let products = self.admin.products().await?;
                writer.write_stock(&products)
            }
            ReportKind::Carts => {
                let mut carts = Vec::with_capacity(self.sessions.len());
                for session in &self.sessions {
                    carts.push(self.storefront.cart(session).await?);
                }
                writer.write_carts(&carts)
            }
            ReportKind::Orders => writer.write_orders(&self.orders),
        }
    }
}

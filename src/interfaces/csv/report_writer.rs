use crate::domain::cart::Cart;
use crate::domain::catalog::Product;
use crate::domain::checkout::OrderReceipt;
use crate::domain::money::Money;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Which state the command-line driver reports on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportKind {
    /// Catalog stock levels after all commands.
    #[default]
    Stock,
    /// Lines still sitting in session carts.
    Carts,
    /// Committed orders.
    Orders,
}

#[derive(Serialize)]
struct StockRow<'a> {
    product: &'a str,
    title: &'a str,
    price: Money,
    stock: u32,
}

#[derive(Serialize)]
struct CartRow<'a> {
    session: &'a str,
    product: &'a str,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
}

#[derive(Serialize)]
struct OrderRow<'a> {
    order: String,
    session: &'a str,
    product: &'a str,
    quantity: u32,
    unit_price: Money,
}

/// Writes storefront state as CSV.
///
/// Each report writes its own header row.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    pub fn write_stock(&mut self, products: &[Product]) -> Result<()> {
        self.writer
            .write_record(["product", "title", "price", "stock"])?;
        for product in products {
            self.writer.serialize(StockRow {
                product: product.id.as_str(),
                title: &product.title,
                price: product.price,
                stock: product.stock,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_carts(&mut self, carts: &[Cart]) -> Result<()> {
        self.writer
            .write_record(["session", "product", "quantity", "unit_price", "line_total"])?;
        for cart in carts {
            for line in cart.lines() {
                self.writer.serialize(CartRow {
                    session: cart.session_id().as_str(),
                    product: line.product_id.as_str(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_orders(&mut self, orders: &[OrderReceipt]) -> Result<()> {
        self.writer
            .write_record(["order", "session", "product", "quantity", "unit_price"])?;
        for order in orders {
            for line in &order.lines {
                self.writer.serialize(OrderRow {
                    order: order.order_id.to_string(),
                    session: order.session_id.as_str(),
                    product: line.product_id.as_str(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

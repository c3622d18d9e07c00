#![allow(dead_code)]

use rust_decimal::Decimal;
use shopcart::application::admin::CatalogAdmin;
use shopcart::application::storefront::Storefront;
use shopcart::domain::catalog::ProductUpdate;
use shopcart::domain::money::Money;
use shopcart::domain::ports::{CatalogStore, CatalogStoreRef};
use shopcart::infrastructure::in_memory::{InMemoryCatalogStore, InMemorySessionStore};
use std::sync::Arc;

pub struct Shop {
    pub catalog: CatalogStoreRef,
    pub admin: CatalogAdmin,
    pub storefront: Storefront,
}

/// In-memory storefront seeded with `(id, price, stock)` products.
pub async fn shop_with(products: &[(&str, Decimal, u32)]) -> Shop {
    let catalog: CatalogStoreRef = Arc::new(InMemoryCatalogStore::new());
    let admin = CatalogAdmin::new(catalog.clone());
    for (id, price, stock) in products {
        admin
            .import_product(
                (*id).into(),
                &format!("Product {id}"),
                Money::new(*price).unwrap(),
                *stock,
                "General",
            )
            .await
            .unwrap();
    }
    let storefront = Storefront::new(catalog.clone(), Arc::new(InMemorySessionStore::default()));
    Shop {
        catalog,
        admin,
        storefront,
    }
}

pub async fn set_price(shop: &Shop, id: &str, price: Decimal) {
    shop.admin
        .edit_product(
            &id.into(),
            ProductUpdate {
                price: Some(Money::new(price).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

pub async fn stock_of(shop: &Shop, id: &str) -> u32 {
    shop.catalog.get_product(&id.into()).await.unwrap().unwrap().stock
}

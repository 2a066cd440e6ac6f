use crate::domain::money::Price;
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    id: Uuid,
    shop_id: Uuid,
    name: String,
    price: Decimal,
    stock: u32,
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default = "default_active")]
    is_active: bool,
}

/// Reads product listings from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding validated `Product`s lazily.
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

    pub fn products(self) -> impl Iterator<Item = Result<Product>> {
        self.reader.into_deserialize().map(|result| {
            let record: CatalogRecord = result.map_err(CheckoutError::from)?;
            Ok(Product {
                id: record.id,
                shop_id: record.shop_id,
                name: record.name,
                price: Price::new(record.price)?,
                stock: record.stock,
                currency: record.currency,
                is_active: record.is_active,
                created_at: Utc::now(),
            })
        })
    }
}

use super::money::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shop's product listing.
///
/// `stock` is the only shared mutable value in the core; every mutation goes
/// through the catalog store's atomic conditional update, never through a
/// read-then-write on this struct.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Product {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub name: String,
    pub price: Price,
    pub stock: u32,
    /// ISO currency code the owning shop charges in.
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(shop_id: Uuid, name: impl Into<String>, price: Price, stock: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            shop_id,
            name: name.into(),
            price,
            stock,
            currency: "EUR".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

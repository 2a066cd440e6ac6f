use super::money::{Amount, Price};
use crate::error::CheckoutError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl OrderStatus {
    /// `paid`, `failed` and `cancelled` are terminal: once reached the order
    /// record is never mutated again by the purchase flow.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A purchase record.
///
/// Snapshots the unit price and total at purchase time; deleting or editing
/// the referenced product later never changes what was charged.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    /// Unit price at the instant of purchase.
    pub unit_price: Price,
    /// `unit_price * quantity` at the instant of purchase.
    pub total_amount: Amount,
    pub status: OrderStatus,
    /// Settlement reference handed back by the payment provider.
    pub payment_intent_id: Option<String>,
    /// Caller-supplied retry token; at most one paid order per key.
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        customer_id: Uuid,
        shop_id: Uuid,
        product_id: Uuid,
        quantity: u32,
        unit_price: Price,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            shop_id,
            product_id,
            quantity,
            unit_price,
            total_amount: unit_price.total(quantity),
            status: OrderStatus::Pending,
            payment_intent_id: None,
            idempotency_key: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }

    /// Marks the order as settled, recording the provider's reference.
    pub fn mark_paid(&mut self, reference: String) -> Result<(), CheckoutError> {
        self.transition(OrderStatus::Paid)?;
        self.payment_intent_id = Some(reference);
        Ok(())
    }

    /// Marks the order as failed after a declined or unreachable settlement.
    pub fn mark_failed(&mut self) -> Result<(), CheckoutError> {
        self.transition(OrderStatus::Failed)
    }

    /// Out-of-band admin/vendor cancellation; never produced by checkout.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        self.transition(OrderStatus::Cancelled)
    }

    fn transition(&mut self, next: OrderStatus) -> Result<(), CheckoutError> {
        if self.status.is_terminal() {
            return Err(CheckoutError::Validation(format!(
                "order {} is already {:?}",
                self.id, self.status
            )));
        }
        self.status = next;
        Ok(())
    }
}

use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product's unit price.
///
/// This is a wrapper around `rust_decimal::Decimal` that enforces the
/// non-negativity rule at construction so the rest of the core never has to
/// re-validate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, CheckoutError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CheckoutError::Validation(
                "price must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Total charge for `quantity` units at this price.
    pub fn total(&self, quantity: u32) -> Amount {
        Amount(self.0 * Decimal::from(quantity))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A settled (or to-be-settled) monetary amount.
///
/// Only ever produced from a valid `Price` and a quantity, so it carries the
/// non-negativity invariant with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Errors produced by the checkout core.
///
/// Validation variants (`NotFound`, `Inactive`, `InsufficientStock`,
/// `PaymentNotConfigured`, `Validation`) are returned to the caller with no
/// side effects beyond any reservation already released. `Declined` and
/// `ProviderUnavailable` always leave a persisted `failed` order behind.
/// `UnknownOutcome` means the final order commit could not be confirmed and
/// stock was deliberately left decremented.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("product not found")]
    NotFound,
    #[error("product is not for sale")]
    Inactive,
    #[error("insufficient stock")]
    InsufficientStock,
    #[error("no active payment credential configured for this shop")]
    PaymentNotConfigured,
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment provider unavailable")]
    ProviderUnavailable,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("order outcome unknown: {0}")]
    UnknownOutcome(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("storage error: {0}")]
    StorageError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CheckoutError {
    /// Whether the caller may safely retry the whole `place_order` call.
    ///
    /// `Declined` is terminal for the given credential and amount and must
    /// not be retried; `UnknownOutcome` must be reconciled before retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable)
    }

    pub(crate) fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StorageError(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CheckoutError::ProviderUnavailable.is_retryable());
        assert!(!CheckoutError::Declined("card declined".into()).is_retryable());
        assert!(!CheckoutError::InsufficientStock.is_retryable());
        assert!(!CheckoutError::UnknownOutcome("commit unconfirmed".into()).is_retryable());
    }
}

use crate::domain::ports::CatalogStoreRef;
use crate::error::{CheckoutError, Result};
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum ReservationState {
    Held,
    Released,
    Committed,
}

/// Proof of a provisional stock decrement.
///
/// The token's state machine is what makes `release` idempotent: the credit
/// can only happen on the `Held -> Released` edge, so calling `release`
/// twice restores stock exactly once.
#[derive(Debug)]
pub struct ReservationToken {
    id: Uuid,
    product_id: Uuid,
    quantity: u32,
    state: ReservationState,
}

impl ReservationToken {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Guards per-product stock against concurrent decrement.
///
/// All stock mutation funnels through the catalog store's atomic
/// conditional-update primitive; the ledger adds the reserve/release/commit
/// protocol on top.
pub struct StockLedger {
    catalog: CatalogStoreRef,
}

impl StockLedger {
    pub fn new(catalog: CatalogStoreRef) -> Self {
        Self { catalog }
    }

    /// Reserves `quantity` units, decrementing stock up front.
    ///
    /// Fails with `NotFound` if the product does not exist and with
    /// `InsufficientStock` if it is inactive or understocked; two concurrent
    /// reservations over the last unit serialize inside the store, so at
    /// most one of them wins.
    pub async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<ReservationToken> {
        if quantity == 0 {
            return Err(CheckoutError::Validation(
                "reservation quantity must be at least 1".to_string(),
            ));
        }

        self.catalog.decrement_stock(product_id, quantity).await?;
        tracing::debug!(%product_id, quantity, "stock reserved");

        Ok(ReservationToken {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            state: ReservationState::Held,
        })
    }

    /// Returns the reserved units to stock. Safe to call more than once for
    /// the same token; only the first call credits.
    pub async fn release(&self, token: &mut ReservationToken) -> Result<()> {
        match token.state {
            ReservationState::Held => {
                self.catalog
                    .credit_stock(token.product_id, token.quantity)
                    .await?;
                token.state = ReservationState::Released;
                tracing::debug!(reservation = %token.id, "reservation released");
                Ok(())
            }
            ReservationState::Released => Ok(()),
            ReservationState::Committed => Err(CheckoutError::Validation(
                "cannot release a committed reservation".to_string(),
            )),
        }
    }

    /// Finalizes the reservation.
    ///
    /// The decrement already happened at `reserve`, so this is a protocol
    /// no-op today; it exists so the physical decrement could later be
    /// deferred to payment confirmation without changing callers.
    pub async fn commit(&self, token: &mut ReservationToken) -> Result<()> {
        match token.state {
            ReservationState::Held => {
                token.state = ReservationState::Committed;
                Ok(())
            }
            ReservationState::Committed => Ok(()),
            ReservationState::Released => Err(CheckoutError::Validation(
                "cannot commit a released reservation".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Price;
    use crate::domain::ports::CatalogStore;
    use crate::domain::product::Product;
    use crate::infrastructure::in_memory::InMemoryCatalog;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn seeded_catalog(stock: u32) -> (Arc<InMemoryCatalog>, Uuid) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let product = Product::new(
            Uuid::new_v4(),
            "poster",
            Price::new(dec!(5.00)).unwrap(),
            stock,
        );
        let id = product.id;
        catalog.upsert(product).await.unwrap();
        (catalog, id)
    }

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let (catalog, id) = seeded_catalog(3).await;
        let ledger = StockLedger::new(catalog.clone());

        let token = ledger.reserve(id, 2).await.unwrap();
        assert_eq!(token.quantity(), 2);
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_stock() {
        let (catalog, id) = seeded_catalog(1).await;
        let ledger = StockLedger::new(catalog.clone());

        assert!(matches!(
            ledger.reserve(id, 2).await,
            Err(CheckoutError::InsufficientStock)
        ));
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_reserve_unknown_product() {
        let (catalog, _) = seeded_catalog(1).await;
        let ledger = StockLedger::new(catalog);

        assert!(matches!(
            ledger.reserve(Uuid::new_v4(), 1).await,
            Err(CheckoutError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_reserve_inactive_product() {
        let (catalog, id) = seeded_catalog(5).await;
        let mut product = catalog.get(id).await.unwrap().unwrap();
        product.is_active = false;
        catalog.upsert(product).await.unwrap();

        let ledger = StockLedger::new(catalog);
        assert!(matches!(
            ledger.reserve(id, 1).await,
            Err(CheckoutError::InsufficientStock)
        ));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (catalog, id) = seeded_catalog(3).await;
        let ledger = StockLedger::new(catalog.clone());

        let mut token = ledger.reserve(id, 2).await.unwrap();
        ledger.release(&mut token).await.unwrap();
        ledger.release(&mut token).await.unwrap();

        // Credited once, not twice.
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_commit_then_release_is_rejected() {
        let (catalog, id) = seeded_catalog(2).await;
        let ledger = StockLedger::new(catalog.clone());

        let mut token = ledger.reserve(id, 1).await.unwrap();
        ledger.commit(&mut token).await.unwrap();
        ledger.commit(&mut token).await.unwrap(); // idempotent
        assert!(ledger.release(&mut token).await.is_err());
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let (catalog, id) = seeded_catalog(2).await;
        let ledger = StockLedger::new(catalog);
        assert!(matches!(
            ledger.reserve(id, 0).await,
            Err(CheckoutError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_oversell() {
        let (catalog, id) = seeded_catalog(1).await;
        let ledger = Arc::new(StockLedger::new(catalog.clone()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.reserve(id, 1).await }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                granted += 1;
            }
        }

        assert_eq!(granted, 1);
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock, 0);
    }
}

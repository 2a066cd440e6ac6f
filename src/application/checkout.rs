use super::ledger::{ReservationToken, StockLedger};
use super::vault::CredentialVault;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::payment::{ApiKey, PaymentProvider, SettlementResult};
use crate::domain::ports::{CatalogStoreRef, OrderStoreRef};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use crate::infrastructure::gateway::GatewayRegistry;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// A buyer's purchase intent, as handed in by the caller.
///
/// The caller is trusted to have authenticated `customer_id`; the core does
/// no authentication of its own.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct PurchaseRequest {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    /// Retry token: a repeated call carrying the key of an already-paid
    /// order returns that order instead of charging again.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckoutConfig {
    /// Upper bound on one settlement round trip.
    pub settle_timeout: Duration,
    /// Upper bound on any single storage read or write.
    pub storage_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_secs(10),
            storage_timeout: Duration::from_secs(5),
        }
    }
}

/// Orchestrates the order-placement transaction.
///
/// Per purchase attempt: validate availability, reserve stock, resolve the
/// shop's credential, settle through the provider adapter, then persist the
/// terminal order. Every transition is awaited before `place_order`
/// returns; nothing is fire-and-forget.
pub struct CheckoutEngine {
    catalog: CatalogStoreRef,
    orders: OrderStoreRef,
    ledger: StockLedger,
    vault: CredentialVault,
    gateways: GatewayRegistry,
    config: CheckoutConfig,
}

impl CheckoutEngine {
    pub fn new(
        catalog: CatalogStoreRef,
        orders: OrderStoreRef,
        vault: CredentialVault,
        gateways: GatewayRegistry,
        config: CheckoutConfig,
    ) -> Self {
        let ledger = StockLedger::new(catalog.clone());
        Self {
            catalog,
            orders,
            ledger,
            vault,
            gateways,
            config,
        }
    }

    /// Converts a purchase intent into a durable order.
    ///
    /// Returns the `paid` order on success. `Declined` and
    /// `ProviderUnavailable` leave a persisted `failed` order and restored
    /// stock behind; validation failures leave no order at all.
    pub async fn place_order(&self, request: PurchaseRequest) -> Result<Order> {
        if request.quantity == 0 {
            return Err(CheckoutError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        // Double-charge guard: an already-paid order for this key is the
        // answer, not a new attempt. A prior failed attempt charged nothing
        // and does not block a retry.
        if let Some(key) = request.idempotency_key.as_deref()
            && let Some(existing) = self.bounded(self.orders.find_by_idempotency_key(key)).await?
            && existing.status == OrderStatus::Paid
        {
            tracing::info!(order = %existing.id, key, "idempotent replay");
            return Ok(existing);
        }

        let product = self
            .bounded(self.catalog.get(request.product_id))
            .await?
            .ok_or(CheckoutError::NotFound)?;
        if !product.is_active {
            return Err(CheckoutError::Inactive);
        }

        let mut token = self
            .bounded(self.ledger.reserve(product.id, request.quantity))
            .await?;

        // Vendor configuration problems must not read as buyer payment
        // failures: release and surface PaymentNotConfigured as-is.
        let (provider, credential) = match self.vault.resolve_active(product.shop_id).await {
            Ok(resolved) => resolved,
            Err(err) => {
                self.bounded(self.ledger.release(&mut token)).await?;
                return Err(err);
            }
        };

        let order = Order::new(
            request.customer_id,
            product.shop_id,
            product.id,
            request.quantity,
            product.price,
        )
        .with_idempotency_key(request.idempotency_key.clone());

        let outcome = self.settle(&product, &order, provider, credential).await;
        self.finish(order, outcome, &mut token).await
    }

    /// Runs the settlement on its own task so a cancelled caller cannot
    /// abandon a charge mid-flight; timeouts, task failures and transport
    /// errors all collapse to `ProviderUnavailable`.
    async fn settle(
        &self,
        product: &Product,
        order: &Order,
        provider: PaymentProvider,
        credential: ApiKey,
    ) -> SettlementResult {
        let gateway = self.gateways.resolve(provider);
        let amount = order.total_amount;
        let currency = product.currency.clone();

        let handle =
            tokio::spawn(async move { gateway.settle(amount, &currency, &credential).await });

        match tokio::time::timeout(self.config.settle_timeout, handle).await {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(err))) => {
                tracing::warn!(%provider, error = %err, "settlement transport error");
                SettlementResult::ProviderUnavailable
            }
            Ok(Err(join_err)) => {
                tracing::warn!(%provider, error = %join_err, "settlement task failed");
                SettlementResult::ProviderUnavailable
            }
            Err(_) => {
                tracing::warn!(%provider, "settlement timed out");
                SettlementResult::ProviderUnavailable
            }
        }
    }

    async fn finish(
        &self,
        mut order: Order,
        outcome: SettlementResult,
        token: &mut ReservationToken,
    ) -> Result<Order> {
        match outcome {
            SettlementResult::Approved { reference } => {
                order.mark_paid(reference)?;
                self.bounded(self.ledger.commit(token)).await?;

                // The decrement is already durable; if this write cannot be
                // confirmed the outcome is unknown and stock must NOT be
                // re-credited, or a possibly-approved sale oversells.
                if let Err(err) = self.bounded(self.orders.insert(order.clone())).await {
                    tracing::error!(order = %order.id, error = %err, "paid order commit unconfirmed");
                    return Err(CheckoutError::UnknownOutcome(format!(
                        "payment approved but order {} could not be confirmed",
                        order.id
                    )));
                }

                tracing::info!(order = %order.id, total = %order.total_amount.value(), "order paid");
                Ok(order)
            }
            SettlementResult::Declined { reason } => {
                self.bounded(self.ledger.release(token)).await?;
                order.mark_failed()?;
                self.bounded(self.orders.insert(order.clone())).await?;
                tracing::warn!(order = %order.id, reason, "order declined");
                Err(CheckoutError::Declined(reason))
            }
            SettlementResult::ProviderUnavailable => {
                self.bounded(self.ledger.release(token)).await?;
                order.mark_failed()?;
                self.bounded(self.orders.insert(order.clone())).await?;
                tracing::warn!(order = %order.id, "provider unavailable");
                Err(CheckoutError::ProviderUnavailable)
            }
        }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.storage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CheckoutError::storage(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "storage operation timed out",
            ))),
        }
    }
}

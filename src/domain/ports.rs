use super::money::Amount;
use super::order::Order;
use super::payment::{ApiKey, PaymentProvider, SettlementResult, VendorPaymentSetting};
use super::product::Product;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handles to store implementations.
///
/// `Arc` rather than `Box` because the ledger and the checkout engine hold
/// the catalog port at the same time.
pub type CatalogStoreRef = Arc<dyn CatalogStore>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type PaymentSettingStoreRef = Arc<dyn PaymentSettingStore>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get(&self, product_id: Uuid) -> Result<Option<Product>>;
    async fn upsert(&self, product: Product) -> Result<()>;
    async fn all_products(&self) -> Result<Vec<Product>>;

    /// Atomically decrements stock, failing with `InsufficientStock` unless
    /// `stock >= quantity` and the product is active.
    ///
    /// This is the storage-level equivalent of
    /// `UPDATE products SET stock = stock - :q WHERE id = :id AND stock >= :q`;
    /// callers never read-then-write the stock value themselves.
    async fn decrement_stock(&self, product_id: Uuid, quantity: u32) -> Result<()>;

    /// Restores previously reserved units.
    async fn credit_stock(&self, product_id: Uuid, quantity: u32) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Appends a new order record. Terminal orders are never updated in
    /// place, so insert is the only write.
    async fn insert(&self, order: Order) -> Result<()>;
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>>;
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>>;
    async fn all_orders(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait PaymentSettingStore: Send + Sync {
    async fn put(&self, setting: VendorPaymentSetting) -> Result<()>;
    async fn get(&self, setting_id: Uuid) -> Result<Option<VendorPaymentSetting>>;
    /// All settings rows for a shop, newest first.
    async fn for_shop(&self, shop_id: Uuid) -> Result<Vec<VendorPaymentSetting>>;
}

/// Uniform capability over heterogeneous payment providers.
///
/// Implementations translate `settle` into their provider's request shape;
/// nothing provider-specific leaks past this trait.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn settle(
        &self,
        amount: Amount,
        currency: &str,
        credential: &ApiKey,
    ) -> Result<SettlementResult>;

    /// Which provider this adapter settles against.
    fn provider(&self) -> PaymentProvider;
}

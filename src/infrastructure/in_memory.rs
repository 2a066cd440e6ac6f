use crate::domain::order::Order;
use crate::domain::payment::VendorPaymentSetting;
use crate::domain::ports::{CatalogStore, OrderStore, PaymentSettingStore};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory product catalog.
///
/// The write lock is what makes `decrement_stock` a single atomic
/// check-and-subtract: concurrent buyers over the last unit serialize here.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get(&self, product_id: Uuid) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&product_id).cloned())
    }

    async fn upsert(&self, product: Product) -> Result<()> {
        let mut products = self.products.write().await;
        products.insert(product.id, product);
        Ok(())
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by_key(|p| p.created_at);
        Ok(all)
    }

    async fn decrement_stock(&self, product_id: Uuid, quantity: u32) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&product_id).ok_or(CheckoutError::NotFound)?;

        if !product.is_active || product.stock < quantity {
            return Err(CheckoutError::InsufficientStock);
        }
        product.stock -= quantity;
        Ok(())
    }

    async fn credit_stock(&self, product_id: Uuid, quantity: u32) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&product_id).ok_or(CheckoutError::NotFound)?;
        product.stock += quantity;
        Ok(())
    }
}

/// A thread-safe in-memory, append-only order store.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(CheckoutError::Validation(format!(
                "order {} already exists",
                order.id
            )));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, order_id: Uuid) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&order_id).cloned())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| o.created_at);
        Ok(all)
    }
}

/// A thread-safe in-memory store for vendor payment settings.
#[derive(Default, Clone)]
pub struct InMemoryPaymentSettings {
    settings: Arc<RwLock<HashMap<Uuid, VendorPaymentSetting>>>,
}

impl InMemoryPaymentSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentSettingStore for InMemoryPaymentSettings {
    async fn put(&self, setting: VendorPaymentSetting) -> Result<()> {
        let mut settings = self.settings.write().await;
        settings.insert(setting.id, setting);
        Ok(())
    }

    async fn get(&self, setting_id: Uuid) -> Result<Option<VendorPaymentSetting>> {
        let settings = self.settings.read().await;
        Ok(settings.get(&setting_id).cloned())
    }

    async fn for_shop(&self, shop_id: Uuid) -> Result<Vec<VendorPaymentSetting>> {
        let settings = self.settings.read().await;
        let mut rows: Vec<VendorPaymentSetting> = settings
            .values()
            .filter(|s| s.shop_id == shop_id)
            .cloned()
            .collect();
        // Newest first so "the" active credential is the latest configured.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Price;
    use crate::domain::payment::PaymentProvider;
    use rust_decimal_macros::dec;

    fn product(stock: u32) -> Product {
        Product::new(
            Uuid::new_v4(),
            "sticker pack",
            Price::new(dec!(3.50)).unwrap(),
            stock,
        )
    }

    #[tokio::test]
    async fn test_catalog_round_trip() {
        let catalog = InMemoryCatalog::new();
        let p = product(5);
        let id = p.id;

        catalog.upsert(p.clone()).await.unwrap();
        assert_eq!(catalog.get(id).await.unwrap().unwrap(), p);
        assert!(catalog.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decrement_stock_conditions() {
        let catalog = InMemoryCatalog::new();
        let p = product(2);
        let id = p.id;
        catalog.upsert(p).await.unwrap();

        catalog.decrement_stock(id, 2).await.unwrap();
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock, 0);

        assert!(matches!(
            catalog.decrement_stock(id, 1).await,
            Err(CheckoutError::InsufficientStock)
        ));
        assert!(matches!(
            catalog.decrement_stock(Uuid::new_v4(), 1).await,
            Err(CheckoutError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_credit_stock_restores() {
        let catalog = InMemoryCatalog::new();
        let p = product(1);
        let id = p.id;
        catalog.upsert(p).await.unwrap();

        catalog.decrement_stock(id, 1).await.unwrap();
        catalog.credit_stock(id, 1).await.unwrap();
        assert_eq!(catalog.get(id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_order_store_is_append_only() {
        let store = InMemoryOrderStore::new();
        let order = Order::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            Price::new(dec!(9.99)).unwrap(),
        );

        store.insert(order.clone()).await.unwrap();
        assert!(store.insert(order.clone()).await.is_err());
        assert_eq!(store.get(order.id).await.unwrap().unwrap(), order);
    }

    #[tokio::test]
    async fn test_order_idempotency_lookup() {
        let store = InMemoryOrderStore::new();
        let order = Order::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            Price::new(dec!(9.99)).unwrap(),
        )
        .with_idempotency_key(Some("retry-1".to_string()));

        store.insert(order.clone()).await.unwrap();
        let found = store.find_by_idempotency_key("retry-1").await.unwrap();
        assert_eq!(found.unwrap().id, order.id);
        assert!(store.find_by_idempotency_key("retry-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settings_for_shop_newest_first() {
        let store = InMemoryPaymentSettings::new();
        let shop = Uuid::new_v4();

        let older = VendorPaymentSetting::new(shop, PaymentProvider::Stripe, vec![1]);
        let mut newer = VendorPaymentSetting::new(shop, PaymentProvider::PayPal, vec![2]);
        newer.created_at = older.created_at + chrono::Duration::seconds(1);

        store.put(older.clone()).await.unwrap();
        store.put(newer.clone()).await.unwrap();
        store
            .put(VendorPaymentSetting::new(
                Uuid::new_v4(),
                PaymentProvider::Stripe,
                vec![3],
            ))
            .await
            .unwrap();

        let rows = store.for_shop(shop).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, newer.id);
        assert_eq!(rows[1].id, older.id);
    }
}

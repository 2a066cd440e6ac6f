use crate::domain::order::Order;
use crate::domain::payment::VendorPaymentSetting;
use crate::domain::ports::{CatalogStore, OrderStore, PaymentSettingStore};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Column family for product listings.
pub const CF_PRODUCTS: &str = "products";
/// Column family for order records.
pub const CF_ORDERS: &str = "orders";
/// Column family mapping idempotency keys to order ids.
pub const CF_ORDER_IDEM: &str = "order_idem";
/// Column family for vendor payment settings.
pub const CF_PAYMENT_SETTINGS: &str = "payment_settings";

/// A persistent store implementation using RocksDB.
///
/// One store serves all three ports over separate column families with JSON
/// values. `Clone` shares the underlying `Arc<DB>`.
///
/// RocksDB has no conditional update, so the stock read-modify-write is
/// serialized behind `stock_guard`; everything else is single-key writes or
/// one `WriteBatch`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    stock_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_PRODUCTS, CF_ORDERS, CF_ORDER_IDEM, CF_PAYMENT_SETTINGS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs).map_err(CheckoutError::storage)?;

        Ok(Self {
            db: Arc::new(db),
            stock_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            CheckoutError::storage(std::io::Error::other(format!(
                "column family {name} not found"
            )))
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let handle = self.cf(cf)?;
        match self.db.get_cf(handle, key).map_err(CheckoutError::storage)? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(CheckoutError::storage)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put_json<T: serde::Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let handle = self.cf(cf)?;
        let bytes = serde_json::to_vec(value).map_err(CheckoutError::storage)?;
        self.db
            .put_cf(handle, key, bytes)
            .map_err(CheckoutError::storage)
    }

    fn scan_json<T: serde::de::DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let handle = self.cf(cf)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(handle, IteratorMode::Start) {
            let (_key, value) = item.map_err(CheckoutError::storage)?;
            values.push(serde_json::from_slice(&value).map_err(CheckoutError::storage)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl CatalogStore for RocksDBStore {
    async fn get(&self, product_id: Uuid) -> Result<Option<Product>> {
        self.get_json(CF_PRODUCTS, product_id.as_bytes())
    }

    async fn upsert(&self, product: Product) -> Result<()> {
        self.put_json(CF_PRODUCTS, product.id.as_bytes(), &product)
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.scan_json(CF_PRODUCTS)?;
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    async fn decrement_stock(&self, product_id: Uuid, quantity: u32) -> Result<()> {
        let _guard = self.stock_guard.lock().expect("stock guard poisoned");

        let mut product: Product = self
            .get_json(CF_PRODUCTS, product_id.as_bytes())?
            .ok_or(CheckoutError::NotFound)?;

        if !product.is_active || product.stock < quantity {
            return Err(CheckoutError::InsufficientStock);
        }
        product.stock -= quantity;
        self.put_json(CF_PRODUCTS, product_id.as_bytes(), &product)
    }

    async fn credit_stock(&self, product_id: Uuid, quantity: u32) -> Result<()> {
        let _guard = self.stock_guard.lock().expect("stock guard poisoned");

        let mut product: Product = self
            .get_json(CF_PRODUCTS, product_id.as_bytes())?
            .ok_or(CheckoutError::NotFound)?;
        product.stock += quantity;
        self.put_json(CF_PRODUCTS, product_id.as_bytes(), &product)
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let orders = self.cf(CF_ORDERS)?;
        if self
            .db
            .get_pinned_cf(orders, order.id.as_bytes())
            .map_err(CheckoutError::storage)?
            .is_some()
        {
            return Err(CheckoutError::Validation(format!(
                "order {} already exists",
                order.id
            )));
        }

        // The order row and its idempotency index land atomically.
        let mut batch = WriteBatch::default();
        let bytes = serde_json::to_vec(&order).map_err(CheckoutError::storage)?;
        batch.put_cf(orders, order.id.as_bytes(), bytes);
        if let Some(key) = &order.idempotency_key {
            let idem = self.cf(CF_ORDER_IDEM)?;
            batch.put_cf(idem, key.as_bytes(), order.id.as_bytes());
        }
        self.db.write(batch).map_err(CheckoutError::storage)
    }

    async fn get(&self, order_id: Uuid) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, order_id.as_bytes())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>> {
        let idem = self.cf(CF_ORDER_IDEM)?;
        let Some(id_bytes) = self
            .db
            .get_cf(idem, key.as_bytes())
            .map_err(CheckoutError::storage)?
        else {
            return Ok(None);
        };
        let order_id = Uuid::from_slice(&id_bytes).map_err(CheckoutError::storage)?;
        self.get_json(CF_ORDERS, order_id.as_bytes())
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.scan_json(CF_ORDERS)?;
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }
}

#[async_trait]
impl PaymentSettingStore for RocksDBStore {
    async fn put(&self, setting: VendorPaymentSetting) -> Result<()> {
        self.put_json(CF_PAYMENT_SETTINGS, setting.id.as_bytes(), &setting)
    }

    async fn get(&self, setting_id: Uuid) -> Result<Option<VendorPaymentSetting>> {
        self.get_json(CF_PAYMENT_SETTINGS, setting_id.as_bytes())
    }

    async fn for_shop(&self, shop_id: Uuid) -> Result<Vec<VendorPaymentSetting>> {
        let mut rows: Vec<VendorPaymentSetting> = self.scan_json(CF_PAYMENT_SETTINGS)?;
        rows.retain(|s| s.shop_id == shop_id);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

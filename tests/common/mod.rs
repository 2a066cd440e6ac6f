use boutiq::application::checkout::{CheckoutConfig, CheckoutEngine, PurchaseRequest};
use boutiq::application::vault::{CredentialVault, MasterKey};
use boutiq::domain::money::Price;
use boutiq::domain::payment::PaymentProvider;
use boutiq::domain::ports::CatalogStore;
use boutiq::domain::product::Product;
use boutiq::infrastructure::gateway::GatewayRegistry;
use boutiq::infrastructure::in_memory::{
    InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentSettings,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct TestShop {
    pub catalog: Arc<InMemoryCatalog>,
    pub orders: Arc<InMemoryOrderStore>,
    pub settings: Arc<InMemoryPaymentSettings>,
    pub vault: CredentialVault,
    pub engine: Arc<CheckoutEngine>,
    pub shop_id: Uuid,
    pub product_id: Uuid,
}

/// One shop, one product, stripe credential configured, simulated gateway.
pub async fn shop_with_product(price: Decimal, stock: u32) -> TestShop {
    let catalog = Arc::new(InMemoryCatalog::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let settings = Arc::new(InMemoryPaymentSettings::new());
    let vault = CredentialVault::new(&MasterKey::derive("integration-test"), settings.clone());

    let shop_id = Uuid::new_v4();
    let product = Product::new(shop_id, "test product", Price::new(price).unwrap(), stock);
    let product_id = product.id;
    catalog.upsert(product).await.unwrap();

    vault
        .store(shop_id, PaymentProvider::Stripe, "sk_test_integration")
        .await
        .unwrap();

    let engine = Arc::new(CheckoutEngine::new(
        catalog.clone(),
        orders.clone(),
        vault.clone(),
        GatewayRegistry::simulated(Duration::from_millis(1)),
        CheckoutConfig::default(),
    ));

    TestShop {
        catalog,
        orders,
        settings,
        vault,
        engine,
        shop_id,
        product_id,
    }
}

pub fn purchase(product_id: Uuid, quantity: u32) -> PurchaseRequest {
    PurchaseRequest {
        customer_id: Uuid::new_v4(),
        product_id,
        quantity,
        idempotency_key: None,
    }
}

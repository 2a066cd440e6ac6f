use boutiq::application::checkout::{CheckoutConfig, CheckoutEngine};
use boutiq::application::vault::{CredentialVault, MasterKey};
use boutiq::domain::ports::{CatalogStoreRef, OrderStoreRef, PaymentSettingStoreRef};
use boutiq::infrastructure::gateway::GatewayRegistry;
use boutiq::infrastructure::in_memory::{
    InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentSettings,
};
use boutiq::interfaces::csv::catalog_reader::CatalogReader;
use boutiq::interfaces::csv::order_writer::OrderWriter;
use boutiq::interfaces::csv::purchase_reader::PurchaseReader;
use boutiq::interfaces::csv::settings_reader::SettingsReader;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Product catalog CSV file
    catalog: PathBuf,

    /// Purchase requests CSV file
    purchases: PathBuf,

    /// Vendor payment settings CSV file (shop_id, provider, api_key)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Passphrase the credential vault derives its encryption key from.
    #[arg(long, default_value = "boutiq-dev-master-key")]
    master_key: String,

    /// Fixed delay of the simulated payment gateway, in milliseconds.
    #[arg(long, default_value_t = 50)]
    settle_delay_ms: u64,
}

fn in_memory_stores() -> (CatalogStoreRef, OrderStoreRef, PaymentSettingStoreRef) {
    (
        Arc::new(InMemoryCatalog::new()),
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(InMemoryPaymentSettings::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (catalog, orders, settings) = match &cli.db_path {
        Some(db_path) => {
            #[cfg(feature = "storage-rocksdb")]
            {
                let store =
                    boutiq::infrastructure::rocksdb::RocksDBStore::open(db_path).into_diagnostic()?;
                let catalog: CatalogStoreRef = Arc::new(store.clone());
                let orders: OrderStoreRef = Arc::new(store.clone());
                let settings: PaymentSettingStoreRef = Arc::new(store);
                (catalog, orders, settings)
            }
            #[cfg(not(feature = "storage-rocksdb"))]
            {
                let _ = db_path;
                eprintln!(
                    "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
                );
                in_memory_stores()
            }
        }
        None => in_memory_stores(),
    };

    let vault = CredentialVault::new(&MasterKey::derive(&cli.master_key), settings);

    // Seed the catalog
    let file = File::open(&cli.catalog).into_diagnostic()?;
    for product in CatalogReader::new(file).products() {
        match product {
            Ok(product) => catalog.upsert(product).await.into_diagnostic()?,
            Err(e) => eprintln!("Error reading product: {}", e),
        }
    }

    // Seed vendor payment credentials through the vault
    if let Some(settings_path) = &cli.settings {
        let file = File::open(settings_path).into_diagnostic()?;
        for record in SettingsReader::new(file).settings() {
            match record {
                Ok(record) => {
                    vault
                        .store(record.shop_id, record.provider, &record.api_key)
                        .await
                        .into_diagnostic()?;
                }
                Err(e) => eprintln!("Error reading payment setting: {}", e),
            }
        }
    }

    let registry = GatewayRegistry::simulated(Duration::from_millis(cli.settle_delay_ms));
    let engine = CheckoutEngine::new(
        catalog,
        orders.clone(),
        vault,
        registry,
        CheckoutConfig::default(),
    );

    // Place orders
    let file = File::open(&cli.purchases).into_diagnostic()?;
    for request in PurchaseReader::new(file).purchases() {
        match request {
            Ok(request) => {
                if let Err(e) = engine.place_order(request).await {
                    eprintln!("Error placing order: {}", e);
                }
            }
            Err(e) => eprintln!("Error reading purchase: {}", e),
        }
    }

    // Output all recorded orders (paid and failed)
    let recorded = orders.all_orders().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer.write_orders(recorded).into_diagnostic()?;

    Ok(())
}

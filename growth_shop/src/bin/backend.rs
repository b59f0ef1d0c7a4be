use std::sync::Arc;

use anyhow::anyhow;
use common::config::{Config, Role};
use growth_shop::{catalog_data::default_catalog, sea_orm_storage::SeaOrmStorage};
use storefront::{
    api::{AppState, StorageSet},
    executable_utils::{initialize_executable, initialize_tracing, install_metrics, run_backend},
    notify::LogNotifier,
    payment::stripe::StripeGateway,
    storage::MemoryStorage,
};

async fn open_storage(database_url: &str) -> anyhow::Result<StorageSet> {
    if database_url.starts_with("memory://") {
        tracing::warn!("Using in-memory storage, nothing survives a restart");
        let storage = Arc::new(MemoryStorage::new());
        return Ok(StorageSet {
            carts: storage.clone(),
            orders: storage.clone(),
            loyalty: storage,
        });
    }
    let storage = Arc::new(SeaOrmStorage::connect(database_url).await.map_err(|e| anyhow!(e))?);
    Ok(StorageSet {
        carts: storage.clone(),
        orders: storage.clone(),
        loyalty: storage,
    })
}

fn operator_email(config: &Config) -> String {
    config
        .auth
        .tokens
        .iter()
        .find(|token| token.role == Role::Admin)
        .map(|token| token.email.clone())
        .unwrap_or_else(|| format!("operator@{}", config.common.project_name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Starting backend...");
    let config = initialize_executable().map_err(|e| anyhow!(e))?;
    initialize_tracing(&config.backend.log_level);
    let metrics = install_metrics().map_err(|e| anyhow!(e))?;

    if config.payment.secret_key.is_empty() {
        tracing::warn!("No payment secret key configured, checkout will fail at the gateway");
    }
    let storage = open_storage(&config.common.database_url).await?;
    let catalog = Arc::new(default_catalog());
    tracing::info!(services = catalog.len(), "Loaded service catalog");

    let state = AppState::new(
        &config,
        catalog,
        storage,
        Arc::new(StripeGateway::new(config.payment.clone())),
        Arc::new(LogNotifier::new(operator_email(&config))),
    )
    .with_metrics(metrics);

    run_backend(config.backend.clone(), state)
        .await
        .map_err(|e| anyhow!(e))
}

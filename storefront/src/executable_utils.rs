use clap::Parser;
use common::config::{BackendConfig, Config};
use http::{header, HeaderValue, Method};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::error::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{router, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "target/debug/config/total_config.yaml")]
    pub config: String,
}

/// Loads `.env`, the config file named on the command line, then environment overrides.
pub fn initialize_executable() -> Result<Config, Box<dyn Error + Send + Sync>> {
    if let Err(e) = dotenvy::dotenv() {
        println!("No .env file loaded: {}", e);
    }

    let args = Args::parse();
    println!("Loading config from: {}", args.config);
    let mut config = Config::load(&args.config)?;
    config.apply_env_overrides();
    config.validate()?;
    println!(
        "Loaded config for project {} listening on {}",
        config.common.project_name, config.backend.server_address
    );
    Ok(config)
}

pub fn initialize_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn install_metrics() -> Result<PrometheusHandle, Box<dyn Error + Send + Sync>> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

fn cors_layer(config: &BackendConfig) -> Result<CorsLayer, Box<dyn Error + Send + Sync>> {
    let origin = config.allowed_origin.as_deref().unwrap_or("http://localhost:5173");
    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers(Any))
}

pub async fn run_backend(config: BackendConfig, state: AppState) -> Result<(), Box<dyn Error + Send + Sync>> {
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    tracing::info!("Starting storefront backend at {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod analysis;
mod config;
mod errors;
mod leaderboard;
mod llm_client;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{BackupConfig, Config};
use crate::llm_client::{GeminiClient, ModelInvoker, RetryingInvoker};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::BackupStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{}={}", crate_target, &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireEdge API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model client (explicitly injected — never a global)
    let invoker = build_invoker(&config);
    match &invoker {
        Some(_) => info!("model client initialized (model: {})", config.gemini_model),
        None => warn!("GEMINI_API_KEY not set; analysis requests will fail until configured"),
    }

    // Initialize the optional backup store
    let backup = match &config.backup {
        Some(backup_config) => {
            let s3 = build_s3_client(backup_config).await;
            info!("backup store initialized (bucket: {})", backup_config.s3_bucket);
            Some(Arc::new(BackupStore::new(
                s3,
                backup_config.s3_bucket.clone(),
            )))
        }
        None => {
            info!("backup store not configured; uploads will not be archived");
            None
        }
    };

    // Build app state
    let state = AppState {
        invoker,
        backup,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // operator UI is served from another origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the model invoker, wrapping it in the retry decorator only when
/// retries are configured. The base client never retries on its own.
fn build_invoker(config: &Config) -> Option<Arc<dyn ModelInvoker>> {
    let api_key = config.gemini_api_key.clone()?;
    let client = GeminiClient::new(api_key, config.gemini_model.clone());
    if config.model_max_retries > 0 {
        Some(Arc::new(RetryingInvoker::new(
            client,
            config.model_max_retries,
        )))
    } else {
        Some(Arc::new(client))
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(backup: &BackupConfig) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &backup.aws_access_key_id,
        &backup.aws_secret_access_key,
        None,
        None,
        "hireedge-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&backup.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

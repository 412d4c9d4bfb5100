use axum::{Router, http::HeaderValue};
use http::{Method, header};
use smartsplit::{
    api::{
        handlers::{AppService, api_routes},
        openapi::ApiDoc,
    },
    config::CONFIG,
    infrastructure::{
        cache::in_memory::InMemoryCache, logging::in_memory::InMemoryChangeLog, storage::in_memory::InMemoryStorage,
    },
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Starting SmartSplit with {:?}", *CONFIG);
    if !CONFIG.database_url.starts_with("memory://") {
        warn!("Only the in-memory backend is available; DATABASE_URL is ignored");
    }

    let storage = InMemoryStorage::new();
    let logging = InMemoryChangeLog::new();
    let cache = InMemoryCache::new();
    let service: Arc<AppService> = Arc::new(AppService::new(
        storage,
        logging,
        cache,
        CONFIG.jwt_secret.clone(),
        CONFIG.access_token_expire_minutes,
    ));

    let origins: Vec<HeaderValue> = CONFIG
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let app = Router::new()
        .nest("/api", api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

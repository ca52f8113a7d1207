use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod registration;
mod routes;
mod storage;

use config::Config;
use registration::store::{PgRegistrationStore, RegistrationStore};
use storage::supabase::SupabaseStore;
use storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub store: Arc<dyn RegistrationStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub config: Arc<Config>,
}

/// CORS restricted to the configured origins; `*` anywhere in the list opens
/// it up entirely.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let registration_routes = Router::new()
        .route("/", post(routes::register::submit_registration))
        .route("/mine", get(routes::register::my_registration))
        // Seven roster slots with picture + document each, plus two logos.
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    Router::new()
        .nest("/api/v1/registrations", registration_routes)
        .route("/health", get(routes::health::health))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    let pool = db::create_pool(&config).await;
    let store: Arc<dyn RegistrationStore> = Arc::new(PgRegistrationStore::new(pool.clone()));
    let objects: Arc<dyn ObjectStore> = Arc::new(SupabaseStore::new(&config.storage));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, "Campus Clash registration API initialized");

    let state = AppState {
        db: pool,
        store,
        objects,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, build_router(state))
        .await
        .expect("Server error");
}

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use configuration::DatabaseSettings;
use database::DbRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};
use tracing;

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db_repo: DbRepository,
}

/// Builds the application router over an already-constructed state.
///
/// Split out from `run_server` so integration tests can drive the exact
/// production routing against an in-memory database.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/health", get(handlers::healthcheck))
        .route("/accounts/import", post(handlers::import_accounts))
        .route("/accounts", get(handlers::list_accounts))
        .route("/accounts/reset", post(handlers::reset_accounts))
        .route("/metrics/revenue", get(handlers::revenue_metrics))
        .route("/metrics/cohorts", get(handlers::cohort_retention))
        .route("/churn/predictions", get(handlers::churn_predictions))
        .route("/alerts/high-risk", get(handlers::high_risk_alerts))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024 * 10)) // 10MB import batches
}

/// The main function to configure and run the web server.
///
/// `DATABASE_URL` in the environment wins over the configured URL, matching
/// how deployments point the service at their own store.
pub async fn run_server(addr: SocketAddr, db: &DatabaseSettings) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| db.url.clone());
    let db_pool = database::connect_with(&database_url, db.max_connections).await?;
    database::run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let state = Arc::new(AppState { db_repo });
    let router = app(state);

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

use crate::{error::AppError, AppState};
use analytics::{AnalyticsEngine, ChurnPrediction, CohortReport, RevenueMetrics, RiskAlert};
use axum::{extract::State, Json};
use chrono::Utc;
use core_types::{Account, AccountRecord};
use database::ImportSummary;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// An import batch as posted by the caller.
#[derive(Debug, Deserialize)]
pub struct ImportAccountsRequest {
    pub accounts: Vec<AccountRecord>,
}

/// Wrapper demanded by the alerts wire format: `{"alerts": [...]}`.
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<RiskAlert>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub deleted: u64,
}

/// # GET /health
pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// # POST /accounts/import
/// Validates the batch, then reconciles it against the stored accounts.
/// Field-level validation rejects the whole request before any row is
/// written, so a 422 never leaves a partial batch behind.
pub async fn import_accounts(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportAccountsRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    for record in &payload.accounts {
        record.validate()?;
    }
    let summary = state.db_repo.upsert_accounts(&payload.accounts).await?;
    tracing::info!(
        inserted = summary.inserted,
        updated = summary.updated,
        "Account import applied."
    );
    Ok(Json(summary))
}

/// # GET /accounts
/// Fetches all accounts in creation order.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.db_repo.get_all_accounts().await?;
    Ok(Json(accounts))
}

/// # GET /metrics/revenue
pub async fn revenue_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RevenueMetrics>, AppError> {
    let accounts = state.db_repo.get_all_accounts().await?;
    let engine = AnalyticsEngine::new();
    Ok(Json(engine.revenue_metrics(&accounts)))
}

/// # GET /metrics/cohorts
pub async fn cohort_retention(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CohortReport>>, AppError> {
    let accounts = state.db_repo.get_all_accounts().await?;
    let engine = AnalyticsEngine::new();
    Ok(Json(engine.cohort_retention(&accounts)))
}

/// # GET /churn/predictions
/// Scores every account against today's date, highest risk first.
pub async fn churn_predictions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChurnPrediction>>, AppError> {
    let accounts = state.db_repo.get_all_accounts().await?;
    let engine = AnalyticsEngine::new();
    let today = Utc::now().date_naive();
    Ok(Json(engine.churn_predictions(&accounts, today)))
}

/// # GET /alerts/high-risk
pub async fn high_risk_alerts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlertsResponse>, AppError> {
    let accounts = state.db_repo.get_all_accounts().await?;
    let engine = AnalyticsEngine::new();
    let today = Utc::now().date_naive();
    let alerts = engine.high_risk_alerts(&accounts, today);
    Ok(Json(AlertsResponse { alerts }))
}

/// # POST /accounts/reset
/// Bulk delete of the whole account base.
pub async fn reset_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, AppError> {
    let deleted = state.db_repo.delete_all_accounts().await?;
    tracing::info!(deleted, "Account base reset.");
    Ok(Json(ResetResponse { deleted }))
}

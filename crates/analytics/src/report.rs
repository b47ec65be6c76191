use core_types::RiskBand;
use serde::{Deserialize, Serialize};

/// Aggregate revenue picture across the whole account base.
///
/// This struct is the final output of `AnalyticsEngine::revenue_metrics` and
/// serves as the data transfer object for the revenue endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    pub total_accounts: usize,
    pub active_accounts: usize,
    pub canceled_accounts: usize,
    /// Sum of MRR over the active set (active + past_due), rounded to 2 dp.
    pub mrr: f64,
    /// Annualized recurring revenue, MRR x 12.
    pub arr: f64,
    /// MRR / active_accounts, or 0.0 when there are no active accounts.
    pub avg_mrr_per_account: f64,
}

/// Retention summary for the accounts that started in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    /// Cohort key in "YYYY-MM" form; lexicographic order is chronological.
    pub cohort_month: String,
    pub accounts_in_cohort: usize,
    pub active_accounts: usize,
    /// active / total, rounded to 3 dp; 0.0 for an empty cohort.
    pub retention_rate: f64,
}

/// A scored account as exposed by the churn predictions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnPrediction {
    pub account_id: i64,
    pub external_id: String,
    pub account_name: String,
    pub churn_risk_score: f64,
    pub risk_band: RiskBand,
}

/// An actionable alert for a non-canceled account in the high risk band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub account_id: i64,
    pub external_id: String,
    pub account_name: String,
    pub mrr: f64,
    pub score: f64,
    pub recommended_action: String,
}

use crate::enums::{AccountStatus, BillingCycle};
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A stored customer account, as read back from the `customer_accounts` table.
///
/// `id` is the storage-assigned creation sequence; `external_id` is the
/// caller-facing unique key that imports are reconciled against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub external_id: String,
    pub account_name: String,
    pub mrr: f64,
    pub billing_cycle: BillingCycle,
    pub status: AccountStatus,
    pub started_at: NaiveDate,
    pub last_active_at: NaiveDate,
    pub support_tickets_30d: i64,
    pub payment_failures_90d: i64,
    pub nps_score: i64,
    pub created_at: DateTime<Utc>,
}

/// An incoming account record from an import batch.
///
/// This is the full set of mutable fields; an import either inserts a new
/// row or overwrites all of these on the row with the same `external_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub external_id: String,
    pub account_name: String,
    pub mrr: f64,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub status: AccountStatus,
    pub started_at: NaiveDate,
    pub last_active_at: NaiveDate,
    pub support_tickets_30d: i64,
    pub payment_failures_90d: i64,
    pub nps_score: i64,
}

impl AccountRecord {
    /// Checks the field-level constraints that ingestion must enforce before
    /// any record reaches storage or the analytics engine.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.external_id.len() < 2 || self.external_id.len() > 80 {
            return Err(CoreError::InvalidInput(
                "external_id".to_string(),
                "must be between 2 and 80 characters".to_string(),
            ));
        }
        if self.account_name.len() < 2 || self.account_name.len() > 200 {
            return Err(CoreError::InvalidInput(
                "account_name".to_string(),
                "must be between 2 and 200 characters".to_string(),
            ));
        }
        if self.mrr <= 0.0 || !self.mrr.is_finite() {
            return Err(CoreError::InvalidInput(
                "mrr".to_string(),
                "must be a positive amount".to_string(),
            ));
        }
        if self.support_tickets_30d < 0 {
            return Err(CoreError::InvalidInput(
                "support_tickets_30d".to_string(),
                "must not be negative".to_string(),
            ));
        }
        if self.payment_failures_90d < 0 {
            return Err(CoreError::InvalidInput(
                "payment_failures_90d".to_string(),
                "must not be negative".to_string(),
            ));
        }
        if !(0..=10).contains(&self.nps_score) {
            return Err(CoreError::InvalidInput(
                "nps_score".to_string(),
                "must be between 0 and 10".to_string(),
            ));
        }
        Ok(())
    }
}

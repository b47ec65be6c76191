use crate::report::{ChurnPrediction, CohortReport, RevenueMetrics, RiskAlert};
use chrono::NaiveDate;
use core_types::{Account, AccountStatus, RiskBand};
use std::collections::BTreeMap;

/// Days of inactivity at which the inactivity term saturates.
const INACTIVITY_WINDOW_DAYS: f64 = 60.0;
/// Trailing-30d ticket count at which the support-load term saturates.
const TICKET_SATURATION: f64 = 12.0;
/// Trailing-90d payment failure count at which the payment term saturates.
const FAILURE_SATURATION: f64 = 3.0;
/// NPS at or above this contributes no penalty.
const NPS_NEUTRAL: i64 = 6;

const INACTIVITY_WEIGHT: f64 = 0.40;
const TICKET_WEIGHT: f64 = 0.20;
const PAYMENT_WEIGHT: f64 = 0.25;
const NPS_WEIGHT: f64 = 0.15;

/// Action attached to every high-risk alert. Deliberately a fixed literal;
/// the alert list flags who to reach, not what is driving the score.
pub const RECOMMENDED_ACTION: &str =
    "Schedule CSM outreach and review billing health within 24h.";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A stateless calculator for deriving revenue and churn metrics from a
/// snapshot of the account base.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heuristic churn risk for one account, in [0, 100].
    ///
    /// A canceled account is terminal risk and scores 100 unconditionally.
    /// Otherwise four normalized factors are clamped to [0, 1], weighted,
    /// summed, and scaled to a percentage rounded to 2 decimal places.
    pub fn churn_risk_score(&self, account: &Account, today: NaiveDate) -> f64 {
        if account.status == AccountStatus::Canceled {
            return 100.0;
        }

        // Activity dates in the future count as zero days inactive.
        let days_inactive = (today - account.last_active_at).num_days().max(0) as f64;

        let inactivity = (days_inactive / INACTIVITY_WINDOW_DAYS).min(1.0) * INACTIVITY_WEIGHT;
        let ticket_load =
            (account.support_tickets_30d as f64 / TICKET_SATURATION).min(1.0) * TICKET_WEIGHT;
        let payment_risk =
            (account.payment_failures_90d as f64 / FAILURE_SATURATION).min(1.0) * PAYMENT_WEIGHT;
        let nps_penalty = ((NPS_NEUTRAL - account.nps_score).max(0) as f64 / NPS_NEUTRAL as f64)
            .min(1.0)
            * NPS_WEIGHT;

        round2((inactivity + ticket_load + payment_risk + nps_penalty) * 100.0)
    }

    /// Buckets a score into its risk band. Boundaries are exactly 40 and 70.
    pub fn risk_band(&self, score: f64) -> RiskBand {
        if score >= 70.0 {
            RiskBand::High
        } else if score >= 40.0 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    /// Aggregate revenue metrics over the whole account base.
    pub fn revenue_metrics(&self, accounts: &[Account]) -> RevenueMetrics {
        let total_accounts = accounts.len();
        let active_accounts = accounts
            .iter()
            .filter(|a| a.status.is_revenue_active())
            .count();
        let canceled_accounts = accounts
            .iter()
            .filter(|a| a.status == AccountStatus::Canceled)
            .count();

        let mrr = round2(
            accounts
                .iter()
                .filter(|a| a.status.is_revenue_active())
                .map(|a| a.mrr)
                .sum(),
        );
        let arr = round2(mrr * 12.0);
        let avg_mrr_per_account = if active_accounts > 0 {
            round2(mrr / active_accounts as f64)
        } else {
            0.0
        };

        RevenueMetrics {
            total_accounts,
            active_accounts,
            canceled_accounts,
            mrr,
            arr,
            avg_mrr_per_account,
        }
    }

    /// Retention by start-month cohort, ascending by cohort key.
    pub fn cohort_retention(&self, accounts: &[Account]) -> Vec<CohortReport> {
        let mut cohorts: BTreeMap<String, Vec<&Account>> = BTreeMap::new();
        for account in accounts {
            cohorts
                .entry(account.started_at.format("%Y-%m").to_string())
                .or_default()
                .push(account);
        }

        cohorts
            .into_iter()
            .map(|(cohort_month, members)| {
                let accounts_in_cohort = members.len();
                let active_accounts = members
                    .iter()
                    .filter(|a| a.status.is_revenue_active())
                    .count();
                let retention_rate = if accounts_in_cohort > 0 {
                    round3(active_accounts as f64 / accounts_in_cohort as f64)
                } else {
                    0.0
                };
                CohortReport {
                    cohort_month,
                    accounts_in_cohort,
                    active_accounts,
                    retention_rate,
                }
            })
            .collect()
    }

    /// Scores every account, highest risk first.
    pub fn churn_predictions(
        &self,
        accounts: &[Account],
        today: NaiveDate,
    ) -> Vec<ChurnPrediction> {
        let mut predictions: Vec<ChurnPrediction> = accounts
            .iter()
            .map(|account| {
                let score = self.churn_risk_score(account, today);
                ChurnPrediction {
                    account_id: account.id,
                    external_id: account.external_id.clone(),
                    account_name: account.account_name.clone(),
                    churn_risk_score: score,
                    risk_band: self.risk_band(score),
                }
            })
            .collect();
        predictions.sort_by(|a, b| b.churn_risk_score.total_cmp(&a.churn_risk_score));
        predictions
    }

    /// Alerts for accounts in the high band that are still salvageable.
    ///
    /// Canceled accounts score 100 but are excluded: an alert represents
    /// actionable risk, not an already-lost account.
    pub fn high_risk_alerts(&self, accounts: &[Account], today: NaiveDate) -> Vec<RiskAlert> {
        let mut alerts: Vec<RiskAlert> = accounts
            .iter()
            .filter(|account| account.status != AccountStatus::Canceled)
            .filter_map(|account| {
                let score = self.churn_risk_score(account, today);
                if self.risk_band(score) != RiskBand::High {
                    return None;
                }
                Some(RiskAlert {
                    account_id: account.id,
                    external_id: account.external_id.clone(),
                    account_name: account.account_name.clone(),
                    mrr: account.mrr,
                    score,
                    recommended_action: RECOMMENDED_ACTION.to_string(),
                })
            })
            .collect();
        alerts.sort_by(|a, b| b.score.total_cmp(&a.score));
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::BillingCycle;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn account(external_id: &str, status: AccountStatus) -> Account {
        Account {
            id: 1,
            external_id: external_id.to_string(),
            account_name: format!("{external_id} Corp"),
            mrr: 1000.0,
            billing_cycle: BillingCycle::Monthly,
            status,
            started_at: today() - Duration::days(220),
            last_active_at: today(),
            support_tickets_30d: 0,
            payment_failures_90d: 0,
            nps_score: 8,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn canceled_account_is_terminal_risk() {
        let engine = AnalyticsEngine::new();
        let mut acc = account("acc_x", AccountStatus::Canceled);
        // Otherwise-healthy signals must not matter.
        acc.last_active_at = today();
        acc.nps_score = 10;

        let score = engine.churn_risk_score(&acc, today());
        assert_eq!(score, 100.0);
        assert_eq!(engine.risk_band(score), RiskBand::High);
    }

    #[test]
    fn band_boundaries_are_40_and_70() {
        let engine = AnalyticsEngine::new();
        assert_eq!(engine.risk_band(39.99), RiskBand::Low);
        assert_eq!(engine.risk_band(40.0), RiskBand::Medium);
        assert_eq!(engine.risk_band(69.99), RiskBand::Medium);
        assert_eq!(engine.risk_band(70.0), RiskBand::High);
        assert_eq!(engine.risk_band(0.0), RiskBand::Low);
        assert_eq!(engine.risk_band(100.0), RiskBand::High);
    }

    #[test]
    fn score_matches_weighted_formula() {
        let engine = AnalyticsEngine::new();

        // Healthy active account: mild inactivity and ticket terms only.
        let mut acc = account("acc_001", AccountStatus::Active);
        acc.last_active_at = today() - Duration::days(5);
        acc.support_tickets_30d = 1;
        acc.nps_score = 9;
        assert_eq!(engine.churn_risk_score(&acc, today()), 5.0);

        // Struggling past_due account: saturated inactivity, heavy tickets,
        // failures, detractor NPS.
        let mut acc = account("acc_002", AccountStatus::PastDue);
        acc.last_active_at = today() - Duration::days(80);
        acc.support_tickets_30d = 11;
        acc.payment_failures_90d = 2;
        acc.nps_score = 2;
        assert_eq!(engine.churn_risk_score(&acc, today()), 85.0);
    }

    #[test]
    fn score_saturates_at_100_for_non_canceled() {
        let engine = AnalyticsEngine::new();
        let mut acc = account("acc_max", AccountStatus::Active);
        acc.last_active_at = today() - Duration::days(3650);
        acc.support_tickets_30d = 500;
        acc.payment_failures_90d = 40;
        acc.nps_score = 0;
        assert_eq!(engine.churn_risk_score(&acc, today()), 100.0);
    }

    #[test]
    fn future_activity_counts_as_zero_days_inactive() {
        let engine = AnalyticsEngine::new();
        let mut future = account("acc_f", AccountStatus::Active);
        future.last_active_at = today() + Duration::days(10);
        let mut current = account("acc_c", AccountStatus::Active);
        current.last_active_at = today();
        assert_eq!(
            engine.churn_risk_score(&future, today()),
            engine.churn_risk_score(&current, today())
        );
    }

    #[test]
    fn score_is_monotone_in_each_factor() {
        let engine = AnalyticsEngine::new();
        let base = account("acc_m", AccountStatus::Active);

        let mut prev = engine.churn_risk_score(&base, today());
        for days in [10, 30, 60, 90] {
            let mut acc = base.clone();
            acc.last_active_at = today() - Duration::days(days);
            let score = engine.churn_risk_score(&acc, today());
            assert!(score >= prev, "inactivity {days}d: {score} < {prev}");
            prev = score;
        }

        let mut prev = engine.churn_risk_score(&base, today());
        for tickets in [2, 6, 12, 20] {
            let mut acc = base.clone();
            acc.support_tickets_30d = tickets;
            let score = engine.churn_risk_score(&acc, today());
            assert!(score >= prev, "tickets {tickets}: {score} < {prev}");
            prev = score;
        }

        let mut prev = engine.churn_risk_score(&base, today());
        for failures in [1, 2, 3, 5] {
            let mut acc = base.clone();
            acc.payment_failures_90d = failures;
            let score = engine.churn_risk_score(&acc, today());
            assert!(score >= prev, "failures {failures}: {score} < {prev}");
            prev = score;
        }

        // Non-increasing in NPS.
        let mut prev = f64::MAX;
        for nps in 0..=10 {
            let mut acc = base.clone();
            acc.nps_score = nps;
            let score = engine.churn_risk_score(&acc, today());
            assert!(score <= prev, "nps {nps}: {score} > {prev}");
            prev = score;
        }
    }

    #[test]
    fn revenue_metrics_over_mixed_statuses() {
        let engine = AnalyticsEngine::new();
        let mut a = account("acc_001", AccountStatus::Active);
        a.mrr = 1000.0;
        let mut b = account("acc_002", AccountStatus::PastDue);
        b.mrr = 2000.0;
        let mut c = account("acc_003", AccountStatus::Canceled);
        c.mrr = 1500.0;

        let metrics = engine.revenue_metrics(&[a, b, c]);
        assert_eq!(metrics.total_accounts, 3);
        assert_eq!(metrics.active_accounts, 2);
        assert_eq!(metrics.canceled_accounts, 1);
        assert_eq!(metrics.mrr, 3000.0);
        assert_eq!(metrics.arr, 36000.0);
        assert_eq!(metrics.avg_mrr_per_account, 1500.0);
    }

    #[test]
    fn revenue_metrics_with_no_active_accounts() {
        let engine = AnalyticsEngine::new();
        let canceled = account("acc_gone", AccountStatus::Canceled);
        let metrics = engine.revenue_metrics(&[canceled]);
        assert_eq!(metrics.active_accounts, 0);
        assert_eq!(metrics.mrr, 0.0);
        assert_eq!(metrics.avg_mrr_per_account, 0.0);

        let empty = engine.revenue_metrics(&[]);
        assert_eq!(empty.total_accounts, 0);
        assert_eq!(empty.avg_mrr_per_account, 0.0);
    }

    #[test]
    fn cohorts_group_by_start_month_ascending() {
        let engine = AnalyticsEngine::new();
        let mut a = account("acc_001", AccountStatus::Active);
        a.started_at = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let mut b = account("acc_002", AccountStatus::Canceled);
        b.started_at = NaiveDate::from_ymd_opt(2025, 7, 21).unwrap();
        let mut c = account("acc_003", AccountStatus::PastDue);
        c.started_at = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();

        let report = engine.cohort_retention(&[a, b, c]);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].cohort_month, "2024-12");
        assert_eq!(report[0].accounts_in_cohort, 1);
        assert_eq!(report[0].retention_rate, 1.0);
        assert_eq!(report[1].cohort_month, "2025-07");
        assert_eq!(report[1].accounts_in_cohort, 2);
        assert_eq!(report[1].active_accounts, 1);
        assert_eq!(report[1].retention_rate, 0.5);
    }

    #[test]
    fn retention_rate_rounds_to_three_places() {
        let engine = AnalyticsEngine::new();
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let mut accounts = Vec::new();
        for i in 0..3 {
            let status = if i == 0 {
                AccountStatus::Active
            } else {
                AccountStatus::Canceled
            };
            let mut acc = account(&format!("acc_{i:03}"), status);
            acc.started_at = start;
            accounts.push(acc);
        }
        let report = engine.cohort_retention(&accounts);
        assert_eq!(report[0].cohort_month, "2025-05");
        assert_eq!(report[0].retention_rate, 0.333);
    }

    #[test]
    fn predictions_are_sorted_by_descending_score() {
        let engine = AnalyticsEngine::new();
        let mut risky = account("acc_risky", AccountStatus::PastDue);
        risky.last_active_at = today() - Duration::days(80);
        risky.support_tickets_30d = 11;
        risky.payment_failures_90d = 2;
        risky.nps_score = 2;
        let healthy = account("acc_ok", AccountStatus::Active);
        let gone = account("acc_gone", AccountStatus::Canceled);

        let predictions = engine.churn_predictions(&[healthy, risky, gone], today());
        assert_eq!(predictions[0].external_id, "acc_gone");
        assert_eq!(predictions[0].churn_risk_score, 100.0);
        assert_eq!(predictions[1].external_id, "acc_risky");
        assert_eq!(predictions[2].external_id, "acc_ok");
        assert!(predictions
            .windows(2)
            .all(|w| w[0].churn_risk_score >= w[1].churn_risk_score));
    }

    #[test]
    fn alerts_exclude_canceled_and_sub_high_accounts() {
        let engine = AnalyticsEngine::new();
        let mut risky = account("acc_risky", AccountStatus::PastDue);
        risky.last_active_at = today() - Duration::days(80);
        risky.support_tickets_30d = 11;
        risky.payment_failures_90d = 2;
        risky.nps_score = 2;
        let healthy = account("acc_ok", AccountStatus::Active);
        let gone = account("acc_gone", AccountStatus::Canceled);

        let alerts = engine.high_risk_alerts(&[gone, healthy, risky], today());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].external_id, "acc_risky");
        assert_eq!(alerts[0].recommended_action, RECOMMENDED_ACTION);
    }

    #[test]
    fn cohort_key_uses_zero_padded_months() {
        let engine = AnalyticsEngine::new();
        let mut acc = account("acc_pad", AccountStatus::Active);
        acc.started_at = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let report = engine.cohort_retention(std::slice::from_ref(&acc));
        assert_eq!(report[0].cohort_month, "2025-03");
    }
}

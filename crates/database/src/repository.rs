use crate::DbError;
use chrono::Utc;
use core_types::{Account, AccountRecord};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

/// The outcome of reconciling one import batch against the stored accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: u64,
    pub updated: u64,
    pub total: u64,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetches every stored account, ordered by creation sequence.
    pub async fn get_all_accounts(&self) -> Result<Vec<Account>, DbError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, external_id, account_name, mrr, billing_cycle, status,
                   started_at, last_active_at, support_tickets_30d,
                   payment_failures_90d, nps_score, created_at
            FROM customer_accounts
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    /// Point lookup by the caller-facing unique key.
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Account>, DbError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, external_id, account_name, mrr, billing_cycle, status,
                   started_at, last_active_at, support_tickets_30d,
                   payment_failures_90d, nps_score, created_at
            FROM customer_accounts
            WHERE external_id = ?1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Reconciles an import batch against the stored accounts.
    ///
    /// Records whose `external_id` already exists overwrite every mutable
    /// field in place; the rest are inserted. The whole batch runs in one
    /// transaction, so concurrent imports resolve as last-writer-wins at the
    /// storage isolation level.
    pub async fn upsert_accounts(&self, records: &[AccountRecord]) -> Result<ImportSummary, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        let mut updated = 0u64;

        for record in records {
            let existing: Option<i64> =
                sqlx::query_scalar("SELECT id FROM customer_accounts WHERE external_id = ?1")
                    .bind(&record.external_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            match existing {
                Some(id) => {
                    sqlx::query(
                        r#"
                        UPDATE customer_accounts SET
                            account_name = ?1, mrr = ?2, billing_cycle = ?3,
                            status = ?4, started_at = ?5, last_active_at = ?6,
                            support_tickets_30d = ?7, payment_failures_90d = ?8,
                            nps_score = ?9
                        WHERE id = ?10
                        "#,
                    )
                    .bind(&record.account_name)
                    .bind(record.mrr)
                    .bind(record.billing_cycle)
                    .bind(record.status)
                    .bind(record.started_at)
                    .bind(record.last_active_at)
                    .bind(record.support_tickets_30d)
                    .bind(record.payment_failures_90d)
                    .bind(record.nps_score)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                    updated += 1;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO customer_accounts (
                            external_id, account_name, mrr, billing_cycle, status,
                            started_at, last_active_at, support_tickets_30d,
                            payment_failures_90d, nps_score, created_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                        "#,
                    )
                    .bind(&record.external_id)
                    .bind(&record.account_name)
                    .bind(record.mrr)
                    .bind(record.billing_cycle)
                    .bind(record.status)
                    .bind(record.started_at)
                    .bind(record.last_active_at)
                    .bind(record.support_tickets_30d)
                    .bind(record.payment_failures_90d)
                    .bind(record.nps_score)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await?;
                    inserted += 1;
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(inserted, updated, "Import batch reconciled.");

        Ok(ImportSummary {
            inserted,
            updated,
            total: records.len() as u64,
        })
    }

    /// Deletes every stored account and returns how many rows went away.
    pub async fn delete_all_accounts(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM customer_accounts")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{connect_with, run_migrations};
    use chrono::NaiveDate;
    use core_types::{AccountStatus, BillingCycle};

    async fn test_repo() -> DbRepository {
        let pool = connect_with("sqlite::memory:", 1)
            .await
            .expect("in-memory pool");
        run_migrations(&pool).await.expect("migrations");
        DbRepository::new(pool)
    }

    fn record(external_id: &str, mrr: f64) -> AccountRecord {
        AccountRecord {
            external_id: external_id.to_string(),
            account_name: format!("{external_id} Inc"),
            mrr,
            billing_cycle: BillingCycle::Monthly,
            status: AccountStatus::Active,
            started_at: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            last_active_at: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            support_tickets_30d: 2,
            payment_failures_90d: 0,
            nps_score: 8,
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates_on_same_external_id() {
        let repo = test_repo().await;

        let first = repo
            .upsert_accounts(&[record("acc_001", 500.0)])
            .await
            .unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(first.updated, 0);

        let mut changed = record("acc_001", 750.0);
        changed.status = AccountStatus::PastDue;
        let second = repo.upsert_accounts(&[changed]).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 1);
        assert_eq!(second.total, 1);

        let accounts = repo.get_all_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].mrr, 750.0);
        assert_eq!(accounts[0].status, AccountStatus::PastDue);
    }

    #[tokio::test]
    async fn accounts_come_back_in_creation_order() {
        let repo = test_repo().await;
        repo.upsert_accounts(&[
            record("acc_b", 100.0),
            record("acc_a", 200.0),
            record("acc_c", 300.0),
        ])
        .await
        .unwrap();

        let accounts = repo.get_all_accounts().await.unwrap();
        let ids: Vec<&str> = accounts.iter().map(|a| a.external_id.as_str()).collect();
        assert_eq!(ids, ["acc_b", "acc_a", "acc_c"]);
        assert!(accounts.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn find_by_external_id_round_trips_fields() {
        let repo = test_repo().await;
        repo.upsert_accounts(&[record("acc_keyed", 1234.5)])
            .await
            .unwrap();

        let found = repo.find_by_external_id("acc_keyed").await.unwrap();
        let account = found.expect("stored account");
        assert_eq!(account.mrr, 1234.5);
        assert_eq!(account.billing_cycle, BillingCycle::Monthly);
        assert_eq!(account.started_at, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

        let missing = repo.find_by_external_id("acc_absent").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_all_reports_removed_row_count() {
        let repo = test_repo().await;
        repo.upsert_accounts(&[record("acc_1", 10.0), record("acc_2", 20.0)])
            .await
            .unwrap();

        assert_eq!(repo.delete_all_accounts().await.unwrap(), 2);
        assert!(repo.get_all_accounts().await.unwrap().is_empty());
        assert_eq!(repo.delete_all_accounts().await.unwrap(), 0);
    }
}

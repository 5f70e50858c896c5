//! Durable report cache and per-IP daily quota, backed by SQLite.
//!
//! Every row is keyed by an explicit business-day string, so the daily reset
//! needs no background job: a new day simply produces fresh rows.

use anyhow::Result;
use research_core::business_day_str;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// A report cached earlier the same business day.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CachedReport {
    pub content: String,
    pub created_at: String,
}

/// Aggregate counters for today's activity.
#[derive(Debug, Clone, Serialize)]
pub struct DailyStats {
    pub cached_reports_today: i64,
    pub unique_users_today: i64,
}

#[derive(Clone)]
pub struct ReportStore {
    pool: SqlitePool,
    daily_free_quota: u32,
}

impl ReportStore {
    /// Open (creating if missing) the database at `database_url` and ensure
    /// the schema exists.
    pub async fn new(database_url: &str, daily_free_quota: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            daily_free_quota,
        };
        store.init_schema().await?;

        Ok(store)
    }

    /// In-memory store for tests. A single connection so every handle sees
    /// the same database.
    pub async fn in_memory(daily_free_quota: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            daily_free_quota,
        };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let schema = include_str!("../schema.sql");

        // sqlx executes one statement at a time
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await?;
            }
        }

        Ok(())
    }

    pub fn daily_free_quota(&self) -> u32 {
        self.daily_free_quota
    }

    // === Report cache ===

    /// Cached report for `ticker` from today, if any. No side effects.
    pub async fn get_cached_report(&self, ticker: &str) -> Result<Option<CachedReport>> {
        let report = sqlx::query_as::<_, CachedReport>(
            "SELECT content, created_at FROM report_cache WHERE ticker = ? AND date = ?",
        )
        .bind(ticker.to_uppercase())
        .bind(business_day_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    /// Upsert today's report for `ticker`. A second write for the same
    /// (ticker, day) replaces the first.
    pub async fn save_report(&self, ticker: &str, content: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO report_cache (ticker, date, content) VALUES (?, ?, ?)
             ON CONFLICT(ticker, date) DO UPDATE SET
                 content = excluded.content,
                 created_at = CURRENT_TIMESTAMP",
        )
        .bind(ticker.to_uppercase())
        .bind(business_day_str())
        .bind(content)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === IP quota ===

    /// Remaining free generations for `ip` today; a missing row means none
    /// used yet.
    pub async fn get_remaining_quota(&self, ip: &str) -> Result<u32> {
        let used: Option<(i64,)> = sqlx::query_as(
            "SELECT used_count FROM ip_quota WHERE ip_address = ? AND date = ?",
        )
        .bind(ip)
        .bind(business_day_str())
        .fetch_optional(&self.pool)
        .await?;

        let used = used.map(|(n,)| n).unwrap_or(0).max(0) as u32;
        Ok(self.daily_free_quota.saturating_sub(used))
    }

    /// Atomic check-and-increment of today's usage for `ip`.
    ///
    /// The guard and the increment are one conditional upsert, so two
    /// concurrent calls can never both pass a `used = quota - 1` check and
    /// push usage past the limit.
    pub async fn try_consume_quota(&self, ip: &str) -> Result<bool> {
        if self.daily_free_quota == 0 {
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT INTO ip_quota (ip_address, date, used_count) VALUES (?, ?, 1)
             ON CONFLICT(ip_address, date) DO UPDATE SET used_count = used_count + 1
             WHERE ip_quota.used_count < ?",
        )
        .bind(ip)
        .bind(business_day_str())
        .bind(self.daily_free_quota as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // === Global usage ===

    /// Number of new reports generated today, site-wide. Derived from the
    /// cache: hits reuse a row and therefore don't count.
    pub async fn global_usage_today(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM report_cache WHERE date = ?")
                .bind(business_day_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Today's cache size and distinct requester count.
    pub async fn stats_today(&self) -> Result<DailyStats> {
        let today = business_day_str();

        let (cached,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM report_cache WHERE date = ?")
                .bind(&today)
                .fetch_one(&self.pool)
                .await?;

        let (users,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT ip_address) FROM ip_quota WHERE date = ?")
                .bind(&today)
                .fetch_one(&self.pool)
                .await?;

        Ok(DailyStats {
            cached_reports_today: cached,
            unique_users_today: users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_creation() {
        let store = ReportStore::in_memory(3).await.unwrap();
        assert!(store.get_cached_report("2330").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_last_write_wins() {
        let store = ReportStore::in_memory(3).await.unwrap();

        store.save_report("2330", "first draft").await.unwrap();
        store.save_report("2330", "second draft").await.unwrap();
        store.save_report("2330", "final").await.unwrap();

        let report = store.get_cached_report("2330").await.unwrap().unwrap();
        assert_eq!(report.content, "final");

        // still one row, not three
        assert_eq!(store.global_usage_today().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cache_key_is_case_insensitive() {
        let store = ReportStore::in_memory(3).await.unwrap();

        store.save_report("aapl", "report").await.unwrap();
        assert!(store.get_cached_report("AAPL").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_quota_exhaustion() {
        let store = ReportStore::in_memory(3).await.unwrap();
        let ip = "1.2.3.4";

        assert_eq!(store.get_remaining_quota(ip).await.unwrap(), 3);

        assert!(store.try_consume_quota(ip).await.unwrap());
        assert!(store.try_consume_quota(ip).await.unwrap());
        assert!(store.try_consume_quota(ip).await.unwrap());
        assert_eq!(store.get_remaining_quota(ip).await.unwrap(), 0);

        // fourth consume fails and leaves the counter untouched
        assert!(!store.try_consume_quota(ip).await.unwrap());
        assert_eq!(store.get_remaining_quota(ip).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_quota_is_per_ip() {
        let store = ReportStore::in_memory(1).await.unwrap();

        assert!(store.try_consume_quota("1.2.3.4").await.unwrap());
        assert!(!store.try_consume_quota("1.2.3.4").await.unwrap());
        assert!(store.try_consume_quota("5.6.7.8").await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_quota_never_consumes() {
        let store = ReportStore::in_memory(0).await.unwrap();
        assert!(!store.try_consume_quota("1.2.3.4").await.unwrap());
        assert_eq!(store.get_remaining_quota("1.2.3.4").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_consume_never_exceeds_quota() {
        let store = ReportStore::in_memory(3).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.try_consume_quota("9.9.9.9").await.unwrap()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }

        assert_eq!(granted, 3);
        assert_eq!(store.get_remaining_quota("9.9.9.9").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_global_usage_counts_distinct_tickers() {
        let store = ReportStore::in_memory(3).await.unwrap();
        assert_eq!(store.global_usage_today().await.unwrap(), 0);

        store.save_report("2330", "a").await.unwrap();
        store.save_report("2317", "b").await.unwrap();
        store.save_report("2330", "a again").await.unwrap();

        assert_eq!(store.global_usage_today().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stats_today() {
        let store = ReportStore::in_memory(3).await.unwrap();

        store.save_report("2330", "a").await.unwrap();
        store.try_consume_quota("1.2.3.4").await.unwrap();
        store.try_consume_quota("1.2.3.4").await.unwrap();
        store.try_consume_quota("5.6.7.8").await.unwrap();

        let stats = store.stats_today().await.unwrap();
        assert_eq!(stats.cached_reports_today, 1);
        assert_eq!(stats.unique_users_today, 2);
    }
}

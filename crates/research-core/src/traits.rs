use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{InstitutionalFlow, NewsItem, ProviderError, StockSnapshot};

/// Trait for market data providers (price, volume, closing series)
#[async_trait]
pub trait StockDataProvider: Send + Sync {
    /// `Ok(None)` means the symbol is unknown or has no data, which is not
    /// an error: callers fall back to other symbol variants or degrade.
    async fn fetch(&self, symbol: &str) -> Result<Option<StockSnapshot>, ProviderError>;
}

/// Trait for news search providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        recency_days: u32,
    ) -> Result<Vec<NewsItem>, ProviderError>;
}

/// Trait for institutional trading data providers
#[async_trait]
pub trait InstitutionalDataProvider: Send + Sync {
    /// `Ok(None)` means the publisher has no data for that date (not yet
    /// published, or a non-trading day) — distinct from a transport error.
    async fn fetch_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Vec<InstitutionalFlow>>, ProviderError>;
}

/// Trait for the long-latency report generation backend
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

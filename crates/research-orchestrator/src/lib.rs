//! Request arbitration for on-demand research reports.
//!
//! Each request walks a fixed sequence: validate, cache check, per-IP quota
//! check, site-wide cap check, quota consumption, generation (behind the
//! retry executor), persistence. Any step can terminate the request with an
//! explicit outcome.

use std::sync::Arc;

use market_data::{most_recent_institutional_snapshot, DEFAULT_MAX_DAYS_BACK};
use report_store::ReportStore;
use research_core::{
    business_day_str, InstitutionalDataProvider, InstitutionalSnapshot, NewsItem, NewsProvider,
    ReportGenerator, RetryPolicy, StockDataProvider, StockSnapshot,
};

pub mod names;
pub mod outcome;
pub mod prompt;


pub use names::stock_name;
pub use outcome::ResearchOutcome;
pub use prompt::build_research_prompt;

const NEWS_RECENCY_DAYS: u32 = 7;
const INSTITUTIONAL_TOP_N: usize = 10;

pub struct ResearchService {
    store: ReportStore,
    stock_data: Arc<dyn StockDataProvider>,
    news: Arc<dyn NewsProvider>,
    institutional: Arc<dyn InstitutionalDataProvider>,
    generator: Arc<dyn ReportGenerator>,
    retry: RetryPolicy,
    daily_global_limit: u32,
}

impl ResearchService {
    pub fn new(
        store: ReportStore,
        stock_data: Arc<dyn StockDataProvider>,
        news: Arc<dyn NewsProvider>,
        institutional: Arc<dyn InstitutionalDataProvider>,
        generator: Arc<dyn ReportGenerator>,
        daily_global_limit: u32,
    ) -> Self {
        Self {
            store,
            stock_data,
            news,
            institutional,
            generator,
            retry: RetryPolicy::default(),
            daily_global_limit,
        }
    }

    /// Override the default 10s/30s/60s retry schedule.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Arbitrate one research request for `identity`.
    pub async fn research(&self, raw_ticker: &str, identity: &str) -> ResearchOutcome {
        // 1. Validate
        let ticker = raw_ticker.trim().to_uppercase();
        if !is_valid_ticker(&ticker) {
            return ResearchOutcome::InvalidTicker {
                message: "請輸入有效的股票代號（例如：2330）".to_string(),
            };
        }
        let name = stock_name(&ticker).to_string();

        // 2. Cache check — hits cost nothing and skip both limit checks
        match self.store.get_cached_report(&ticker).await {
            Ok(Some(report)) => {
                tracing::info!("Cache hit for {} ({})", ticker, identity);
                let remaining_quota = self.remaining_or_zero(identity).await;
                return ResearchOutcome::Served {
                    ticker,
                    name,
                    content: report.content,
                    cached: true,
                    remaining_quota,
                };
            }
            Ok(None) => {}
            Err(e) => return internal(e, 0),
        }

        // 3. Per-identity quota check
        let remaining = match self.store.get_remaining_quota(identity).await {
            Ok(r) => r,
            Err(e) => return internal(e, 0),
        };
        if remaining == 0 {
            return ResearchOutcome::QuotaExceeded;
        }

        // 4. Site-wide cap, checked before this identity's quota is consumed
        match self.store.global_usage_today().await {
            Ok(n) if n >= self.daily_global_limit as i64 => {
                tracing::warn!("Daily global report cap reached ({})", n);
                return ResearchOutcome::GlobalCapExceeded {
                    remaining_quota: remaining,
                };
            }
            Ok(_) => {}
            Err(e) => return internal(e, remaining),
        }

        // 5. Consume quota. A same-identity race can exhaust it between the
        // check above and here; the request still proceeds — one extra
        // report per identity under concurrent load is accepted.
        match self.store.try_consume_quota(identity).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    "Quota for {} exhausted between check and consume; proceeding",
                    identity
                );
            }
            Err(e) => return internal(e, remaining),
        }
        let remaining_quota = match self.store.get_remaining_quota(identity).await {
            Ok(r) => r,
            Err(_) => remaining.saturating_sub(1),
        };

        // 6. Generate. Transient backend errors are retried inside the
        // policy; a terminal error surfaces here with quota already spent.
        let (snapshot, news, institutional) = self.gather_inputs(&ticker, &name).await;
        let prompt = build_research_prompt(
            &ticker,
            &name,
            &business_day_str(),
            snapshot.as_ref(),
            institutional.flow_for(&ticker),
            &news,
        );

        let content = match self.retry.execute(|| self.generator.generate(&prompt)).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Report generation for {} failed: {}", ticker, e);
                return ResearchOutcome::GenerationFailed {
                    message: format!("報告生成失敗：{}", e),
                    remaining_quota,
                };
            }
        };

        // 7. Persist — the cache row is also what the global cap counts
        if let Err(e) = self.store.save_report(&ticker, &content).await {
            return internal(e, remaining_quota);
        }

        // 8. Respond
        tracing::info!("Generated new report for {} ({})", ticker, identity);
        ResearchOutcome::Served {
            ticker,
            name,
            content,
            cached: false,
            remaining_quota,
        }
    }

    /// Fetch all generation inputs concurrently; each degrades
    /// independently when its provider fails.
    async fn gather_inputs(
        &self,
        ticker: &str,
        name: &str,
    ) -> (Option<StockSnapshot>, Vec<NewsItem>, InstitutionalSnapshot) {
        let snapshot = async {
            // Numeric Taiwan tickers live on TWSE (.TW) or the OTC board (.TWO)
            if ticker.chars().all(|c| c.is_ascii_digit()) {
                match self.fetch_symbol(&format!("{}.TW", ticker)).await {
                    Some(s) => Some(s),
                    None => self.fetch_symbol(&format!("{}.TWO", ticker)).await,
                }
            } else {
                self.fetch_symbol(ticker).await
            }
        };

        let news = async {
            let query = format!("{} {} 台股 營收 展望 法人", name, ticker);
            match self.news.search(&query, NEWS_RECENCY_DAYS).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("News search failed for {}: {}", ticker, e);
                    Vec::new()
                }
            }
        };

        let institutional = most_recent_institutional_snapshot(
            self.institutional.as_ref(),
            INSTITUTIONAL_TOP_N,
            DEFAULT_MAX_DAYS_BACK,
        );

        tokio::join!(snapshot, news, institutional)
    }

    async fn fetch_symbol(&self, symbol: &str) -> Option<StockSnapshot> {
        match self.stock_data.fetch(symbol).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Market data fetch failed for {}: {}", symbol, e);
                None
            }
        }
    }

    async fn remaining_or_zero(&self, identity: &str) -> u32 {
        match self.store.get_remaining_quota(identity).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Quota lookup failed for {}: {}", identity, e);
                0
            }
        }
    }
}

fn internal(e: anyhow::Error, remaining_quota: u32) -> ResearchOutcome {
    tracing::error!("Internal error during research request: {}", e);
    ResearchOutcome::InternalError {
        message: format!("內部錯誤：{}", e),
        remaining_quota,
    }
}

fn is_valid_ticker(ticker: &str) -> bool {
    ticker.len() >= 2
        && ticker.len() <= 12
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

use async_trait::async_trait;
use research_core::{ProviderError, StockDataProvider, StockSnapshot};
use serde::Deserialize;
use std::time::Duration;
use technical_analysis::{format_pct_change, moving_average, rsi};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart client producing daily-close snapshots with
/// MA5/MA20/RSI attached.
#[derive(Clone)]
pub struct YahooChartClient {
    client: reqwest::Client,
    range: String,
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl YahooChartClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            range: "3mo".to_string(),
        }
    }
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StockDataProvider for YahooChartClient {
    async fn fetch(&self, symbol: &str) -> Result<Option<StockSnapshot>, ProviderError> {
        let url = format!(
            "{}/{}?range={}&interval=1d",
            CHART_URL, symbol, self.range
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 404 {
            // unknown symbol
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            return Err(ProviderError::from_status(status, format!("chart {}", symbol)));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let Some(result) = body.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }) else {
            return Ok(None);
        };

        let Some(quote) = result.indicators.quote.into_iter().next() else {
            return Ok(None);
        };

        Ok(build_snapshot(symbol, &quote.close, &quote.volume))
    }
}

/// Derive the snapshot from the raw chart series. Needs at least two closes
/// for the day-over-day change; indicators degrade individually when history
/// is short.
fn build_snapshot(
    symbol: &str,
    raw_closes: &[Option<f64>],
    raw_volumes: &[Option<u64>],
) -> Option<StockSnapshot> {
    // Holidays and halts come through as nulls
    let closes: Vec<f64> = raw_closes.iter().flatten().copied().collect();
    if closes.len() < 2 {
        tracing::warn!("Insufficient chart data for {}", symbol);
        return None;
    }

    let current = closes[closes.len() - 1];
    let prev = closes[closes.len() - 2];
    let change = current - prev;
    let pct_change = change / prev * 100.0;

    let volume = raw_volumes.iter().flatten().last().copied().unwrap_or(0);

    Some(StockSnapshot {
        symbol: symbol.to_string(),
        price: (current * 100.0).round() / 100.0,
        change: (change * 100.0).round() / 100.0,
        pct_change: format_pct_change(pct_change),
        volume,
        ma5: moving_average(&closes, 5),
        ma20: moving_average(&closes, 20),
        rsi: rsi(&closes, 14),
        closes,
    })
}

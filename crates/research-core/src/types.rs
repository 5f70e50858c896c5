use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point-in-time view of one symbol with the technical indicators the
/// report prompt needs. Never persisted; rebuilt on every generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub pct_change: f64,
    pub volume: u64,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub rsi: Option<f64>,
    /// Daily closes, oldest first, for any further derivation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub closes: Vec<f64>,
}

/// News headline returned by the news provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
}

/// One stock's institutional investor net buy/sell figures (in shares).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionalFlow {
    pub stock_id: String,
    pub name: String,
    pub foreign_net: i64,
    pub trust_net: i64,
    pub total_net: i64,
}

/// Ranked institutional flows for the most recent trading day that has
/// published data, carrying the date the data was observed on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstitutionalSnapshot {
    pub top_buy: Vec<InstitutionalFlow>,
    pub top_sell: Vec<InstitutionalFlow>,
    pub data_date: Option<NaiveDate>,
}

impl InstitutionalSnapshot {
    /// Look up one ticker's flows across both rankings.
    pub fn flow_for(&self, stock_id: &str) -> Option<&InstitutionalFlow> {
        self.top_buy
            .iter()
            .chain(self.top_sell.iter())
            .find(|f| f.stock_id == stock_id)
    }
}

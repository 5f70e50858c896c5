use async_trait::async_trait;
use chrono::NaiveDate;
use research_core::{
    business_today, InstitutionalDataProvider, InstitutionalFlow, InstitutionalSnapshot,
    ProviderError,
};
use serde::Deserialize;
use std::time::Duration;

use crate::fallback::find_most_recent;

const T86_URL: &str = "https://www.twse.com.tw/rwd/zh/fund/T86";

/// TWSE open API client for the daily institutional investor (三大法人)
/// buy/sell summary.
#[derive(Clone)]
pub struct TwseClient {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct T86Response {
    stat: Option<String>,
    #[serde(default)]
    data: Vec<Vec<String>>,
}

impl TwseClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }
}

impl Default for TwseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstitutionalDataProvider for TwseClient {
    async fn fetch_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<Vec<InstitutionalFlow>>, ProviderError> {
        let url = format!(
            "{}?date={}&selectType=ALLBUT0999&response=json",
            T86_URL,
            date.format("%Y%m%d")
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ProviderError::from_status(status, "TWSE T86"));
        }

        let body: T86Response = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        // stat != OK means "nothing published for that date", not a failure
        if body.stat.as_deref() != Some("OK") || body.data.is_empty() {
            return Ok(None);
        }

        let flows: Vec<InstitutionalFlow> =
            body.data.iter().filter_map(|row| parse_row(row)).collect();
        if flows.is_empty() {
            return Ok(None);
        }

        Ok(Some(flows))
    }
}

/// One T86 row: [0] stock id, [1] name, [4] foreign net, [10] trust net,
/// last column total net. Malformed rows are dropped.
fn parse_row(row: &[String]) -> Option<InstitutionalFlow> {
    Some(InstitutionalFlow {
        stock_id: row.first()?.trim().to_string(),
        name: row.get(1)?.trim().to_string(),
        foreign_net: parse_num(row.get(4)?)?,
        trust_net: parse_num(row.get(10)?)?,
        total_net: parse_num(row.last()?)?,
    })
}

fn parse_num(s: &str) -> Option<i64> {
    s.replace(',', "").replace(' ', "").parse().ok()
}

/// Rank flows by foreign-investor net: top `top_n` buys and top `top_n`
/// sells, most bought / most sold first.
pub fn rank_flows(mut flows: Vec<InstitutionalFlow>, top_n: usize) -> (Vec<InstitutionalFlow>, Vec<InstitutionalFlow>) {
    flows.sort_by(|a, b| b.foreign_net.cmp(&a.foreign_net));

    let top_buy: Vec<_> = flows.iter().take(top_n).cloned().collect();
    let top_sell: Vec<_> = flows.iter().rev().take(top_n).cloned().collect();

    (top_buy, top_sell)
}

/// Fetch the most recent published institutional data (walking back over
/// weekends and holidays) and rank it. Exhausting the search yields an empty
/// snapshot rather than an error — reports degrade without the section.
pub async fn most_recent_institutional_snapshot(
    provider: &dyn InstitutionalDataProvider,
    top_n: usize,
    max_days_back: usize,
) -> InstitutionalSnapshot {
    let found = find_most_recent(business_today(), max_days_back, |date| {
        provider.fetch_for_date(date)
    })
    .await;

    match found {
        Some((flows, date)) => {
            let (top_buy, top_sell) = rank_flows(flows, top_n);
            InstitutionalSnapshot {
                top_buy,
                top_sell,
                data_date: Some(date),
            }
        }
        None => InstitutionalSnapshot::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(id: &str, foreign: i64) -> InstitutionalFlow {
        InstitutionalFlow {
            stock_id: id.to_string(),
            name: format!("Stock {}", id),
            foreign_net: foreign,
            trust_net: 0,
            total_net: foreign,
        }
    }

    #[test]
    fn test_parse_num() {
        assert_eq!(parse_num("12,634"), Some(12_634));
        assert_eq!(parse_num("-3,100"), Some(-3_100));
        assert_eq!(parse_num(" 1 200 "), Some(1_200));
        assert_eq!(parse_num("n/a"), None);
    }

    #[test]
    fn test_parse_row_drops_malformed() {
        let good: Vec<String> = vec![
            "2330", "台積電", "x", "x", "12,000", "x", "x", "x", "x", "x", "3,000", "15,000",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let parsed = parse_row(&good).unwrap();
        assert_eq!(parsed.stock_id, "2330");
        assert_eq!(parsed.foreign_net, 12_000);
        assert_eq!(parsed.trust_net, 3_000);
        assert_eq!(parsed.total_net, 15_000);

        let short: Vec<String> = vec!["2330".to_string()];
        assert!(parse_row(&short).is_none());
    }

    #[test]
    fn test_rank_flows() {
        let flows = vec![flow("A", 100), flow("B", -50), flow("C", 300), flow("D", 10)];
        let (buy, sell) = rank_flows(flows, 2);

        let buy_ids: Vec<_> = buy.iter().map(|f| f.stock_id.as_str()).collect();
        let sell_ids: Vec<_> = sell.iter().map(|f| f.stock_id.as_str()).collect();
        assert_eq!(buy_ids, ["C", "A"]);
        // most sold first
        assert_eq!(sell_ids, ["B", "D"]);
    }
}

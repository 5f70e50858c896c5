use async_trait::async_trait;
use research_core::{NewsItem, NewsProvider, ProviderError};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SEARCH_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 5;

/// Tavily search client with a single query-broadening retry when the
/// first search comes back empty.
#[derive(Clone)]
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    title: String,
    url: String,
}

impl TavilyClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, api_key }
    }

    async fn search_once(
        &self,
        query: &str,
        recency_days: u32,
    ) -> Result<Vec<NewsItem>, ProviderError> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "advanced",
            "max_results": MAX_RESULTS,
            "days": recency_days,
        });

        let response = self
            .client
            .post(SEARCH_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ProviderError::from_status(status, "Tavily search"));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| NewsItem {
                title: r.title,
                url: r.url,
            })
            .collect())
    }
}

/// Fall back to "<first token> stock news" when the precise query finds
/// nothing.
pub(crate) fn broaden_query(query: &str) -> String {
    let head = query.split_whitespace().next().unwrap_or(query);
    format!("{} stock news", head)
}

#[async_trait]
impl NewsProvider for TavilyClient {
    async fn search(
        &self,
        query: &str,
        recency_days: u32,
    ) -> Result<Vec<NewsItem>, ProviderError> {
        tracing::info!("Searching news: {}", query);
        let results = self.search_once(query, recency_days).await?;
        if !results.is_empty() {
            return Ok(results);
        }

        let broad = broaden_query(query);
        tracing::info!("No results, retrying with broader query: {}", broad);
        self.search_once(&broad, recency_days).await
    }
}

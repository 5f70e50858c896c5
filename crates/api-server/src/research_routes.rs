//! Research API routes: report requests, quota status, daily stats.

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;

use crate::AppState;
use research_orchestrator::ResearchOutcome;

#[derive(Deserialize)]
pub struct ResearchRequest {
    pub ticker: String,
}

pub fn research_routes() -> Router<AppState> {
    Router::new()
        .route("/api/research", post(research))
        .route("/api/quota", get(quota))
        .route("/api/stats", get(stats))
        .route("/health", get(health))
}

/// Requester identity: first entry of X-Forwarded-For when present (the
/// service runs behind a proxy), else the connection address.
fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

async fn research(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ResearchRequest>,
) -> (StatusCode, Json<Value>) {
    let ip = client_ip(&headers, &addr);

    match state.service.research(&req.ticker, &ip).await {
        ResearchOutcome::Served {
            ticker,
            name,
            content,
            cached,
            remaining_quota,
        } => {
            let message = if cached {
                "📦 快取命中！此報告今日稍早已生成（不扣額度）"
            } else {
                "✨ 全新生成！已消耗 1 次額度"
            };
            (
                StatusCode::OK,
                Json(json!({
                    "ticker": ticker,
                    "name": name,
                    "content": content,
                    "cached": cached,
                    "remaining_quota": remaining_quota,
                    "message": message,
                })),
            )
        }
        ResearchOutcome::InvalidTicker { message } => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
        }
        ResearchOutcome::QuotaExceeded => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "今日免費額度已用完 🙏",
                "message": "每日 00:00 重置額度，明天再來！或查詢今日已有人查過的股票（不扣額度）。",
                "remaining_quota": 0,
            })),
        ),
        ResearchOutcome::GlobalCapExceeded { remaining_quota } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "今日全站分析額度已達上限 🔒",
                "message": "為保護服務品質，每日新報告生成數量有限。您仍可查詢今日已生成的股票報告（不受限制）。",
                "remaining_quota": remaining_quota,
            })),
        ),
        ResearchOutcome::GenerationFailed {
            message,
            remaining_quota,
        }
        | ResearchOutcome::InternalError {
            message,
            remaining_quota,
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": message,
                "remaining_quota": remaining_quota,
            })),
        ),
    }
}

async fn quota(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let ip = client_ip(&headers, &addr);

    match state.service.store().get_remaining_quota(&ip).await {
        Ok(remaining) => (
            StatusCode::OK,
            Json(json!({ "remaining": remaining, "total": state.quota_total })),
        ),
        Err(e) => {
            tracing::error!("Quota lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "quota lookup failed" })),
            )
        }
    }
}

async fn stats(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.service.store().stats_today().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "cached_reports_today": stats.cached_reports_today,
                "unique_users_today": stats.unique_users_today,
            })),
        ),
        Err(e) => {
            tracing::error!("Stats query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "stats query failed" })),
            )
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "10.0.0.9:55555".parse().unwrap()
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 5.6.7.8".parse().unwrap());
        assert_eq!(client_ip(&headers, &addr()), "1.2.3.4");
    }

    #[test]
    fn test_client_ip_trims_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "  1.2.3.4 ,5.6.7.8".parse().unwrap());
        assert_eq!(client_ip(&headers, &addr()), "1.2.3.4");
    }

    #[test]
    fn test_client_ip_falls_back_to_socket() {
        assert_eq!(client_ip(&HeaderMap::new(), &addr()), "10.0.0.9");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(client_ip(&headers, &addr()), "10.0.0.9");
    }
}

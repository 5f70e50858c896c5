//! HTTP front end for the research service.

use std::net::SocketAddr;
use std::sync::Arc;

use market_data::{TavilyClient, TwseClient, YahooChartClient};
use report_generator::GeminiClient;
use report_store::ReportStore;
use research_orchestrator::ResearchService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod research_routes;

use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResearchService>,
    pub quota_total: u32,
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Starting stock research API server");
    tracing::info!("  Daily free quota: {}", config.daily_free_quota);
    tracing::info!("  Daily global limit: {}", config.daily_global_limit);
    tracing::info!("  Database: {}", config.database_url);

    let store = ReportStore::new(&config.database_url, config.daily_free_quota).await?;

    let service = ResearchService::new(
        store,
        Arc::new(YahooChartClient::new()),
        Arc::new(TavilyClient::new(config.tavily_api_key.clone())),
        Arc::new(TwseClient::new()),
        Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )),
        config.daily_global_limit,
    );

    let state = AppState {
        service: Arc::new(service),
        quota_total: config.daily_free_quota,
    };

    let app = research_routes::research_routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

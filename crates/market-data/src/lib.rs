pub mod fallback;
pub mod news;
pub mod twse;
pub mod yahoo;

pub use fallback::{find_most_recent, DEFAULT_MAX_DAYS_BACK};
pub use news::TavilyClient;
pub use twse::{most_recent_institutional_snapshot, TwseClient};
pub use yahoo::YahooChartClient;

use thiserror::Error;

/// Errors surfaced by the boundary providers (market data, news,
/// institutional data, report generation).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server overloaded: {0}")]
    Overloaded(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Transient failures worth retrying with backoff. Everything else
    /// fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited(_)
                | ProviderError::Overloaded(_)
                | ProviderError::Unavailable(_)
        )
    }

    /// Classify an HTTP status the way the upstream APIs signal transient
    /// trouble: 429 is rate limiting, 500 overload, 502/503/504 unavailability.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            429 => ProviderError::RateLimited(detail),
            500 => ProviderError::Overloaded(detail),
            502..=504 => ProviderError::Unavailable(detail),
            _ => ProviderError::Api(format!("HTTP {}: {}", status, detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::RateLimited("429".into()).is_retryable());
        assert!(ProviderError::Overloaded("500".into()).is_retryable());
        assert!(ProviderError::Unavailable("503".into()).is_retryable());
        assert!(!ProviderError::Api("401".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ProviderError::from_status(429, "slow down"),
            ProviderError::RateLimited(_)
        ));
        assert!(matches!(
            ProviderError::from_status(503, "maintenance"),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from_status(404, "nope"),
            ProviderError::Api(_)
        ));
    }
}

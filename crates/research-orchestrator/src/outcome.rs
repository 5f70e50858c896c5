/// Terminal result of one research request. Every request ends in exactly
/// one of these; nothing is signalled through panics or sentinel strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchOutcome {
    /// Report delivered, either fresh or from today's cache. Cache hits
    /// consume no quota.
    Served {
        ticker: String,
        name: String,
        content: String,
        cached: bool,
        remaining_quota: u32,
    },
    /// Malformed ticker; nothing consumed.
    InvalidTicker { message: String },
    /// The identity's daily free quota is gone; resets next business day.
    QuotaExceeded,
    /// Site-wide new-report cap reached. The identity's own quota was not
    /// consumed.
    GlobalCapExceeded { remaining_quota: u32 },
    /// The generation backend failed after retries. Quota was already
    /// consumed and is not refunded.
    GenerationFailed {
        message: String,
        remaining_quota: u32,
    },
    /// Unexpected failure in the generate/persist path.
    InternalError {
        message: String,
        remaining_quota: u32,
    },
}

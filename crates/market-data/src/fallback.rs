use std::future::Future;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use research_core::ProviderError;

/// Long enough to bridge multi-day holiday clusters (Chinese New Year runs
/// over a week with surrounding weekends).
pub const DEFAULT_MAX_DAYS_BACK: usize = 14;

/// Backward calendar scan for the most recent published data.
///
/// Starting at `today` and going back one day at a time up to
/// `max_days_back`, skip weekends and call `fetch_for_date` for each
/// remaining date. The first date that reports data wins — going backward,
/// the first hit is by definition the most recent. Provider errors and
/// "not yet published" responses both count as a miss for that date.
///
/// Returns `None` when every offset is exhausted.
pub async fn find_most_recent<T, F, Fut>(
    today: NaiveDate,
    max_days_back: usize,
    mut fetch_for_date: F,
) -> Option<(T, NaiveDate)>
where
    F: FnMut(NaiveDate) -> Fut,
    Fut: Future<Output = Result<Option<T>, ProviderError>>,
{
    for days_back in 0..=max_days_back {
        let date = today - Duration::days(days_back as i64);

        // Publishers don't publish on non-trading days
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        match fetch_for_date(date).await {
            Ok(Some(data)) => {
                if days_back > 0 {
                    tracing::info!("Using data from {} (most recent trading day with data)", date);
                }
                return Some((data, date));
            }
            Ok(None) => {
                if days_back == 0 {
                    tracing::debug!("No data published for {} yet, scanning backward", date);
                }
            }
            Err(e) => {
                tracing::warn!("Fetch for {} failed, trying earlier date: {}", date, e);
            }
        }
    }

    tracing::warn!(
        "No data found in the last {} days",
        max_days_back
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn monday() -> NaiveDate {
        // 2026-01-12 is a Monday
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    #[tokio::test]
    async fn test_finds_data_at_offset_skipping_weekend() {
        let hit = NaiveDate::from_ymd_opt(2026, 1, 8).unwrap(); // Thursday, offset 4
        let called = Arc::new(Mutex::new(Vec::new()));
        let c = called.clone();

        let result = find_most_recent(monday(), 14, move |date| {
            let c = c.clone();
            async move {
                c.lock().unwrap().push(date);
                if date == hit {
                    Ok(Some("rows"))
                } else {
                    Ok(None)
                }
            }
        })
        .await;

        let (data, date) = result.unwrap();
        assert_eq!(data, "rows");
        assert_eq!(date, hit);

        // Sat 1/10 and Sun 1/11 were never fetched
        let called = called.lock().unwrap();
        let expected: Vec<NaiveDate> = [12, 9, 8]
            .iter()
            .map(|d| NaiveDate::from_ymd_opt(2026, 1, *d).unwrap())
            .collect();
        assert_eq!(*called, expected);
    }

    #[tokio::test]
    async fn test_exhausted_returns_none() {
        let calls = Arc::new(Mutex::new(0usize));
        let c = calls.clone();

        let result: Option<((), NaiveDate)> = find_most_recent(monday(), 14, move |_| {
            let c = c.clone();
            async move {
                *c.lock().unwrap() += 1;
                Ok(None)
            }
        })
        .await;

        assert!(result.is_none());
        // 15 calendar offsets minus 4 weekend days in that span
        assert_eq!(*calls.lock().unwrap(), 11);
    }

    #[tokio::test]
    async fn test_provider_error_is_treated_as_miss() {
        let hit = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(); // Friday, offset 3

        let result = find_most_recent(monday(), 14, move |date| async move {
            if date == hit {
                Ok(Some(1))
            } else {
                Err(ProviderError::Unavailable("timeout".into()))
            }
        })
        .await;

        assert_eq!(result, Some((1, hit)));
    }

    #[tokio::test]
    async fn test_today_hit_short_circuits() {
        let calls = Arc::new(Mutex::new(0usize));
        let c = calls.clone();

        let result = find_most_recent(monday(), 14, move |date| {
            let c = c.clone();
            async move {
                *c.lock().unwrap() += 1;
                Ok(Some(date))
            }
        })
        .await;

        assert_eq!(result, Some((monday(), monday())));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}

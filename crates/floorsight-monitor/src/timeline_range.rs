use floorsight_api::ApiClient;
use floorsight_core::timeline::{MinuteBucket, TIMELINE_WINDOW_MS, TimelineEvent, bucket_by_minute};

/// Selectable chart ranges. Only the 10-minute range is served from the live
/// buffer; wider ranges delegate to the historical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineRange {
    TenMinutes,
    OneHour,
    SixHours,
    Day,
}

impl TimelineRange {
    pub fn window_ms(&self) -> u64 {
        match self {
            TimelineRange::TenMinutes => 10 * 60 * 1000,
            TimelineRange::OneHour => 60 * 60 * 1000,
            TimelineRange::SixHours => 6 * 60 * 60 * 1000,
            TimelineRange::Day => 24 * 60 * 60 * 1000,
        }
    }

    /// Bucket size used for the historical query.
    pub fn bucket_minutes(&self) -> u32 {
        match self {
            TimelineRange::TenMinutes | TimelineRange::OneHour => 1,
            TimelineRange::SixHours => 5,
            TimelineRange::Day => 15,
        }
    }

    /// Whether the range fits inside the live buffer's retained window.
    pub fn is_live(&self) -> bool {
        self.window_ms() <= TIMELINE_WINDOW_MS
    }
}

/// Chart data states. `Loading` is what the caller shows while the
/// historical future is pending, distinct from an empty `Ready`, which
/// means "no activity in this period". `Failed` offers a manual retry.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineData {
    Loading,
    Ready(Vec<MinuteBucket>),
    Failed,
}

/// Resolve a range either from the live window's events or by delegating to
/// the historical endpoint.
pub async fn resolve_timeline(
    range: TimelineRange,
    live_events: &[TimelineEvent],
    api: &ApiClient,
    now: u64,
) -> TimelineData {
    if range.is_live() {
        return TimelineData::Ready(bucket_by_minute(live_events, now, range.window_ms()));
    }
    match api
        .activity_timeline(now.saturating_sub(range.window_ms()), now, range.bucket_minutes())
        .await
    {
        Ok(buckets) => TimelineData::Ready(buckets),
        Err(e) => {
            tracing::warn!(error = %e, "Historical timeline query failed");
            TimelineData::Failed
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ten_minutes_is_live() {
        assert!(TimelineRange::TenMinutes.is_live());
        assert!(!TimelineRange::OneHour.is_live());
        assert!(!TimelineRange::SixHours.is_live());
        assert!(!TimelineRange::Day.is_live());
    }

    #[test]
    fn bucket_sizes_match_ranges() {
        assert_eq!(TimelineRange::OneHour.bucket_minutes(), 1);
        assert_eq!(TimelineRange::SixHours.bucket_minutes(), 5);
        assert_eq!(TimelineRange::Day.bucket_minutes(), 15);
    }

    #[tokio::test]
    async fn live_range_resolves_without_touching_the_api() {
        // An unroutable API base would fail any request; the live path must
        // never issue one.
        let api = ApiClient::new("http://127.0.0.1:1");
        let data = resolve_timeline(TimelineRange::TenMinutes, &[], &api, 1_200_000).await;
        match data {
            TimelineData::Ready(buckets) => assert_eq!(buckets.len(), 11),
            other => panic!("Expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn historical_failure_is_failed_not_empty() {
        let api = ApiClient::new("http://127.0.0.1:1");
        let data = resolve_timeline(TimelineRange::OneHour, &[], &api, 1_200_000).await;
        assert_eq!(data, TimelineData::Failed);
    }
}

use serde::Deserialize;

use floorsight_core::reconcile::RosterWorker;
use floorsight_core::timeline::MinuteBucket;

#[derive(Debug)]
pub enum ApiError {
    Request(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request failed: {e}"),
            Self::Status(code) => write!(f, "backend returned HTTP {code}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// One past session summary for a worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerHistoryEntry {
    pub session_id: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub active_pct: Option<f64>,
    pub idle_pct: Option<f64>,
    pub adjusting_pct: Option<f64>,
    pub error_pct: Option<f64>,
    pub alert_count: u32,
}

/// HTTP client for the backend REST API. Response structs are partial:
/// only the fields the monitor consumes are deserialized.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("floorsight-monitor/0.1")
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch the worker roster.
    pub async fn workers(&self) -> Result<Vec<RosterWorker>, ApiError> {
        self.get_json(&format!("{}/api/workers", self.base_url)).await
    }

    /// Fetch dense per-bucket activity counts for a historical range.
    pub async fn activity_timeline(
        &self,
        from_ts: u64,
        to_ts: u64,
        bucket_minutes: u32,
    ) -> Result<Vec<MinuteBucket>, ApiError> {
        let url = format!(
            "{}/api/activity/timeline?from_ts={from_ts}&to_ts={to_ts}&bucket_minutes={bucket_minutes}",
            self.base_url
        );
        self.get_json(&url).await
    }

    /// Fetch recent session summaries for one worker.
    pub async fn worker_history(
        &self,
        worker_name: &str,
        limit: Option<u32>,
    ) -> Result<Vec<WorkerHistoryEntry>, ApiError> {
        let mut url = format!("{}/api/workers/{worker_name}/history", self.base_url);
        if let Some(limit) = limit {
            url.push_str(&format!("?limit={limit}"));
        }
        self.get_json(&url).await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        if !resp.status().is_success() {
            tracing::debug!(url, status = resp.status().as_u16(), "API request rejected");
            return Err(ApiError::Status(resp.status().as_u16()));
        }
        resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[test]
    fn roster_response_decodes_partial_fields() {
        // The endpoint returns more fields than the monitor consumes.
        let json = r#"[
            {"id":"w1","name":"Alice","role":"sewing","device_id":null,"created_at":"2026-01-01T00:00:00Z"},
            {"id":"w2","name":"Bob","role":null,"device_id":"d7","created_at":"2026-01-02T00:00:00Z"}
        ]"#;
        let roster: Vec<RosterWorker> = serde_json::from_str(json).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Alice");
        assert_eq!(roster[1].id, "w2");
    }

    #[test]
    fn timeline_response_decodes_break_key() {
        let json = r#"[{"minute":"14:05","sewing":3,"adjusting":1,"idle":0,"break":2,"error":0}]"#;
        let buckets: Vec<MinuteBucket> = serde_json::from_str(json).unwrap();
        assert_eq!(buckets[0].break_, 2);
        assert_eq!(buckets[0].sewing, 3);
    }

    #[test]
    fn history_response_tolerates_null_percentages() {
        let json = r#"[{
            "session_id":"s1",
            "started_at":"2026-01-01T08:00:00Z",
            "ended_at":null,
            "active_pct":null,
            "idle_pct":12.5,
            "adjusting_pct":null,
            "error_pct":null,
            "alert_count":4
        }]"#;
        let history: Vec<WorkerHistoryEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(history[0].alert_count, 4);
        assert_eq!(history[0].idle_pct, Some(12.5));
        assert!(history[0].ended_at.is_none());
    }

    #[test]
    fn api_error_display() {
        assert_eq!(format!("{}", ApiError::Status(503)), "backend returned HTTP 503");
        assert!(format!("{}", ApiError::Request("boom".into())).contains("boom"));
        assert!(format!("{}", ApiError::Decode("oops".into())).contains("oops"));
    }
}

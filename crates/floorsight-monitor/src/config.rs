use serde::Deserialize;

/// Monitor configuration, loaded from `floorsight.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Streaming endpoint for live frames.
    pub ws_url: String,
    /// Base address for the plain-request REST API.
    pub api_base_url: String,
    pub reconnect: ReconnectConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000/ws/live".to_string(),
            api_base_url: "http://localhost:8000".to_string(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Reconnection backoff bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl MonitorConfig {
    /// Validate configuration, exiting on values the monitor cannot run with.
    pub fn validate(&self) {
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            tracing::error!(url = %self.ws_url, "ws_url must be a ws:// or wss:// address");
            std::process::exit(1);
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            tracing::error!(url = %self.api_base_url, "api_base_url must be an http(s) address");
            std::process::exit(1);
        }
        if self.reconnect.initial_delay_ms == 0 {
            tracing::error!("reconnect.initial_delay_ms must be > 0");
            std::process::exit(1);
        }
        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            tracing::error!("reconnect.max_delay_ms must be >= initial_delay_ms");
            std::process::exit(1);
        }
    }

    /// Load config from `floorsight.toml` if it exists, then apply env var
    /// overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("floorsight.toml") {
            Ok(content) => match toml::from_str::<MonitorConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from floorsight.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse floorsight.toml: {e}, using defaults");
                    MonitorConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No floorsight.toml found, using defaults");
                MonitorConfig::default()
            },
        };

        if let Ok(url) = std::env::var("FLOORSIGHT_WS_URL")
            && !url.is_empty()
        {
            config.ws_url = url;
        }
        if let Ok(url) = std::env::var("FLOORSIGHT_API_URL")
            && !url.is_empty()
        {
            config.api_base_url = url;
        }
        if let Ok(val) = std::env::var("FLOORSIGHT_RECONNECT_MAX_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.reconnect.max_delay_ms = ms;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.ws_url, "ws://localhost:8000/ws/live");
        assert_eq!(cfg.api_base_url, "http://localhost:8000");
        assert_eq!(cfg.reconnect.initial_delay_ms, 1_000);
        assert_eq!(cfg.reconnect.max_delay_ms, 30_000);
    }

    #[test]
    fn parse_minimal_toml() {
        let toml_str = r#"
ws_url = "wss://floor.example.com/ws/live"
"#;
        let cfg: MonitorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.ws_url, "wss://floor.example.com/ws/live");
        // Untouched sections keep their defaults.
        assert_eq!(cfg.api_base_url, "http://localhost:8000");
        assert_eq!(cfg.reconnect.max_delay_ms, 30_000);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
ws_url = "ws://10.0.0.5:8000/ws/live"
api_base_url = "http://10.0.0.5:8000"

[reconnect]
initial_delay_ms = 500
max_delay_ms = 10000
"#;
        let cfg: MonitorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.reconnect.initial_delay_ms, 500);
        assert_eq!(cfg.reconnect.max_delay_ms, 10_000);
    }

    #[test]
    fn validate_accepts_defaults() {
        MonitorConfig::default().validate();
    }

    #[test]
    fn invalid_ws_scheme_is_rejected() {
        let cfg = MonitorConfig {
            ws_url: "http://localhost:8000/ws/live".to_string(),
            ..MonitorConfig::default()
        };
        // validate() exits the process, so test the underlying check.
        assert!(!cfg.ws_url.starts_with("ws://") && !cfg.ws_url.starts_with("wss://"));
    }
}

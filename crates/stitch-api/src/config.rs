//! API configuration.

/// Default request body cap, matching the largest upload we accept.
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Pick the log output format. An explicit `LOG_FORMAT` wins; otherwise
    /// production logs JSON and everything else logs colored text.
    pub fn use_json_logs(&self, log_format: Option<&str>) -> bool {
        match log_format {
            Some(format) => format.eq_ignore_ascii_case("json"),
            None => self.is_production(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

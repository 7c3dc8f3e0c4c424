use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Buyer creations allowed per user per window (default: `5`).
    pub create_rate_limit: u32,
    /// Buyer updates allowed per user per window (default: `10`).
    pub update_rate_limit: u32,
    /// Rate-limit window in milliseconds (default: `10000`).
    pub rate_limit_window_ms: u64,
    /// Clock-skew tolerance for optimistic-concurrency timestamp comparison,
    /// in milliseconds (default: `1000`). A heuristic, not load-bearing.
    pub conflict_tolerance_ms: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `CREATE_RATE_LIMIT`     | `5`                        |
    /// | `UPDATE_RATE_LIMIT`     | `10`                       |
    /// | `RATE_LIMIT_WINDOW_MS`  | `10000`                    |
    /// | `CONFLICT_TOLERANCE_MS` | `1000`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let create_rate_limit: u32 = std::env::var("CREATE_RATE_LIMIT")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("CREATE_RATE_LIMIT must be a valid u32");

        let update_rate_limit: u32 = std::env::var("UPDATE_RATE_LIMIT")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("UPDATE_RATE_LIMIT must be a valid u32");

        let rate_limit_window_ms: u64 = std::env::var("RATE_LIMIT_WINDOW_MS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("RATE_LIMIT_WINDOW_MS must be a valid u64");

        let conflict_tolerance_ms: i64 = std::env::var("CONFLICT_TOLERANCE_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("CONFLICT_TOLERANCE_MS must be a valid i64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            create_rate_limit,
            update_rate_limit,
            rate_limit_window_ms,
            conflict_tolerance_ms,
        }
    }
}

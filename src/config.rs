use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment label included in logs ("production", "test", ...)
    pub environment: String,

    // Backend API
    pub backend_api_url: String,
    pub backend_api_key: Option<String>,

    // Internal endpoints
    pub internal_api_key: Option<String>,

    // Locale preference cookie
    pub locale_cookie_max_age_days: u32,

    // Handoff store lifecycle
    pub handoff_clear_delay_ms: u64,
    pub handoff_ttl_secs: u64,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string()),

            // Backend API (survey fetch + submission)
            backend_api_url: std::env::var("BACKEND_API_URL")
                .context("BACKEND_API_URL not set")?,
            backend_api_key: std::env::var("BACKEND_API_KEY").ok(),

            // Internal endpoints (metrics); disabled when unset
            internal_api_key: std::env::var("INTERNAL_API_KEY").ok(),

            // Locale preference cookie horizon
            locale_cookie_max_age_days: std::env::var("LOCALE_COOKIE_MAX_AGE_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),

            // Handoff store: how long a read record stays visible, and how
            // long an unread record survives before the sweeper drops it
            handoff_clear_delay_ms: std::env::var("HANDOFF_CLEAR_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2_000),
            handoff_ttl_secs: std::env::var("HANDOFF_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}

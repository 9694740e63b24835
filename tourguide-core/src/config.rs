use crate::proximity::DEFAULT_RADIUS_KM;
use crate::search::DEFAULT_LOCATION_TIMEOUT;
use std::time::Duration;

/// Configuration options for the explorer
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    /// REST root of the realtime database (None means no remote data)
    pub database_url: Option<String>,
    /// Optional auth token appended to database requests
    pub auth_token: Option<String>,
    /// Path of the city collection inside the database
    pub cities_path: String,
    /// Base URL of the chat backend
    pub chat_backend_url: String,
    /// IP geolocation endpoint used when no position is given
    pub ip_location_url: String,
    /// Nearby search radius in kilometres
    pub radius_km: f64,
    /// How long to wait for a position
    pub location_timeout: Duration,
    /// Timeout for each HTTP request
    pub http_timeout: Duration,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            auth_token: None,
            cities_path: "/c".to_string(),
            chat_backend_url: "http://localhost:5000".to_string(),
            ip_location_url: "http://ip-api.com/json".to_string(),
            radius_km: DEFAULT_RADIUS_KM,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            http_timeout: Duration::from_secs(5),
        }
    }
}

impl ExplorerConfig {
    /// Defaults overridden by `TOURGUIDE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            database_url: get("TOURGUIDE_DATABASE_URL"),
            auth_token: get("TOURGUIDE_DATABASE_AUTH"),
            cities_path: get("TOURGUIDE_CITIES_PATH").unwrap_or(defaults.cities_path),
            chat_backend_url: get("TOURGUIDE_CHAT_URL").unwrap_or(defaults.chat_backend_url),
            ip_location_url: get("TOURGUIDE_IP_LOCATION_URL").unwrap_or(defaults.ip_location_url),
            ..defaults
        }
    }
}

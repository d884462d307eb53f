use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How the static overlay source treats fields the primary provider already
/// populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayPolicy {
    /// Only fill fields the primary record left empty.
    #[default]
    FillMissing,
    /// Overwrite primary values with any field present in the overlay.
    Replace,
}

/// Fallback location as configured. Components that failed to parse are
/// `None`; the location resolver substitutes a hardcoded literal for them.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultLocationConfig {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub name: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Required for the map to load. Absence is reported by the client as a
    /// configuration error rather than failing config loading.
    pub map_api_key: Option<String>,
    pub places_api_key: Option<String>,
    pub default_location: DefaultLocationConfig,
    pub result_limit: usize,
    pub geolocation_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub overrides_path: Option<PathBuf>,
    pub overlay_policy: OverlayPolicy,
    pub places_base_url: Option<String>,
    pub geocoding_base_url: Option<String>,
    pub ip_geolocation_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "map_api_key",
                &self.map_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "places_api_key",
                &self.places_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("default_location", &self.default_location)
            .field("result_limit", &self.result_limit)
            .field("geolocation_timeout_secs", &self.geolocation_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("overrides_path", &self.overrides_path)
            .field("overlay_policy", &self.overlay_policy)
            .field("places_base_url", &self.places_base_url)
            .field("geocoding_base_url", &self.geocoding_base_url)
            .field("ip_geolocation_url", &self.ip_geolocation_url)
            .finish()
    }
}

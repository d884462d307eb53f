use crate::app_config::{AppConfig, DefaultLocationConfig, Environment, OverlayPolicy};
use crate::ConfigError;

/// Upper bound on the nearby-business result count.
pub const MAX_RESULT_LIMIT: usize = 50;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("NEARMAP_ENV", "development"));
    let log_level = or_default("NEARMAP_LOG_LEVEL", "info");

    let map_api_key = optional("NEARMAP_MAP_API_KEY");
    let places_api_key = optional("NEARMAP_PLACES_API_KEY");

    let default_location = DefaultLocationConfig {
        lat: parse_lenient_f64(
            "NEARMAP_DEFAULT_LAT",
            &or_default("NEARMAP_DEFAULT_LAT", "39.7392"),
        ),
        lng: parse_lenient_f64(
            "NEARMAP_DEFAULT_LNG",
            &or_default("NEARMAP_DEFAULT_LNG", "-104.9903"),
        ),
        name: or_default("NEARMAP_DEFAULT_NAME", "Denver, CO"),
    };

    let result_limit = parse_result_limit(&or_default("NEARMAP_RESULT_LIMIT", "4"))?;
    let geolocation_timeout_secs = parse_u64("NEARMAP_GEOLOCATION_TIMEOUT_SECS", "5")?;
    let request_timeout_secs = parse_u64("NEARMAP_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("NEARMAP_USER_AGENT", "nearmap/0.1 (nearby-places)");
    let max_retries = parse_u32("NEARMAP_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("NEARMAP_RETRY_BACKOFF_BASE_MS", "500")?;

    let overrides_path = optional("NEARMAP_OVERRIDES_PATH").map(PathBuf::from);
    let overlay_policy =
        parse_overlay_policy(&or_default("NEARMAP_OVERLAY_POLICY", "fill_missing"))?;

    Ok(AppConfig {
        env,
        log_level,
        map_api_key,
        places_api_key,
        default_location,
        result_limit,
        geolocation_timeout_secs,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        overrides_path,
        overlay_policy,
        places_base_url: optional("NEARMAP_PLACES_BASE_URL"),
        geocoding_base_url: optional("NEARMAP_GEOCODING_BASE_URL"),
        ip_geolocation_url: optional("NEARMAP_IP_GEOLOCATION_URL"),
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_result_limit(raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "NEARMAP_RESULT_LIMIT".to_string(),
        reason,
    };
    let limit = raw.parse::<usize>().map_err(|e| invalid(e.to_string()))?;
    if limit == 0 || limit > MAX_RESULT_LIMIT {
        return Err(invalid(format!("must be between 1 and {MAX_RESULT_LIMIT}")));
    }
    Ok(limit)
}

fn parse_overlay_policy(raw: &str) -> Result<OverlayPolicy, ConfigError> {
    match raw {
        "fill_missing" => Ok(OverlayPolicy::FillMissing),
        "replace" => Ok(OverlayPolicy::Replace),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEARMAP_OVERLAY_POLICY".to_string(),
            reason: format!("expected fill_missing or replace, got '{other}'"),
        }),
    }
}

/// Default-location components never fail config loading; a bad value is
/// logged and dropped so the resolver's hardcoded fallback takes over.
fn parse_lenient_f64(var: &str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            tracing::warn!(var, value, "ignoring non-finite default location component");
            None
        }
        Err(e) => {
            tracing::warn!(var, raw, error = %e, "ignoring unparseable default location component");
            None
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

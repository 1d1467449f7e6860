//! Runtime configuration read from `MEDIMATCH_*` environment variables.

use std::time::Duration;

use crate::MediMatchError;

/// Default backend location (local development server).
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default client-side timeout for a single request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Fixed page size sent with every search.
pub const DEFAULT_RESULT_LIMIT: u32 = 10;

/// Largest image file the client will encode and upload.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

const MAX_RESULT_LIMIT: u32 = 100;

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend base URL, without trailing slash
    pub api_url: String,
    /// Timeout applied to every HTTP call
    pub timeout: Duration,
    /// Page size (`limit`) for searches
    pub result_limit: u32,
    /// Optional minimum similarity forwarded to the backend
    pub similarity_threshold: Option<f64>,
    /// Upper bound on image file size
    pub max_image_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            result_limit: DEFAULT_RESULT_LIMIT,
            similarity_threshold: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `MediMatchError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, MediMatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset or blank keys fall back to defaults.
    ///
    /// # Errors
    /// Returns `MediMatchError::Config` if a value cannot be parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MediMatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(url) = get("MEDIMATCH_API_URL") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(MediMatchError::Config(format!(
                    "MEDIMATCH_API_URL must start with http:// or https://, got {url:?}"
                )));
            }
            config.api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = get("MEDIMATCH_TIMEOUT_SECS") {
            let secs: u64 = parse_var("MEDIMATCH_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(MediMatchError::Config(
                    "MEDIMATCH_TIMEOUT_SECS must be greater than 0".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get("MEDIMATCH_RESULT_LIMIT") {
            let limit: u32 = parse_var("MEDIMATCH_RESULT_LIMIT", &raw)?;
            if limit == 0 || limit > MAX_RESULT_LIMIT {
                return Err(MediMatchError::Config(format!(
                    "MEDIMATCH_RESULT_LIMIT must be between 1 and {MAX_RESULT_LIMIT}"
                )));
            }
            config.result_limit = limit;
        }

        if let Some(raw) = get("MEDIMATCH_SIMILARITY_THRESHOLD") {
            let threshold: f64 = parse_var("MEDIMATCH_SIMILARITY_THRESHOLD", &raw)?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(MediMatchError::Config(
                    "MEDIMATCH_SIMILARITY_THRESHOLD must be between 0 and 1".to_string(),
                ));
            }
            config.similarity_threshold = Some(threshold);
        }

        if let Some(raw) = get("MEDIMATCH_MAX_IMAGE_BYTES") {
            let max: u64 = parse_var("MEDIMATCH_MAX_IMAGE_BYTES", &raw)?;
            if max == 0 {
                return Err(MediMatchError::Config(
                    "MEDIMATCH_MAX_IMAGE_BYTES must be greater than 0".to_string(),
                ));
            }
            config.max_image_bytes = max;
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, MediMatchError> {
    raw.parse()
        .map_err(|_| MediMatchError::Config(format!("{key}: cannot parse {raw:?}")))
}

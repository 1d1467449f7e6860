//! HTTP adapter: reqwest client for the MediMatch REST API.
//!
//! Endpoints:
//! - `POST /api/search`: similarity search (JSON)
//! - `GET /health`: liveness probe
//! - `POST /api/cases`: case upload (multipart)

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, Response};

use crate::config::AppConfig;
use crate::domain::{CaseRecord, HealthStatus, NewCase, SearchRequest, SearchResponse};
use crate::ports::{BackendError, SearchBackend};

const SEARCH_PATH: &str = "/api/search";
const HEALTH_PATH: &str = "/health";
const CASES_PATH: &str = "/api/cases";

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP implementation of [`SearchBackend`].
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
}

impl HttpSearchBackend {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns `BackendError::Client` if the underlying client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .pool_max_idle_per_host(2)
            .user_agent(concat!("medimatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from application configuration.
    ///
    /// # Errors
    /// Returns `BackendError::Client` if the underlying client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, BackendError> {
        Self::new(&config.api_url, config.timeout)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl SearchBackend for HttpSearchBackend {
    fn search(&self, request: &SearchRequest) -> Result<SearchResponse, BackendError> {
        let url = self.url(SEARCH_PATH);
        tracing::debug!(
            url = %url,
            limit = request.limit,
            has_query = request.query.is_some(),
            has_image = request.image.is_some(),
            "Sending search request"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(network_error)?;

        let response = check_status(response)?;
        response
            .json::<SearchResponse>()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = self.url(HEALTH_PATH);
        tracing::debug!(url = %url, "Health check");

        let response = self.client.get(&url).send().map_err(network_error)?;
        let response = check_status(response)?;
        response
            .json::<HealthStatus>()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn upload_case(&self, case: &NewCase, image_path: &Path) -> Result<CaseRecord, BackendError> {
        if let Err(missing) = case.validate() {
            return Err(BackendError::InvalidInput(missing.join(", ")));
        }

        let mut form = multipart::Form::new();
        for (name, value) in case.form_fields() {
            form = form.text(name, value);
        }
        let form = form.file("image", image_path).map_err(|e| {
            BackendError::InvalidInput(format!("cannot read {}: {e}", image_path.display()))
        })?;

        let url = self.url(CASES_PATH);
        tracing::info!(url = %url, "Uploading case");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(network_error)?;
        let response = check_status(response)?;
        response
            .json::<CaseRecord>()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Pass 2xx responses through; turn anything else into `BackendError::Http`.
fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = status.canonical_reason().unwrap_or_default().to_string();
    let body = response.text().unwrap_or_default();
    let detail = extract_detail(&body);

    tracing::warn!(status = status.as_u16(), "Backend returned an error status");

    Err(BackendError::Http {
        status: status.as_u16(),
        reason,
        detail,
    })
}

/// Pull `detail` out of a FastAPI-style error body.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Flatten a transport error and its sources into one line.
fn network_error(err: reqwest::Error) -> BackendError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    tracing::warn!(error = %message, "Backend unreachable");
    BackendError::Network(message)
}

//! Search backend port: Trait for the remote similarity-search service.
//!
//! The backend owns embeddings, ranking and case storage. The client only
//! needs these three calls.

use std::path::Path;

use crate::domain::{CaseRecord, HealthStatus, NewCase, SearchRequest, SearchResponse};

/// Errors reported by a search backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Non-2xx response
    #[error("{}", http_message(.status, .reason, .detail))]
    Http {
        status: u16,
        reason: String,
        detail: Option<String>,
    },

    /// Transport failure (connection refused, timeout, DNS, ...)
    #[error("{0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Invalid response from backend: {0}")]
    Decode(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Local input rejected before sending
    #[error("{0}")]
    InvalidInput(String),
}

fn http_message(status: &u16, reason: &str, detail: &Option<String>) -> String {
    let mut message = format!("Request failed with status {status}");
    if !reason.is_empty() {
        message.push(' ');
        message.push_str(reason);
    }
    if let Some(detail) = detail.as_deref().filter(|d| !d.is_empty()) {
        message.push_str(": ");
        message.push_str(detail);
    }
    message
}

/// Trait for the remote search service.
///
/// Calls are blocking; the TUI runs them on worker threads.
pub trait SearchBackend: Send + Sync {
    /// Run one similarity search.
    ///
    /// # Errors
    /// Returns `BackendError` on transport failure, non-2xx status or bad JSON.
    fn search(&self, request: &SearchRequest) -> Result<SearchResponse, BackendError>;

    /// Check backend liveness.
    ///
    /// # Errors
    /// Returns `BackendError` if the backend is unreachable or unhealthy.
    fn health(&self) -> Result<HealthStatus, BackendError>;

    /// Add a case with its image to the backend catalogue.
    ///
    /// # Errors
    /// Returns `BackendError` if the file cannot be read or the upload fails.
    fn upload_case(&self, case: &NewCase, image_path: &Path) -> Result<CaseRecord, BackendError>;
}

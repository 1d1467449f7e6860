//! # MediMatch
//!
//! Terminal client for similar-case search against a MediMatch backend.
//!
//! This crate provides:
//! - A typed HTTP client for the `/api/search`, `/health` and `/api/cases` endpoints
//! - Text and image search input (image files are sent as base64 data URLs)
//! - Terminal UI rendering a ranked list of similar medical cases
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (case records, filters, image payloads, request contract)
//! - `ports`: Trait definitions for the remote search backend
//! - `adapters`: Concrete implementations (reqwest HTTP client, image files, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{BodyPart, CaseRecord, Modality, SearchInput};

/// Result type for MediMatch operations
pub type Result<T> = std::result::Result<T, MediMatchError>;

/// Main error type for MediMatch
#[derive(Debug, thiserror::Error)]
pub enum MediMatchError {
    #[error(transparent)]
    Backend(#[from] ports::BackendError),

    #[error("Invalid image: {0}")]
    Image(#[from] domain::ImageError),

    #[error("Invalid search input: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

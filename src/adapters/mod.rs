//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: reqwest client for the MediMatch REST API
//! - `image_file`: reading query images from disk
//! - `sanitize`: redaction for log output

pub mod http;
pub mod image_file;
pub mod sanitize;

pub use http::HttpSearchBackend;

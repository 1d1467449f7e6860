//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the remote MediMatch service.

mod search_backend;

pub use search_backend::{BackendError, SearchBackend};

//! Domain layer: Core search types.
//!
//! Pure types with serde derives and local validation. Nothing here talks
//! to the network or the terminal.

mod case;
pub mod filters;
mod image;
mod search;

pub use case::{truncate_chars, CaseRecord, ScoreBand};
pub use filters::{BodyPart, FilterValue, Modality, SearchFilters};
pub use image::{ImageError, ImagePayload};
pub use search::{
    HealthStatus, NewCase, SearchInput, SearchOutcome, SearchQuery, SearchRequest, SearchResponse,
};

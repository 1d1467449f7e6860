//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the search use case.

mod search;

pub use search::SearchService;

#[cfg(test)]
pub(crate) use search::testing;

//! Search service: turns collected input into one backend request.
//!
//! This service coordinates:
//! - Input validation (nothing is sent without a query or an image)
//! - Request assembly with the fixed page size
//! - Timing and result extraction

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::domain::{
    CaseRecord, HealthStatus, NewCase, SearchInput, SearchOutcome, SearchQuery, SearchRequest,
};
use crate::ports::SearchBackend;
use crate::MediMatchError;

/// Service for running similar-case searches.
pub struct SearchService<B>
where
    B: SearchBackend,
{
    backend: Arc<B>,
    limit: u32,
    similarity_threshold: Option<f64>,
}

impl<B> SearchService<B>
where
    B: SearchBackend,
{
    /// Create a new search service.
    pub fn new(backend: Arc<B>, config: &AppConfig) -> Self {
        Self {
            backend,
            limit: config.result_limit,
            similarity_threshold: config.similarity_threshold,
        }
    }

    /// Assemble the JSON body for `input`.
    ///
    /// Text is trimmed; unrestricted filters are left out.
    #[must_use]
    pub fn build_request(&self, input: &SearchInput) -> SearchRequest {
        let (query, image) = match &input.query {
            SearchQuery::Text(q) => (Some(q.trim().to_string()), None),
            SearchQuery::Image(payload) => (None, Some(payload.data_url().to_string())),
        };

        SearchRequest {
            query,
            image,
            modality: input.filters.modality,
            body_part: input.filters.body_part,
            limit: self.limit,
            similarity_threshold: self.similarity_threshold,
        }
    }

    /// Run one search.
    ///
    /// # Errors
    /// Returns `MediMatchError::Validation` without contacting the backend when
    /// there is no query text or image, and `MediMatchError::Backend` when the
    /// request fails.
    pub fn search(&self, input: &SearchInput) -> Result<SearchOutcome, MediMatchError> {
        if !input.has_primary_input() {
            return Err(MediMatchError::Validation(
                "Enter a query or choose an image".to_string(),
            ));
        }

        let request = self.build_request(input);
        tracing::info!(
            kind = input.kind(),
            modality = ?input.filters.modality,
            body_part = ?input.filters.body_part,
            limit = request.limit,
            "Starting search"
        );

        let started = Instant::now();
        let response = self.backend.search(&request)?;
        let round_trip = started.elapsed();

        let out_of_range = response
            .results
            .iter()
            .filter(|r| r.score_out_of_range())
            .count();
        if out_of_range > 0 {
            tracing::warn!(
                count = out_of_range,
                "Backend returned similarity scores outside [0, 1]"
            );
        }

        let query_time_ms = response
            .query_time_ms
            .unwrap_or_else(|| round_trip.as_secs_f64() * 1000.0);

        tracing::info!(
            results = response.results.len(),
            query_time_ms,
            round_trip_ms = round_trip.as_millis() as u64,
            "Search complete"
        );

        Ok(SearchOutcome {
            results: response.results,
            total: response.total,
            query_time_ms,
            round_trip,
            searched_at: chrono::Utc::now(),
        })
    }

    /// Probe backend liveness.
    ///
    /// # Errors
    /// Returns `MediMatchError::Backend` if the probe fails.
    pub fn health(&self) -> Result<HealthStatus, MediMatchError> {
        Ok(self.backend.health()?)
    }

    /// Upload a new case with its image.
    ///
    /// # Errors
    /// Returns `MediMatchError::Validation` for missing metadata and
    /// `MediMatchError::Backend` when the upload fails.
    pub fn upload_case(&self, case: &NewCase, image_path: &Path) -> Result<CaseRecord, MediMatchError> {
        case.validate()
            .map_err(|missing| MediMatchError::Validation(missing.join(", ")))?;
        let created = self.backend.upload_case(case, image_path)?;
        tracing::info!("Case uploaded");
        Ok(created)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend for service and TUI tests.

    use std::path::Path;
    use std::sync::Mutex;

    use crate::domain::{CaseRecord, HealthStatus, NewCase, SearchRequest, SearchResponse};
    use crate::ports::{BackendError, SearchBackend};

    pub struct FakeBackend {
        pub response: Mutex<Result<SearchResponse, BackendError>>,
        pub requests: Mutex<Vec<SearchRequest>>,
    }

    impl FakeBackend {
        pub fn returning(response: Result<SearchResponse, BackendError>) -> Self {
            Self {
                response: Mutex::new(response),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_scores(scores: &[f64]) -> Self {
            let results = scores
                .iter()
                .enumerate()
                .map(|(i, score)| CaseRecord {
                    id: Some(i.to_string()),
                    case_id: format!("case-{i}"),
                    diagnosis: format!("Diagnosis {i}"),
                    similarity_score: Some(*score),
                    modality: "xray".to_string(),
                    body_part: "chest".to_string(),
                    age: Some("50".to_string()),
                    gender: Some("M".to_string()),
                    findings: Some("Patchy opacity".to_string()),
                    clinical_notes: None,
                    image_url: None,
                    source: None,
                })
                .collect();
            Self::returning(Ok(SearchResponse {
                results,
                total: Some(scores.len()),
                query_time_ms: Some(12.0),
            }))
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl SearchBackend for FakeBackend {
        fn search(&self, request: &SearchRequest) -> Result<SearchResponse, BackendError> {
            self.requests.lock().unwrap().push(request.clone());
            self.response.lock().unwrap().clone()
        }

        fn health(&self) -> Result<HealthStatus, BackendError> {
            Ok(HealthStatus {
                status: "ok".to_string(),
            })
        }

        fn upload_case(&self, case: &NewCase, _image_path: &Path) -> Result<CaseRecord, BackendError> {
            Ok(CaseRecord {
                id: Some("1".to_string()),
                case_id: case.case_id.clone(),
                diagnosis: case.diagnosis.clone(),
                similarity_score: None,
                modality: case.modality.clone(),
                body_part: case.body_part.clone(),
                age: case.age.clone(),
                gender: case.gender.clone(),
                findings: case.findings.clone(),
                clinical_notes: case.clinical_notes.clone(),
                image_url: None,
                source: case.source.clone(),
            })
        }
    }
}

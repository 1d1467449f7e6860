//! Search request/response contract shared with the backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::case::CaseRecord;
use super::filters::{BodyPart, Modality, SearchFilters};
use super::image::ImagePayload;

/// Primary input of a search: typed text or an encoded image.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Text(String),
    Image(ImagePayload),
}

/// Everything the input collector hands to the request client.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchInput {
    pub query: SearchQuery,
    pub filters: SearchFilters,
}

impl SearchInput {
    #[must_use]
    pub fn text(query: impl Into<String>, filters: SearchFilters) -> Self {
        Self {
            query: SearchQuery::Text(query.into()),
            filters,
        }
    }

    #[must_use]
    pub fn image(payload: ImagePayload, filters: SearchFilters) -> Self {
        Self {
            query: SearchQuery::Image(payload),
            filters,
        }
    }

    /// Whether there is something to search for.
    ///
    /// Text must be non-empty after trimming; an image payload always counts.
    #[must_use]
    pub fn has_primary_input(&self) -> bool {
        match &self.query {
            SearchQuery::Text(q) => !q.trim().is_empty(),
            SearchQuery::Image(_) => true,
        }
    }

    /// Short description for logs (never the query text or image data).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.query {
            SearchQuery::Text(_) => "text",
            SearchQuery::Image(_) => "image",
        }
    }
}

/// JSON body of `POST /api/search`.
///
/// Absent fields are omitted, so an unrestricted filter never appears in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Base64 data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_part: Option<BodyPart>,

    /// Page size
    pub limit: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
}

/// Body of a successful search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<CaseRecord>,

    /// Total matches before the page limit, when reported
    #[serde(default)]
    pub total: Option<usize>,

    /// Server-side search time
    #[serde(default)]
    pub query_time_ms: Option<f64>,
}

/// Outcome of one completed search, as handed to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<CaseRecord>,
    pub total: Option<usize>,
    /// Backend-reported time, or the measured round trip when the backend omits it
    pub query_time_ms: f64,
    /// Client-measured round trip
    pub round_trip: Duration,
    pub searched_at: chrono::DateTime<chrono::Utc>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Metadata of a case uploaded through `POST /api/cases`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCase {
    pub case_id: String,
    pub diagnosis: String,
    pub modality: String,
    pub body_part: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl NewCase {
    /// Check required fields.
    ///
    /// # Errors
    /// Returns the name of every missing required field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let required = [
            ("case_id", &self.case_id),
            ("diagnosis", &self.diagnosis),
            ("modality", &self.modality),
            ("body_part", &self.body_part),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| format!("{name} is required"))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Text fields of the multipart form, optional ones only when set.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("case_id", self.case_id.clone()),
            ("diagnosis", self.diagnosis.clone()),
            ("modality", self.modality.clone()),
            ("body_part", self.body_part.clone()),
        ];
        let optional = [
            ("age", &self.age),
            ("gender", &self.gender),
            ("findings", &self.findings),
            ("clinical_notes", &self.clinical_notes),
            ("source", &self.source),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                fields.push((name, v.clone()));
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_filters_are_omitted() {
        let request = SearchRequest {
            query: Some("pneumonia".to_string()),
            image: None,
            modality: None,
            body_part: None,
            limit: 10,
            similarity_threshold: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["query"], "pneumonia");
        assert_eq!(obj["limit"], 10);
        assert!(!obj.contains_key("modality"));
        assert!(!obj.contains_key("body_part"));
        assert!(!obj.contains_key("image"));
    }

    #[test]
    fn test_filters_serialize_lowercase() {
        let request = SearchRequest {
            query: None,
            image: Some("data:image/png;base64,AAAA".to_string()),
            modality: Some(Modality::Ct),
            body_part: Some(BodyPart::Chest),
            limit: 10,
            similarity_threshold: Some(0.5),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["modality"], "ct");
        assert_eq!(json["body_part"], "chest");
        assert_eq!(json["similarity_threshold"], 0.5);
        assert!(json.get("query").is_none());
    }

    #[test]
    fn test_response_defaults_when_fields_absent() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.query_time_ms, None);

        let response: SearchResponse = serde_json::from_str(
            r#"{"results": [{"case_id": "a", "diagnosis": "Normal", "similarity_score": 0.5}], "total": 1, "query_time_ms": 12.5}"#,
        )
        .unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.total, Some(1));
        assert_eq!(response.query_time_ms, Some(12.5));
    }

    #[test]
    fn test_primary_input() {
        let filters = SearchFilters::default();
        assert!(!SearchInput::text("   ", filters).has_primary_input());
        assert!(SearchInput::text(" effusion ", filters).has_primary_input());
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(health.is_ok());
        assert!(!HealthStatus { status: "degraded".into() }.is_ok());
    }

    #[test]
    fn test_new_case_validation_and_fields() {
        let mut case = NewCase {
            case_id: "c-1".into(),
            diagnosis: "Pneumothorax".into(),
            modality: "xray".into(),
            body_part: String::new(),
            age: Some("40".into()),
            ..Default::default()
        };
        assert_eq!(case.validate(), Err(vec!["body_part is required".to_string()]));

        case.body_part = "chest".into();
        assert!(case.validate().is_ok());

        let fields = case.form_fields();
        assert_eq!(fields.len(), 5);
        assert!(fields.contains(&("age", "40".to_string())));
        assert!(!fields.iter().any(|(name, _)| *name == "gender"));
    }
}

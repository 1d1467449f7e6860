//! Case record types.
//!
//! A case record is one search hit returned by the backend. Records are
//! immutable on the client and live only as part of the latest search outcome.

use serde::{Deserialize, Deserializer, Serialize};

/// Similarity band used to colour the score badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 90% and above
    Excellent,
    /// 80% to 90%
    Strong,
    /// 70% to 80%
    Moderate,
    /// Below 70%
    Weak,
}

impl ScoreBand {
    /// Classify a raw similarity score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::Excellent
        } else if score >= 0.8 {
            Self::Strong
        } else if score >= 0.7 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

/// A single search result describing a prior medical case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Backend row identifier (numeric or string on the wire)
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub id: Option<String>,

    /// Unique case reference
    #[serde(default)]
    pub case_id: String,

    /// Primary diagnosis label
    #[serde(default)]
    pub diagnosis: String,

    /// Backend-computed similarity, expected in [0, 1]
    #[serde(default)]
    pub similarity_score: Option<f64>,

    /// Imaging modality (xray, ct, mri, ...)
    #[serde(default)]
    pub modality: String,

    /// Body region (chest, brain, ...)
    #[serde(default)]
    pub body_part: String,

    /// Patient age (numeric or string on the wire)
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub age: Option<String>,

    #[serde(default)]
    pub gender: Option<String>,

    /// Free-text clinical description
    #[serde(default)]
    pub findings: Option<String>,

    #[serde(default)]
    pub clinical_notes: Option<String>,

    /// Thumbnail reference
    #[serde(default)]
    pub image_url: Option<String>,

    /// Dataset the case was imported from
    #[serde(default)]
    pub source: Option<String>,
}

impl CaseRecord {
    /// Similarity score, treating a missing value as zero.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.similarity_score.unwrap_or(0.0)
    }

    /// Score as a whole percentage: `round(score * 100)`.
    ///
    /// The backend is trusted to send values in [0, 1]; nothing is re-normalized.
    #[must_use]
    pub fn score_percent(&self) -> i64 {
        (self.score() * 100.0).round() as i64
    }

    /// Score clamped to [0, 1] for gauge widgets.
    #[must_use]
    pub fn score_ratio(&self) -> f64 {
        let score = self.score();
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }

    /// Whether the backend sent a score outside [0, 1].
    #[must_use]
    pub fn score_out_of_range(&self) -> bool {
        self.similarity_score
            .is_some_and(|s| !(0.0..=1.0).contains(&s))
    }

    #[must_use]
    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score())
    }

    /// Reference shown on the card: `case_id`, falling back to `id`.
    #[must_use]
    pub fn display_key(&self) -> &str {
        if !self.case_id.is_empty() {
            &self.case_id
        } else {
            self.id.as_deref().unwrap_or("-")
        }
    }

    /// `age/gender` pair with `?` for unknown parts.
    #[must_use]
    pub fn demographics(&self) -> String {
        format!(
            "{}/{}",
            self.age.as_deref().unwrap_or("?"),
            self.gender.as_deref().unwrap_or("?")
        )
    }

    /// Findings truncated to `max_chars` characters, with an ellipsis when cut.
    #[must_use]
    pub fn findings_excerpt(&self, max_chars: usize) -> String {
        let findings = self.findings.as_deref().unwrap_or("").trim();
        truncate_chars(findings, max_chars)
    }
}

/// Truncate on a char boundary, appending `…` when anything was dropped.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Accept a JSON string, number or bool and keep it as text; `null` maps to `None`.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: Option<f64>) -> CaseRecord {
        CaseRecord {
            id: Some("7".to_string()),
            case_id: "rad-0007".to_string(),
            diagnosis: "Pneumonia".to_string(),
            similarity_score: score,
            modality: "xray".to_string(),
            body_part: "chest".to_string(),
            age: Some("54".to_string()),
            gender: Some("F".to_string()),
            findings: Some("Bilateral infiltrates in the lower lobes".to_string()),
            clinical_notes: None,
            image_url: None,
            source: None,
        }
    }

    #[test]
    fn test_score_percent_rounds() {
        assert_eq!(record(Some(0.874)).score_percent(), 87);
        assert_eq!(record(Some(0.875)).score_percent(), 88);
        assert_eq!(record(Some(1.0)).score_percent(), 100);
        assert_eq!(record(None).score_percent(), 0);
    }

    #[test]
    fn test_out_of_range_score_is_not_renormalized() {
        let r = record(Some(1.3));
        assert_eq!(r.score_percent(), 130);
        assert!(r.score_out_of_range());
        assert_eq!(r.score_ratio(), 1.0);
        assert!(!record(Some(0.5)).score_out_of_range());
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::from_score(0.95), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(0.9), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(0.85), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_score(0.7), ScoreBand::Moderate);
        assert_eq!(ScoreBand::from_score(0.2), ScoreBand::Weak);
    }

    #[test]
    fn test_deserialize_mixed_scalars() {
        let json = r#"{
            "id": 42,
            "case_id": "mpx1001",
            "diagnosis": "Glioblastoma",
            "similarity_score": 0.91,
            "modality": "mri",
            "body_part": "brain",
            "age": 63,
            "gender": null,
            "findings": "Ring-enhancing lesion",
            "image_path": "/data/images/mpx1001.png",
            "metadata": {"dataset": "medpix"}
        }"#;

        let r: CaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.id.as_deref(), Some("42"));
        assert_eq!(r.age.as_deref(), Some("63"));
        assert_eq!(r.gender, None);
        assert_eq!(r.score_percent(), 91);
        assert_eq!(r.demographics(), "63/?");
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let r: CaseRecord = serde_json::from_str(r#"{"diagnosis": "Normal"}"#).unwrap();
        assert_eq!(r.display_key(), "-");
        assert_eq!(r.score(), 0.0);
    }

    #[test]
    fn test_findings_excerpt() {
        let r = record(Some(0.8));
        assert_eq!(r.findings_excerpt(200), "Bilateral infiltrates in the lower lobes");
        let short = r.findings_excerpt(12);
        assert!(short.ends_with('…'));
        assert!(short.chars().count() <= 12);
        assert_eq!(truncate_chars("héllo wörld", 5), "héll…");
    }

    #[test]
    fn test_display_key_falls_back_to_id() {
        let mut r = record(Some(0.8));
        assert_eq!(r.display_key(), "rad-0007");
        r.case_id.clear();
        assert_eq!(r.display_key(), "7");
    }
}

//! Search filters: imaging modality and body part.
//!
//! A filter selection is an `Option<T>` where `None` stands for the "all"
//! choice of the UI. "all" never travels to the backend.

use serde::{Deserialize, Serialize};

/// UI sentinel meaning "no restriction".
pub const ALL: &str = "all";

/// A closed set of filter values that can be cycled in the UI.
pub trait FilterValue: Copy + PartialEq + Sized + 'static {
    /// Every value in display order.
    const VALUES: &'static [Self];

    /// Wire name sent to the backend.
    fn as_str(&self) -> &'static str;

    /// Human-readable label.
    fn label(&self) -> &'static str;

    /// Label of the unrestricted choice.
    fn all_label() -> &'static str;
}

/// Imaging technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Xray,
    Ct,
    Mri,
}

impl FilterValue for Modality {
    const VALUES: &'static [Self] = &[Self::Xray, Self::Ct, Self::Mri];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Xray => "xray",
            Self::Ct => "ct",
            Self::Mri => "mri",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Xray => "X-ray",
            Self::Ct => "CT",
            Self::Mri => "MRI",
        }
    }

    fn all_label() -> &'static str {
        "All modalities"
    }
}

/// Anatomical region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyPart {
    Chest,
    Head,
    Brain,
    Abdomen,
}

impl FilterValue for BodyPart {
    const VALUES: &'static [Self] = &[Self::Chest, Self::Head, Self::Brain, Self::Abdomen];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Chest => "chest",
            Self::Head => "head",
            Self::Brain => "brain",
            Self::Abdomen => "abdomen",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Chest => "Chest",
            Self::Head => "Head",
            Self::Brain => "Brain",
            Self::Abdomen => "Abdomen",
        }
    }

    fn all_label() -> &'static str {
        "All body parts"
    }
}

/// Parse a filter choice; `"all"` (any case) and the empty string mean unrestricted.
///
/// # Errors
/// Returns the list of accepted values if `raw` is unknown.
pub fn parse_filter<T: FilterValue>(raw: &str) -> Result<Option<T>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    T::VALUES
        .iter()
        .copied()
        .find(|v| v.as_str().eq_ignore_ascii_case(raw))
        .map(Some)
        .ok_or_else(|| {
            let accepted: Vec<&str> = T::VALUES.iter().map(|v| v.as_str()).collect();
            format!("unknown filter {raw:?}, expected {ALL} or one of {}", accepted.join(", "))
        })
}

/// Step to the next choice: all, first, ..., last, all.
#[must_use]
pub fn cycle_filter<T: FilterValue>(current: Option<T>) -> Option<T> {
    match current {
        None => T::VALUES.first().copied(),
        Some(value) => {
            let idx = T::VALUES.iter().position(|v| *v == value).unwrap_or(0);
            T::VALUES.get(idx + 1).copied()
        }
    }
}

/// Label for a filter choice, including the unrestricted one.
#[must_use]
pub fn filter_label<T: FilterValue>(current: Option<T>) -> &'static str {
    current.map_or_else(T::all_label, |v| v.label())
}

/// Filter selection attached to a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub modality: Option<Modality>,
    pub body_part: Option<BodyPart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sentinel_maps_to_none() {
        assert_eq!(parse_filter::<Modality>("all"), Ok(None));
        assert_eq!(parse_filter::<Modality>("ALL"), Ok(None));
        assert_eq!(parse_filter::<BodyPart>(""), Ok(None));
    }

    #[test]
    fn test_parse_known_values() {
        assert_eq!(parse_filter::<Modality>("CT"), Ok(Some(Modality::Ct)));
        assert_eq!(parse_filter::<BodyPart>("brain"), Ok(Some(BodyPart::Brain)));
        assert!(parse_filter::<Modality>("ultrasound").is_err());
    }

    #[test]
    fn test_cycle_wraps_through_all() {
        let mut current: Option<Modality> = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            current = cycle_filter(current);
            seen.push(current);
        }
        assert_eq!(
            seen,
            vec![Some(Modality::Xray), Some(Modality::Ct), Some(Modality::Mri), None]
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Modality::Xray).unwrap(), "\"xray\"");
        assert_eq!(serde_json::to_string(&BodyPart::Abdomen).unwrap(), "\"abdomen\"");
    }

    #[test]
    fn test_labels() {
        assert_eq!(filter_label::<Modality>(None), "All modalities");
        assert_eq!(filter_label(Some(BodyPart::Chest)), "Chest");
    }
}

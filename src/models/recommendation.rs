use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl MediaKind {
    /// Lenient parse of the spellings a model tends to produce
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "movie" | "film" => Some(MediaKind::Movie),
            "tv" | "series" | "tv_series" | "tv series" | "show" | "tv show" => {
                Some(MediaKind::Series)
            }
            _ => None,
        }
    }

    /// Path segment used by the metadata API
    pub fn tmdb_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Series => "Series",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}

/// A recommended title before metadata enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub kind: MediaKind,
    pub reason: String,
}

impl Candidate {
    pub fn new(title: &str, kind: MediaKind, reason: &str) -> Self {
        Self {
            title: title.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }
}

/// A candidate with display fields filled in, ready to be shown
///
/// Every string field carries a usable value even when the metadata lookup
/// or description generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecommendation {
    pub display_title: String,
    pub poster_url: String,
    pub year: String,
    pub overview: String,
    pub styled_description: String,
    pub kind: MediaKind,
    pub kind_label: String,
    pub reason: String,
    /// Metadata identifier when the search matched, even if details were unavailable
    pub metadata_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_spellings() {
        assert_eq!(MediaKind::parse("movie"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::parse(" TV "), Some(MediaKind::Series));
        assert_eq!(MediaKind::parse("series"), Some(MediaKind::Series));
        assert_eq!(MediaKind::parse("podcast"), None);
        assert_eq!(MediaKind::parse(""), None);
    }

    #[test]
    fn test_kind_serde() {
        let kind: MediaKind = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(kind, MediaKind::Series);
        assert_eq!(serde_json::to_string(&MediaKind::Movie).unwrap(), "\"movie\"");
    }

    #[test]
    fn test_tmdb_path_and_label() {
        assert_eq!(MediaKind::Series.tmdb_path(), "tv");
        assert_eq!(MediaKind::Series.label(), "Series");
        assert_eq!(MediaKind::Movie.tmdb_path(), "movie");
    }
}

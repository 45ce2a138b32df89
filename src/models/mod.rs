use serde::{Deserialize, Serialize};

pub mod persona;
pub mod question;
pub mod recommendation;
pub mod session;

pub use persona::Persona;
pub use question::Question;
pub use recommendation::{Candidate, EnrichedRecommendation, MediaKind};
pub use session::{SessionState, Step};

// ============================================================================
// Metadata records
// ============================================================================

/// Best search match for a title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataMatch {
    pub id: u64,
}

/// Full detail record for a matched title
///
/// Movies carry `title`/`release_date`, series carry `name`/`first_air_date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl MetadataDetails {
    pub fn canonical_title(&self, kind: MediaKind) -> Option<&str> {
        let field = match kind {
            MediaKind::Movie => &self.title,
            MediaKind::Series => &self.name,
        };
        field.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn release_date(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Movie => self.release_date.as_deref(),
            MediaKind::Series => self.first_air_date.as_deref(),
        }
    }
}

// ============================================================================
// TheMovieDB API Types
// ============================================================================

/// Response from GET /3/search/{movie|tv}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResult {
    pub id: u64,
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

impl GeminiRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Response from POST /v1beta/models/{model}:generateContent
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate, if it has any
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ============================================================================
// Generated payloads
// ============================================================================

/// One question as emitted by the model, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// One recommendation as emitted by the model, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedCandidate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_deserialization_movie() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "overview": "A thief who steals corporate secrets...",
            "poster_path": "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg",
            "release_date": "2010-07-15"
        }"#;

        let details: MetadataDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.canonical_title(MediaKind::Movie), Some("Inception"));
        assert_eq!(details.canonical_title(MediaKind::Series), None);
        assert_eq!(details.release_date(MediaKind::Movie), Some("2010-07-15"));
    }

    #[test]
    fn test_details_deserialization_series() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "poster_path": null
        }"#;

        let details: MetadataDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.canonical_title(MediaKind::Series), Some("Breaking Bad"));
        assert_eq!(details.release_date(MediaKind::Series), Some("2008-01-20"));
        assert!(details.poster_path.is_none());
        assert!(details.overview.is_none());
    }

    #[test]
    fn test_gemini_response_text() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}], "role": "model"}}
            ]
        }"#;

        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Hello world".to_string()));
    }

    #[test]
    fn test_gemini_response_without_text() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(response.text(), None);

        let blocked: GeminiResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert_eq!(blocked.text(), None);
    }

    #[test]
    fn test_gemini_request_shape() {
        let value = serde_json::to_value(GeminiRequest::from_prompt("hi")).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_generated_candidate_accepts_type_or_kind() {
        let with_type: GeneratedCandidate =
            serde_json::from_str(r#"{"title": "Dark", "type": "tv", "reason": "Twisty"}"#).unwrap();
        assert_eq!(with_type.kind.as_deref(), Some("tv"));

        let with_kind: GeneratedCandidate =
            serde_json::from_str(r#"{"title": "Dark", "kind": "series"}"#).unwrap();
        assert_eq!(with_kind.kind.as_deref(), Some("series"));
        assert!(with_kind.reason.is_none());
    }
}

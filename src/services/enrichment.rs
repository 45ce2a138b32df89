use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, EnrichedRecommendation, MetadataDetails},
    services::{
        providers::{MetadataProvider, TextGenerator},
        structured::{generate_structured, with_timeout},
    },
};

/// Shown whenever no poster is available
pub const PLACEHOLDER_POSTER_URL: &str = "https://i.ibb.co/s9ZYS5wk/45e6544ed099.jpg";
/// Characters of overview kept when the styled description cannot be generated
const OVERVIEW_EXCERPT_CHARS: usize = 150;

/// Fills in display fields for candidates
///
/// Every failure along the way degrades to a safe default; nothing here
/// returns an error.
pub struct EnrichmentPipeline {
    generator: Arc<dyn TextGenerator>,
    metadata: Arc<dyn MetadataProvider>,
    image_base_url: String,
    timeout: Duration,
}

impl EnrichmentPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        metadata: Arc<dyn MetadataProvider>,
        image_base_url: String,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            metadata,
            image_base_url,
            timeout,
        }
    }

    /// Enriches every candidate concurrently, keeping input order
    pub async fn enrich_all(self: &Arc<Self>, candidates: Vec<Candidate>) -> Vec<EnrichedRecommendation> {
        let mut tasks = Vec::new();

        for candidate in &candidates {
            let pipeline = Arc::clone(self);
            let candidate = candidate.clone();
            tasks.push(tokio::spawn(async move { pipeline.enrich(&candidate).await }));
        }

        let mut enriched = Vec::with_capacity(candidates.len());

        for (task, candidate) in tasks.into_iter().zip(&candidates) {
            match task.await {
                Ok(recommendation) => enriched.push(recommendation),
                Err(e) => {
                    tracing::error!(error = %e, title = %candidate.title, "Enrichment task failed");
                    enriched.push(miss(candidate, None));
                }
            }
        }

        enriched
    }

    /// Enriches one candidate
    pub async fn enrich(&self, candidate: &Candidate) -> EnrichedRecommendation {
        let found = match self.lookup(|| self.metadata.search(&candidate.title, candidate.kind)).await {
            Some(found) => found,
            None => {
                tracing::info!(title = %candidate.title, kind = %candidate.kind, "Metadata miss");
                return miss(candidate, None);
            }
        };

        let details = match self.lookup(|| self.metadata.details(found.id, candidate.kind)).await {
            Some(details) => details,
            None => {
                tracing::warn!(
                    title = %candidate.title,
                    id = found.id,
                    "Search matched but details unavailable"
                );
                return miss(candidate, Some(found.id));
            }
        };

        self.from_details(candidate, found.id, details).await
    }

    /// Runs a metadata call; not found, failure and timeout all read as `None`
    async fn lookup<T, F, Fut>(&self, call: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = AppResult<Option<T>>>,
    {
        match with_timeout(self.timeout, call()).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(provider = self.metadata.name(), error = %e, "Metadata lookup failed");
                None
            }
        }
    }

    async fn from_details(
        &self,
        candidate: &Candidate,
        id: u64,
        details: MetadataDetails,
    ) -> EnrichedRecommendation {
        let poster_url = details
            .poster_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| format!("{}{}", self.image_base_url.trim_end_matches('/'), p))
            .unwrap_or_else(|| PLACEHOLDER_POSTER_URL.to_string());

        let year: String = details
            .release_date(candidate.kind)
            .map(|date| date.chars().take(4).collect())
            .unwrap_or_default();

        let display_title = details
            .canonical_title(candidate.kind)
            .unwrap_or(candidate.title.as_str())
            .to_string();

        let overview = details.overview.clone().unwrap_or_default();

        let styled_description = self.describe(candidate, &overview).await;

        EnrichedRecommendation {
            display_title,
            poster_url,
            year,
            overview,
            styled_description,
            kind: candidate.kind,
            kind_label: candidate.kind.label().to_string(),
            reason: candidate.reason.clone(),
            metadata_id: Some(id),
        }
    }

    async fn describe(&self, candidate: &Candidate, overview: &str) -> String {
        let prompt = format!(
            r#"Create a brief, engaging description for this {kind}:

Title: {title}
Original Overview: {overview}
Recommendation Reason: {reason}

Write a concise (maximum 2-3 sentences) and appealing description that highlights why this would be enjoyable
based on the recommendation reason. Use a retro-futuristic tone with vibrant language."#,
            kind = candidate.kind,
            title = candidate.title,
            overview = overview,
            reason = candidate.reason,
        );

        generate_structured(
            self.generator.as_ref(),
            &prompt,
            self.timeout,
            "description",
            |text| {
                let text = text.trim();
                if text.is_empty() {
                    Err(AppError::Parse("Empty description".to_string()))
                } else {
                    Ok(text.to_string())
                }
            },
            || fallback_description(overview, &candidate.reason),
        )
        .await
    }
}

/// Truncated overview, or the reason when there is no overview
fn fallback_description(overview: &str, reason: &str) -> String {
    let overview = overview.trim();
    if overview.is_empty() {
        return reason.to_string();
    }
    let excerpt: String = overview.chars().take(OVERVIEW_EXCERPT_CHARS).collect();
    format!("{}...", excerpt)
}

/// Display record built only from the candidate
fn miss(candidate: &Candidate, metadata_id: Option<u64>) -> EnrichedRecommendation {
    EnrichedRecommendation {
        display_title: candidate.title.clone(),
        poster_url: PLACEHOLDER_POSTER_URL.to_string(),
        year: String::new(),
        overview: String::new(),
        styled_description: candidate.reason.clone(),
        kind: candidate.kind,
        kind_label: candidate.kind.label().to_string(),
        reason: candidate.reason.clone(),
        metadata_id,
    }
}

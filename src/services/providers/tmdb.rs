/// TheMovieDB metadata provider
///
/// API Flow:
/// 1. Search: /3/search/{movie|tv} → first result is taken as the match
/// 2. Details: /3/{movie|tv}/{id} → poster, overview, dates, canonical title
use crate::{
    error::{AppError, AppResult},
    models::{MediaKind, MetadataDetails, MetadataMatch, TmdbSearchResponse},
    services::providers::MetadataProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

const SEARCH_LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/3/{}", self.api_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search(&self, title: &str, kind: MediaKind) -> AppResult<Option<MetadataMatch>> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let url = self.url(&format!("search/{}", kind.tmdb_path()));

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .query(&[
                ("query", title),
                ("include_adult", "false"),
                ("language", SEARCH_LANGUAGE),
                ("page", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Lookup(format!(
                "TMDB search returned status {}: {}",
                status, body
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        let found = search.results.first().map(|r| MetadataMatch { id: r.id });

        tracing::info!(
            title = %title,
            kind = %kind,
            results = search.results.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(found)
    }

    async fn details(&self, id: u64, kind: MediaKind) -> AppResult<Option<MetadataDetails>> {
        let url = self.url(&format!("{}/{}", kind.tmdb_path(), id));

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(id, kind = %kind, "TMDB has no details for id");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Lookup(format!(
                "TMDB details returned status {}: {}",
                status, body
            )));
        }

        let details: MetadataDetails = response.json().await?;

        tracing::info!(id, kind = %kind, provider = "tmdb", "Details fetched");

        Ok(Some(details))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

/// External capability abstractions
///
/// The wizard depends on two outside services: a text generation model and a
/// media metadata catalogue. Both sit behind traits so the state machine and
/// its pipelines can be exercised with mocks, and so a provider can be swapped
/// without touching the orchestration code.
use crate::{
    error::AppResult,
    models::{MediaKind, MetadataDetails, MetadataMatch},
};

pub mod gemini;
pub mod tmdb;

pub use gemini::GeminiProvider;
pub use tmdb::TmdbProvider;

/// Trait for text generation providers
///
/// Any non-conforming payload is the caller's problem: a successful return only
/// means the service answered with some text.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Turn a prompt into free-form text
    async fn generate(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for media metadata providers
///
/// `Ok(None)` is the normal "nothing matched" outcome; `Err` means the service
/// itself could not be reached or answered badly.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Find the most relevant record for a title
    async fn search(&self, title: &str, kind: MediaKind) -> AppResult<Option<MetadataMatch>>;

    /// Fetch the full record for an identifier returned by `search`
    async fn details(&self, id: u64, kind: MediaKind) -> AppResult<Option<MetadataDetails>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

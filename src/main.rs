use std::sync::Arc;
use std::time::Duration;

use svomo_api::{
    api::{create_router, AppState},
    config::Config,
    services::{
        providers::{GeminiProvider, MetadataProvider, TextGenerator, TmdbProvider},
        EnrichmentPipeline, QuestionnaireGenerator, RecommendationEngine, RetryPolicy,
        SessionStateMachine,
    },
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let timeout = config.external_timeout();

    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiProvider::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
        timeout,
    )?);
    let metadata: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        timeout,
    )?);

    let machine = SessionStateMachine::new(
        Arc::new(QuestionnaireGenerator::new(generator.clone(), timeout)),
        RecommendationEngine::new(generator.clone(), timeout),
        Arc::new(EnrichmentPipeline::new(
            generator.clone(),
            metadata.clone(),
            config.tmdb_image_base_url.clone(),
            timeout,
        )),
        RetryPolicy {
            max_attempts: config.question_retry_limit.max(1),
            delay: config.question_retry_delay(),
        },
    );

    tracing::info!(
        text_provider = generator.name(),
        metadata_provider = metadata.name(),
        model = %config.gemini_model,
        "Providers configured"
    );

    let state = AppState::new(machine).with_idle_ttl(config.session_idle_ttl());
    state.spawn_session_reaper(SESSION_SWEEP_INTERVAL);

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

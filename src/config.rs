use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Google Gemini API key
    pub gemini_api_key: String,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model used for every generation call
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// TheMovieDB read access token
    pub tmdb_api_key: String,

    /// TheMovieDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix joined with a poster path to build the poster URL
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for any single call to an external service
    #[serde(default = "default_external_timeout_secs")]
    pub external_timeout_secs: u64,

    /// Question generation attempts before the session goes back to the start
    #[serde(default = "default_question_retry_limit")]
    pub question_retry_limit: u32,

    /// Pause between question generation attempts
    #[serde(default = "default_question_retry_delay_ms")]
    pub question_retry_delay_ms: u64,

    /// Sessions untouched for this long are dropped
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_external_timeout_secs() -> u64 {
    10
}

fn default_question_retry_limit() -> u32 {
    3
}

fn default_question_retry_delay_ms() -> u64 {
    500
}

fn default_session_idle_ttl_secs() -> u64 {
    1800
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }

    pub fn question_retry_delay(&self) -> Duration {
        Duration::from_millis(self.question_retry_delay_ms)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

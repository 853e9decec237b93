use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use nt_core::Result;

pub mod analysis;
pub mod gateway;
pub mod models;
pub mod retry;

pub use analysis::{AnalysisSettings, ArticleAnalyzer, DEFAULT_SUMMARY_WORDS};
pub use gateway::{ModelGateway, RawResponse, ValidatedResponse};
pub use models::create_model;
pub use retry::{retry_validated, RetryPolicy};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_SUMMARIZE_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_QA_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_CHARS: usize = 24_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Config {
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub summarize_model: String,
    pub qa_model: String,
    pub max_chars: usize,
    pub retry: RetryPolicy,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("summarize_model", &self.summarize_model)
            .field("qa_model", &self.qa_model)
            .field("max_chars", &self.max_chars)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: None,
            base_url: None,
            summarize_model: DEFAULT_SUMMARIZE_MODEL.to_string(),
            qa_model: DEFAULT_QA_MODEL.to_string(),
            max_chars: DEFAULT_MAX_CHARS,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Defaults plus the credential and base URL from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()),
            base_url: lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            summarize_model: self.summarize_model.clone(),
            qa_model: self.qa_model.clone(),
            max_chars: self.max_chars,
        }
    }

    /// Creates the model and wraps it in a shareable gateway. Fails when the
    /// selected provider is missing its credential.
    pub fn build_gateway(&self) -> Result<Arc<ModelGateway>> {
        let model = create_model(self)?;
        Ok(Arc::new(ModelGateway::new(model, self.retry)))
    }
}

pub mod prelude {
    pub use super::{AnalysisSettings, ArticleAnalyzer, Config, ModelGateway, RetryPolicy};
    pub use nt_core::{ArticleContext, Error, Result};
}

use std::sync::Arc;

use nt_core::{Error, Result, TextGenerator};

use crate::Config;

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;

pub const PROVIDERS: &[&str] = &["gemini", "dummy"];

/// Builds the text generator named by `config.provider`.
pub fn create_model(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let model: Arc<dyn TextGenerator> = match config.provider.as_str() {
        "gemini" => Arc::new(GeminiModel::new(
            config.api_key.clone(),
            config.base_url.as_deref(),
            config.timeout,
        )?),
        "dummy" => Arc::new(DummyModel::new()),
        other => {
            return Err(Error::Config(format!(
                "Unknown model provider '{}'. Available providers: {}",
                other,
                PROVIDERS.join(", ")
            )))
        }
    };
    tracing::debug!(provider = model.name(), "Model created");
    Ok(model)
}

use std::fmt;

use async_trait::async_trait;

use crate::types::ResponseSchema;
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

impl ResponseFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Json => "application/json",
        }
    }
}

/// Per-request generation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    pub response_format: ResponseFormat,
    pub response_schema: Option<ResponseSchema>,
}

impl GenerationOptions {
    /// JSON output constrained to `schema`.
    pub fn structured(schema: ResponseSchema) -> Self {
        Self {
            response_format: ResponseFormat::Json,
            response_schema: Some(schema),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Send one prompt to `model_id` and return the generated text.
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;
}

use std::fmt;
use std::sync::Arc;

use nt_core::{ArticleContext, GenerationOptions, ResponseSchema, Result};
use serde_json::{json, Value};

use crate::gateway::{ModelGateway, RawResponse};
use crate::{DEFAULT_MAX_CHARS, DEFAULT_QA_MODEL, DEFAULT_SUMMARIZE_MODEL};

pub mod prompts;

pub const DEFAULT_SUMMARY_WORDS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSettings {
    pub summarize_model: String,
    pub qa_model: String,
    /// Articles are cut to this many characters before being sent.
    pub max_chars: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            summarize_model: DEFAULT_SUMMARIZE_MODEL.to_string(),
            qa_model: DEFAULT_QA_MODEL.to_string(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Runs the summary, entity-reference and question-answer tasks over one
/// article. Results come back as plain JSON objects keyed by field name.
pub struct ArticleAnalyzer {
    context: ArticleContext,
    gateway: Arc<ModelGateway>,
    settings: AnalysisSettings,
}

impl fmt::Debug for ArticleAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleAnalyzer")
            .field("article_chars", &self.context.article().chars().count())
            .field("entity", &self.context.entity())
            .field("gateway", &self.gateway)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ArticleAnalyzer {
    pub fn new(context: ArticleContext, gateway: Arc<ModelGateway>, settings: AnalysisSettings) -> Self {
        Self {
            context,
            gateway,
            settings,
        }
    }

    pub fn context(&self) -> &ArticleContext {
        &self.context
    }

    fn article(&self) -> &str {
        self.context.truncated(self.settings.max_chars)
    }

    /// Headline, summary of at most `max_words` words, topics and keywords.
    pub async fn summarize(&self, max_words: usize) -> Result<Value> {
        let prompt = prompts::summary_prompt(self.article(), max_words);
        self.request(&self.settings.summarize_model, &prompt, ResponseSchema::Summary)
            .await
    }

    /// Sentences referring to the entity, directly or indirectly.
    pub async fn find_entity_references(&self) -> Result<Value> {
        let Some(entity) = self.context.entity() else {
            tracing::debug!("No entity set, skipping reference search");
            return Ok(json!({ "sent_lst": [] }));
        };

        let prompt = prompts::references_prompt(self.article(), entity);
        self.request(&self.settings.qa_model, &prompt, ResponseSchema::References)
            .await
    }

    /// Answer plus evidence keywords; `{}` when the question is blank.
    pub async fn answer_question(&self, question: &str) -> Result<Value> {
        if question.trim().is_empty() {
            tracing::debug!("No question given, skipping answer");
            return Ok(json!({}));
        }

        let question = prompts::normalize_question(question);
        let prompt = prompts::answer_prompt(self.article(), &question);
        self.request(&self.settings.qa_model, &prompt, ResponseSchema::Answer)
            .await
    }

    async fn request(&self, model_id: &str, prompt: &str, schema: ResponseSchema) -> Result<Value> {
        tracing::info!(model = model_id, task = schema.name(), "Requesting analysis");
        let options = GenerationOptions::structured(schema);
        let raw = self
            .gateway
            .call_with_validation(
                model_id,
                prompt,
                &options,
                self.gateway.retry_policy(),
                |raw: &RawResponse| raw.parsed.as_ref().map(|p| p.schema()) == Some(schema),
            )
            .await?;
        flatten(raw)
    }
}

/// Plain object for a structured response; anything else passes through as is.
pub fn flatten(raw: RawResponse) -> Result<Value> {
    match raw.parsed {
        Some(parsed) => parsed.to_plain(),
        None => {
            tracing::warn!(response = %raw.text, "Response is not a structured result");
            Ok(serde_json::from_str(&raw.text).unwrap_or(Value::String(raw.text)))
        }
    }
}

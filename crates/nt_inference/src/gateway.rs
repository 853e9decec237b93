use std::fmt;
use std::sync::Arc;

use nt_core::{Error, GenerationOptions, Result, StructuredResult, TextGenerator};

use crate::retry::{retry_validated, RetryPolicy};

/// What came back from one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub text: String,
    /// Set when a response schema was requested and `text` decoded into it.
    pub parsed: Option<StructuredResult>,
}

impl RawResponse {
    pub fn has_parsed(&self) -> bool {
        self.parsed.is_some()
    }
}

/// A response paired with the verdict of a validation predicate.
#[derive(Debug)]
pub struct ValidatedResponse {
    pub raw: RawResponse,
    pub valid: bool,
}

impl ValidatedResponse {
    pub fn check<P>(raw: RawResponse, is_valid: P) -> Self
    where
        P: Fn(&RawResponse) -> bool,
    {
        let valid = is_valid(&raw);
        Self { raw, valid }
    }

    pub fn into_result(self, label: &str) -> Result<RawResponse> {
        if self.valid {
            Ok(self.raw)
        } else {
            Err(Error::Validation(format!("{} response failed validation", label)))
        }
    }
}

/// Single entry point to the remote text-generation service.
///
/// Stateless apart from the credential held by the underlying generator, so
/// one instance can be shared behind an `Arc` by every analyzer.
pub struct ModelGateway {
    model: Arc<dyn TextGenerator>,
    retry: RetryPolicy,
}

impl fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelGateway")
            .field("model", &self.model.name())
            .field("retry", &self.retry)
            .finish()
    }
}

impl ModelGateway {
    pub fn new(model: Arc<dyn TextGenerator>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// One request, no retry and no validation.
    pub async fn call(
        &self,
        model_id: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<RawResponse> {
        tracing::debug!(model = model_id, backend = self.model.name(), prompt_chars = prompt.len(), "Calling model");
        let text = self.model.generate(model_id, prompt, options).await?;

        let parsed = match options.response_schema {
            Some(schema) => match schema.decode(&text) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::debug!(model = model_id, error = %e, "Response did not decode");
                    None
                }
            },
            None => None,
        };

        Ok(RawResponse { text, parsed })
    }

    /// Retries [`ModelGateway::call`] under `policy` until `is_valid` accepts a response.
    pub async fn call_with_validation<P>(
        &self,
        model_id: &str,
        prompt: &str,
        options: &GenerationOptions,
        policy: &RetryPolicy,
        is_valid: P,
    ) -> Result<RawResponse>
    where
        P: Fn(&RawResponse) -> bool,
    {
        let label = options
            .response_schema
            .map(|s| s.name())
            .unwrap_or("text");

        let is_valid = &is_valid;
        retry_validated(
            policy,
            label,
            move || async move {
                let raw = self.call(model_id, prompt, options).await?;
                ValidatedResponse::check(raw, is_valid).into_result(label)
            },
            |_| true,
        )
        .await
    }

    /// [`ModelGateway::call_with_validation`] with the gateway's own policy and
    /// the default predicate: a structured result was parsed.
    pub async fn call_validated(
        &self,
        model_id: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<RawResponse> {
        self.call_with_validation(model_id, prompt, options, &self.retry, RawResponse::has_parsed)
            .await
    }
}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{Error, Result};

/// The article under analysis and the optional entity of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContext {
    article: String,
    entity: Option<String>,
}

impl ArticleContext {
    pub fn new(article: impl Into<String>, entity: Option<String>) -> Result<Self> {
        let article = article.into();
        if article.trim().is_empty() {
            return Err(Error::InvalidInput("article text is empty".to_string()));
        }
        let entity = entity
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        Ok(Self { article, entity })
    }

    pub fn article(&self) -> &str {
        &self.article
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// The first `max_chars` characters of the article.
    pub fn truncated(&self, max_chars: usize) -> &str {
        match self.article.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.article[..idx],
            None => &self.article,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub headline: String,
    pub summary: String,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceResult {
    pub sent_lst: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub evidence: Vec<String>,
}

/// Output shapes the remote model can be constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseSchema {
    Summary,
    References,
    Answer,
}

impl ResponseSchema {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Summary => "SummaryResult",
            Self::References => "ReferenceResult",
            Self::Answer => "AnswerResult",
        }
    }

    /// Declared field names, in declaration order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Summary => &["headline", "summary", "topics", "keywords"],
            Self::References => &["sent_lst"],
            Self::Answer => &["answer", "evidence"],
        }
    }

    /// Schema in the OpenAPI subset accepted by `generationConfig.responseSchema`.
    pub fn json_schema(&self) -> Value {
        let string = json!({ "type": "STRING" });
        let list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

        let mut properties = serde_json::Map::new();
        for field in self.fields() {
            let kind = match (self, *field) {
                (Self::Summary, "headline" | "summary") | (Self::Answer, "answer") => &string,
                _ => &list,
            };
            properties.insert(field.to_string(), kind.clone());
        }

        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": self.fields(),
            "propertyOrdering": self.fields(),
        })
    }

    /// Decodes model output into this shape.
    pub fn decode(&self, text: &str) -> Result<StructuredResult> {
        let body = strip_code_fence(text);
        let result = match self {
            Self::Summary => StructuredResult::Summary(decode_as(self, body)?),
            Self::References => StructuredResult::References(decode_as(self, body)?),
            Self::Answer => StructuredResult::Answer(decode_as(self, body)?),
        };
        Ok(result)
    }
}

fn decode_as<T: DeserializeOwned>(schema: &ResponseSchema, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::Validation(format!("response is not a {}: {}", schema.name(), e)))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// A decoded structured response, tagged by the shape it was decoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredResult {
    Summary(SummaryResult),
    References(ReferenceResult),
    Answer(AnswerResult),
}

impl StructuredResult {
    pub fn schema(&self) -> ResponseSchema {
        match self {
            Self::Summary(_) => ResponseSchema::Summary,
            Self::References(_) => ResponseSchema::References,
            Self::Answer(_) => ResponseSchema::Answer,
        }
    }

    /// Plain JSON object keyed by the declared field names, in declared order.
    pub fn to_plain(&self) -> Result<Value> {
        let value = match self {
            Self::Summary(r) => serde_json::to_value(r)?,
            Self::References(r) => serde_json::to_value(r)?,
            Self::Answer(r) => serde_json::to_value(r)?,
        };
        Ok(value)
    }
}

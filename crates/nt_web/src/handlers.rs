use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nt_core::{locate_evidence, EvidenceMatches};
use nt_inference::DEFAULT_SUMMARY_WORDS;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub article: String,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub max_words: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub summary: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceMatches>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(nt_core::Error),
}

impl From<nt_core::Error> for ApiError {
    fn from(err: nt_core::Error) -> Self {
        match err {
            nt_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Upstream(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(err) => {
                tracing::error!(error = %err, "Analysis failed");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Something went wrong, please try again: {}", err),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;
type Payload = Result<Json<AnalyzeRequest>, JsonRejection>;

fn evidence_of(answer: &Value) -> Vec<String> {
    answer
        .get("evidence")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Summary, then references and answer when an entity or question is given.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Payload,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;
    let analyzer = state.analyzer(&request.article, request.entity.clone())?;

    let summary = analyzer
        .summarize(request.max_words.unwrap_or(DEFAULT_SUMMARY_WORDS))
        .await?;

    let references = match analyzer.context().entity() {
        Some(_) => Some(analyzer.find_entity_references().await?),
        None => None,
    };

    let question = request.question.as_deref().unwrap_or_default();
    let (answer, evidence) = if question.trim().is_empty() {
        (None, None)
    } else {
        let answer = analyzer.answer_question(question).await?;
        let evidence = locate_evidence(&request.article, &evidence_of(&answer));
        (Some(answer), Some(evidence))
    };

    Ok(Json(AnalyzeResponse {
        summary,
        references,
        answer,
        evidence,
    }))
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    payload: Payload,
) -> ApiResult {
    let Json(request) = payload?;
    let analyzer = state.analyzer(&request.article, None)?;
    let summary = analyzer
        .summarize(request.max_words.unwrap_or(DEFAULT_SUMMARY_WORDS))
        .await?;
    Ok(Json(summary))
}

pub async fn references(
    State(state): State<Arc<AppState>>,
    payload: Payload,
) -> ApiResult {
    let Json(request) = payload?;
    let analyzer = state.analyzer(&request.article, request.entity)?;
    Ok(Json(analyzer.find_entity_references().await?))
}

pub async fn answer(
    State(state): State<Arc<AppState>>,
    payload: Payload,
) -> ApiResult {
    let Json(request) = payload?;
    let analyzer = state.analyzer(&request.article, None)?;
    let question = request.question.unwrap_or_default();
    Ok(Json(analyzer.answer_question(&question).await?))
}

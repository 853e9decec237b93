pub mod error;
pub mod highlight;
pub mod models;
pub mod types;

pub use error::{Error, Result};
pub use highlight::{locate_evidence, mark_evidence, EvidenceMatches, EvidenceSpan};
pub use models::{GenerationOptions, ResponseFormat, TextGenerator};
pub use types::{
    AnswerResult, ArticleContext, ReferenceResult, ResponseSchema, StructuredResult,
    SummaryResult,
};

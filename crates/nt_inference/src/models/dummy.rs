use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use nt_core::{
    AnswerResult, Error, GenerationOptions, ReferenceResult, ResponseSchema, Result,
    SummaryResult, TextGenerator,
};

use crate::analysis::prompts::{
    extract_article, extract_field, ENTITY_LABEL, QUESTION_LABEL, WORD_BUDGET_LABEL,
};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "did", "do", "does", "for", "from", "had",
    "has", "have", "how", "in", "is", "it", "its", "of", "on", "or", "said", "that", "the",
    "their", "this", "to", "was", "were", "what", "when", "where", "which", "who", "whom", "why",
    "will", "with",
];

/// Extractive stand-in for a remote model. Works without network access and
/// answers only structured requests.
#[derive(Default)]
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(
        &self,
        _model_id: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let article = extract_article(prompt)
            .ok_or_else(|| Error::Service("prompt carries no article".to_string()))?;

        let text = match options.response_schema {
            Some(ResponseSchema::Summary) => {
                let budget = extract_field(prompt, WORD_BUDGET_LABEL)
                    .and_then(|b| b.parse().ok())
                    .unwrap_or(100);
                serde_json::to_string(&summarize(article, budget))?
            }
            Some(ResponseSchema::References) => {
                let entity = extract_field(prompt, ENTITY_LABEL).unwrap_or_default();
                serde_json::to_string(&references(article, entity))?
            }
            Some(ResponseSchema::Answer) => {
                let question = extract_field(prompt, QUESTION_LABEL).unwrap_or_default();
                serde_json::to_string(&answer(article, question))?
            }
            None => first_words(article, 20),
        };
        Ok(text)
    }
}

#[derive(Debug, Clone, Copy)]
struct Word {
    start: usize,
    end: usize,
}

/// Whitespace-separated words with surrounding punctuation trimmed.
fn words(text: &str) -> Vec<Word> {
    let mut out = Vec::new();
    let mut offset = 0;
    for token in text.split_whitespace() {
        let Some(pos) = text[offset..].find(token) else {
            continue;
        };
        let token_start = offset + pos;
        offset = token_start + token.len();

        let leading = token.len() - token.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
        let core = token.trim_matches(|c: char| !c.is_alphanumeric());
        if core.is_empty() {
            continue;
        }
        let start = token_start + leading;
        out.push(Word {
            start,
            end: start + core.len(),
        });
    }
    out
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word.to_lowercase().as_str())
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

fn summarize(article: &str, budget: usize) -> SummaryResult {
    let all = sentences(article);
    let headline = all
        .first()
        .map(|s| first_words(s, 10))
        .unwrap_or_default()
        .trim_end_matches(['.', '!', '?', ','])
        .to_string();

    let mut summary = Vec::new();
    let mut used = 0;
    for sentence in &all {
        let count = sentence.split_whitespace().count();
        if used + count > budget {
            if summary.is_empty() {
                summary.push(first_words(sentence, budget));
            }
            break;
        }
        used += count;
        summary.push(sentence.to_string());
    }

    // Rank candidate keywords by frequency, then by first appearance.
    let mut counts: HashMap<String, (usize, usize, &str)> = HashMap::new();
    for (order, word) in words(article).into_iter().enumerate() {
        let text = &article[word.start..word.end];
        if text.chars().count() < 4 || is_stopword(text) {
            continue;
        }
        let entry = counts.entry(text.to_lowercase()).or_insert((0, order, text));
        entry.0 += 1;
    }
    let mut ranked: Vec<(usize, usize, &str)> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let keywords: Vec<String> = ranked.iter().take(6).map(|(_, _, w)| w.to_string()).collect();
    let topics = keywords
        .iter()
        .take(5)
        .map(|k| {
            let mut chars = k.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    SummaryResult {
        headline,
        summary: summary.join(" "),
        topics,
        keywords,
    }
}

fn references(article: &str, entity: &str) -> ReferenceResult {
    let entity_lower = entity.to_lowercase();
    let tokens: Vec<String> = entity
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| t.chars().count() >= 3)
        .collect();

    let sent_lst = sentences(article)
        .into_iter()
        .filter(|sentence| {
            if entity_lower.is_empty() {
                return false;
            }
            if sentence.to_lowercase().contains(&entity_lower) {
                return true;
            }
            words(sentence)
                .iter()
                .any(|w| tokens.contains(&sentence[w.start..w.end].to_lowercase()))
        })
        .map(str::to_string)
        .collect();

    ReferenceResult { sent_lst }
}

fn answer(article: &str, question: &str) -> AnswerResult {
    let terms: Vec<String> = words(question)
        .iter()
        .map(|w| question[w.start..w.end].to_lowercase())
        .filter(|w| !is_stopword(w))
        .collect();

    let mut best: Option<(&str, usize)> = None;
    for sentence in sentences(article) {
        let score = words(sentence)
            .iter()
            .filter(|w| terms.contains(&sentence[w.start..w.end].to_lowercase()))
            .count();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((sentence, score));
        }
    }

    let Some((sentence, _)) = best else {
        return AnswerResult {
            answer: "The article does not say.".to_string(),
            evidence: Vec::new(),
        };
    };

    AnswerResult {
        answer: sentence.to_string(),
        evidence: evidence_phrases(sentence, &terms),
    }
}

/// Each matched term, extended over the capitalised words that directly follow
/// it, so "CEO" becomes "CEO Jane Doe". Every phrase is a slice of `sentence`.
fn evidence_phrases(sentence: &str, terms: &[String]) -> Vec<String> {
    let tokens = words(sentence);
    let mut phrases: Vec<String> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let word = tokens[i];
        if !terms.contains(&sentence[word.start..word.end].to_lowercase()) {
            i += 1;
            continue;
        }

        let mut last = i;
        while last + 1 < tokens.len() {
            let next = tokens[last + 1];
            let contiguous = sentence[tokens[last].end..next.start].chars().all(char::is_whitespace);
            let capitalised = sentence[next.start..].starts_with(|c: char| c.is_uppercase());
            if !(contiguous && capitalised) {
                break;
            }
            last += 1;
        }

        let phrase = sentence[word.start..tokens[last].end].to_string();
        if !phrases.contains(&phrase) {
            phrases.push(phrase);
        }
        i = last + 1;
    }
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::prompts;

    const ARTICLE: &str = "Company X, led by CEO Jane Doe, announced record profits. \
                           Doe said the results reflect strong demand.";

    #[test]
    fn test_sentences_split_on_terminators() {
        assert_eq!(
            sentences(ARTICLE),
            vec![
                "Company X, led by CEO Jane Doe, announced record profits.",
                "Doe said the results reflect strong demand.",
            ]
        );
        assert_eq!(sentences("No terminator"), vec!["No terminator"]);
        assert_eq!(sentences("Version 2.5 shipped."), vec!["Version 2.5 shipped."]);
    }

    #[test]
    fn test_references_match_name_tokens() {
        let found = references(ARTICLE, "Jane Doe");
        assert_eq!(found.sent_lst.len(), 2);
        assert!(references(ARTICLE, "Acme").sent_lst.is_empty());
    }

    #[test]
    fn test_answer_evidence_is_literal() {
        let result = answer(ARTICLE, "Who is the CEO?");
        assert!(result.answer.contains("Jane Doe"));
        assert_eq!(result.evidence, vec!["CEO Jane Doe".to_string()]);
        for ev in &result.evidence {
            assert!(ARTICLE.contains(ev.as_str()));
        }
    }

    #[test]
    fn test_answer_without_overlap() {
        let result = answer(ARTICLE, "Why is the sky blue?");
        assert!(result.evidence.is_empty());
    }

    #[test]
    fn test_summary_respects_budget() {
        let result = summarize(ARTICLE, 12);
        assert_eq!(result.headline, "Company X, led by CEO Jane Doe, announced record profits");
        assert!(result.summary.split_whitespace().count() <= 12);
        assert!(!result.keywords.is_empty() && result.keywords.len() <= 6);
        assert!(result.topics.len() <= 5);
        for keyword in &result.keywords {
            assert!(ARTICLE.contains(keyword.as_str()));
        }
    }

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();
        let prompt = prompts::answer_prompt(ARTICLE, "Who is the CEO?");
        let text = model
            .generate("any", &prompt, &GenerationOptions::structured(ResponseSchema::Answer))
            .await
            .unwrap();
        let decoded = ResponseSchema::Answer.decode(&text).unwrap();
        assert_eq!(decoded.schema(), ResponseSchema::Answer);

        let err = model
            .generate("any", "no article here", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }
}

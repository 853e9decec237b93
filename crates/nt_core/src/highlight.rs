//! Locating answer evidence inside the source article.
//!
//! Evidence keywords are expected to be literal substrings of the article.
//! These helpers find them so a front end can highlight them, and report the
//! keywords that do not occur at all.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceSpan {
    pub keyword: String,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceMatches {
    /// Matched spans, sorted by `start`, never overlapping.
    pub spans: Vec<EvidenceSpan>,
    pub unmatched: Vec<String>,
}

/// Finds every occurrence of each keyword in `article`.
///
/// Earlier keywords win when occurrences overlap.
pub fn locate_evidence(article: &str, evidence: &[String]) -> EvidenceMatches {
    let mut matches = EvidenceMatches::default();

    for keyword in evidence {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            continue;
        }

        let mut found = false;
        for (start, _) in article.match_indices(keyword) {
            found = true;
            let end = start + keyword.len();
            let overlaps = matches
                .spans
                .iter()
                .any(|s| start < s.end && s.start < end);
            if !overlaps {
                matches.spans.push(EvidenceSpan {
                    keyword: keyword.to_string(),
                    start,
                    end,
                });
            }
        }

        if !found {
            tracing::warn!(keyword, "evidence keyword not found in article");
            matches.unmatched.push(keyword.to_string());
        }
    }

    matches.spans.sort_by_key(|s| s.start);
    matches
}

/// Wraps each span of `article` with `open` and `close`.
pub fn mark_evidence(article: &str, spans: &[EvidenceSpan], open: &str, close: &str) -> String {
    let mut out = String::with_capacity(article.len() + spans.len() * (open.len() + close.len()));
    let mut cursor = 0;
    for span in spans {
        out.push_str(&article[cursor..span.start]);
        out.push_str(open);
        out.push_str(&article[span.start..span.end]);
        out.push_str(close);
        cursor = span.end;
    }
    out.push_str(&article[cursor..]);
    out
}

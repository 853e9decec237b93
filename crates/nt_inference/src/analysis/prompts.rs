//! Prompt templates for the three analysis tasks.
//!
//! Every prompt embeds the (already truncated) article in a fenced block under
//! an `ARTICLE:` label so the model, and the offline model, can find it.

pub const ARTICLE_LABEL: &str = "ARTICLE:";
pub const ENTITY_LABEL: &str = "ENTITY:";
pub const QUESTION_LABEL: &str = "QUESTION:";
pub const WORD_BUDGET_LABEL: &str = "WORD BUDGET:";

const FENCE_OPEN: &str = "```txt\n";
const FENCE_CLOSE: &str = "\n```";

fn article_block(article: &str) -> String {
    format!("{}\n{}{}{}", ARTICLE_LABEL, FENCE_OPEN, article, FENCE_CLOSE)
}

pub fn summary_prompt(article: &str, max_words: usize) -> String {
    format!(
        "Summarize the following article into the following components:\n\
         \"headline\": 10 words max;\n\
         \"summary\": several concise sentences within {max_words} words in total;\n\
         \"topics\": list of 2-5 one-/two-word topics;\n\
         \"keywords\": list of 3-6 keywords that appear in the article.\n\
         \n\
         {WORD_BUDGET_LABEL} {max_words}\n\
         \n\
         Use the article below as the sole source of truth:\n\
         \n\
         {}",
        article_block(article)
    )
}

pub fn references_prompt(article: &str, entity: &str) -> String {
    format!(
        "Given the article and the entity named below, return a list of the sentences \
         in the article that refer to the entity, both direct and indirect matches \
         (e.g. pronouns, nicknames, abbreviations, subsidiaries, etc.).\n\
         Copy each sentence exactly as it appears in the article.\n\
         \n\
         {ENTITY_LABEL}\n\
         {entity}\n\
         \n\
         {}",
        article_block(article)
    )
}

pub fn answer_prompt(article: &str, question: &str) -> String {
    format!(
        "Read the article, and answer the user's question.\n\
         Return a JSON object with keys:\n\
         \"answer\": <short answer>,\n\
         \"evidence\": [list of KEYWORDS copied verbatim from the article that justify the answer]\n\
         \n\
         {}\n\
         \n\
         {QUESTION_LABEL}\n\
         {question}",
        article_block(article)
    )
}

/// Folds the question onto one line and appends a question mark unless it
/// already ends with one.
pub fn normalize_question(question: &str) -> String {
    let question = question.split_whitespace().collect::<Vec<_>>().join(" ");
    if question.ends_with('?') {
        question
    } else {
        format!("{}?", question)
    }
}

/// Byte ranges of the whole article block and of the article inside it.
fn article_ranges(prompt: &str) -> Option<((usize, usize), (usize, usize))> {
    let label = prompt.find(ARTICLE_LABEL)?;
    let after_label = label + ARTICLE_LABEL.len();
    let start = after_label + prompt[after_label..].find(FENCE_OPEN)? + FENCE_OPEN.len();
    let end = start + prompt[start..].rfind(FENCE_CLOSE)?;
    Some(((label, end + FENCE_CLOSE.len()), (start, end)))
}

/// The article embedded in `prompt`, if any.
pub fn extract_article(prompt: &str) -> Option<&str> {
    let (_, (start, end)) = article_ranges(prompt)?;
    Some(&prompt[start..end])
}

/// The single line following `label` (`ENTITY:`, `QUESTION:`), looked up
/// outside the article block.
pub fn extract_field<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    let (before, after) = match article_ranges(prompt) {
        Some(((block_start, block_end), _)) => (&prompt[..block_start], &prompt[block_end..]),
        None => (prompt, ""),
    };

    let rest = before
        .find(label)
        .map(|idx| &before[idx + label.len()..])
        .or_else(|| after.find(label).map(|idx| &after[idx + label.len()..]))?;

    let line = rest.trim_start_matches([' ', '\n']).lines().next()?.trim();
    (!line.is_empty()).then_some(line)
}

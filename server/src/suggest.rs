use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const SUMMARY_LIMIT: usize = 180;
const SUMMARY_TRUNCATED_LENGTH: usize = 177;
const TITLE_TAGS: usize = 3;
const MAX_TAGS: usize = 6;

// Word boundaries are ASCII only, so accented letters count as separators.
// The Science and Health patterns only anchor their first and last
// alternatives, so "research" and "medicine" match inside longer words.
static TOPICS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "AI",
            r"(?i)(?-u:\b)(ai|artificial intelligence|ml|machine learning)(?-u:\b)",
        ),
        ("JavaScript", r"(?i)(?-u:\b)(js|javascript|react|node)(?-u:\b)"),
        ("Business", r"(?i)(?-u:\b)(startup|business|market|finance)(?-u:\b)"),
        ("Science", r"(?i)(?-u:\b)science|research|study(?-u:\b)"),
        ("Health", r"(?i)(?-u:\b)health|medicine|medical(?-u:\b)"),
    ]
    .iter()
    .map(|(label, pattern)| (*label, Regex::new(pattern).expect("invalid topic pattern")))
    .collect()
});

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SuggestionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub summary: String,
    pub tags: String,
}

/// Derives a summary and a comma separated tag list from an article draft.
pub fn suggest(title: &str, content: &str) -> Suggestion {
    let plain = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let summary = if plain.chars().count() > SUMMARY_LIMIT {
        let mut summary = plain
            .chars()
            .take(SUMMARY_TRUNCATED_LENGTH)
            .collect::<String>();
        summary.push_str("...");
        summary
    } else {
        plain.clone()
    };

    let topics = TOPICS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&plain))
        .map(|(label, _)| *label);
    let title_words = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .take(TITLE_TAGS);

    let mut tags: Vec<&str> = Vec::with_capacity(MAX_TAGS);
    for tag in topics.chain(title_words) {
        if tags.len() == MAX_TAGS {
            break;
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    Suggestion {
        summary,
        tags: tags.join(","),
    }
}

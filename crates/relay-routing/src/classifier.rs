//! Keyword classifier mapping query text to a type and complexity score.
//!
//! Rules are evaluated top to bottom and the first match wins. Several
//! keyword tables overlap ("analyze" is both a complexity marker and a
//! reasoning marker), so the order is part of the behaviour.

use relay_core::QueryType;
use serde::Serialize;

/// Complexity score, 1 (trivial) to 10 (hardest).
pub type Complexity = u8;

/// Lowest valid complexity score.
pub const MIN_COMPLEXITY: Complexity = 1;
/// Highest valid complexity score.
pub const MAX_COMPLEXITY: Complexity = 10;

const EMBEDDING_MARKERS: &[&str] = &["embedding", "encode"];
const CODE_MARKERS: &[&str] = &[
    "code",
    "function",
    "class",
    "python",
    "javascript",
    "typescript",
    "debug",
    "error",
    // Syntax that shows up in pasted snippets without any of the words above.
    "def ",
    "fn ",
    "#include",
    "=>",
];
const COMPLEXITY_MARKERS: &[&str] = &["analyze", "complex", "reasoning", "explain why"];
const SUMMARIZATION_MARKERS: &[&str] = &["summarize", "summary", "tldr", "brief"];
const EXTRACTION_MARKERS: &[&str] = &["extract", "find", "list", "identify"];
const REASONING_MARKERS: &[&str] = &["analyze", "reasoning", "complex", "explain why", "compare"];

/// Context length below which an unmarked query counts as simple.
const SHORT_CONTEXT: u32 = 500;
/// Context length below which an otherwise unmatched query stays simple.
const DEFAULT_SIMPLE_CONTEXT: u32 = 1000;

/// Result of classifying one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Detected or caller-supplied type.
    pub query_type: QueryType,
    /// Score in `MIN_COMPLEXITY..=MAX_COMPLEXITY`.
    pub complexity: Complexity,
    /// Context length the rules were evaluated against.
    pub context_length: u32,
}

/// Ordered-rule query classifier.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    /// Context length above which reasoning queries score as hard.
    simple_query_tokens: u32,
}

impl QueryClassifier {
    /// Classifier that scores reasoning above `simple_query_tokens` as hard.
    pub fn new(simple_query_tokens: u32) -> Self {
        Self {
            simple_query_tokens,
        }
    }

    /// Classify `text`, estimating the context length from its whitespace
    /// token count when no positive hint is given.
    pub fn classify(&self, text: &str, context_length_hint: Option<u32>) -> Classification {
        let context_length = resolve_context_length(text, context_length_hint);
        let (query_type, complexity) = self.apply_rules(&text.to_lowercase(), context_length);

        Classification {
            query_type,
            complexity,
            context_length,
        }
    }

    fn apply_rules(&self, text: &str, context_length: u32) -> (QueryType, Complexity) {
        if contains_any(text, EMBEDDING_MARKERS) {
            return (QueryType::Embedding, 1);
        }

        if contains_any(text, CODE_MARKERS) {
            return (QueryType::Code, 3);
        }

        if context_length < SHORT_CONTEXT && !contains_any(text, COMPLEXITY_MARKERS) {
            return (QueryType::Simple, 1);
        }

        if contains_any(text, SUMMARIZATION_MARKERS) {
            return (QueryType::Summarization, 2);
        }

        if contains_any(text, EXTRACTION_MARKERS) {
            return (QueryType::Extraction, 2);
        }

        if contains_any(text, REASONING_MARKERS) {
            let complexity = if context_length > self.simple_query_tokens {
                7
            } else {
                5
            };
            return (QueryType::Reasoning, complexity);
        }

        if context_length < DEFAULT_SIMPLE_CONTEXT {
            (QueryType::Simple, 2)
        } else {
            (QueryType::Summarization, 4)
        }
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(2000)
    }
}

/// Whitespace token count, used when callers don't supply a context length.
pub fn estimate_context_length(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// A zero hint means "unknown", same as an absent one.
pub fn resolve_context_length(text: &str, hint: Option<u32>) -> u32 {
    hint.filter(|&length| length > 0)
        .unwrap_or_else(|| estimate_context_length(text))
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}

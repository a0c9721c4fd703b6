//! Insight generation seam (spec.md §4.4). The wire contract this mirrors
//! is the original's single prompt: sentiment label, key point, suggestion,
//! "do not provide any explanations." The model behind that prompt is an
//! opaque provider out of scope here (spec.md §1); `TemplateInsightEngine`
//! produces the same three-field shape from lexical heuristics instead of
//! a real inference call.

use std::collections::HashSet;

/// Generates short fixed-template commentary for a call transcript. The
/// production-shaped seam a real LLM runtime plugs into.
pub trait InsightEngine: Send + Sync {
    fn infer(&self, call_id: &str, text: &str) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

const POSITIVE_WORDS: &[&str] = &["great", "thanks", "thank", "happy", "good", "love", "excellent", "perfect", "awesome"];
const NEGATIVE_WORDS: &[&str] = &["angry", "refund", "broken", "cancel", "bad", "hate", "terrible", "complaint", "issue", "problem"];

/// Deterministic lexical stand-in for the LLM described in spec.md §4.4.
pub struct TemplateInsightEngine;

impl TemplateInsightEngine {
    pub fn new() -> Self {
        Self
    }

    fn classify(words: &[&str]) -> Sentiment {
        let positive: HashSet<&str> = POSITIVE_WORDS.iter().copied().collect();
        let negative: HashSet<&str> = NEGATIVE_WORDS.iter().copied().collect();
        let mut score = 0i32;
        for w in words {
            let lw = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if positive.contains(lw.as_str()) {
                score += 1;
            }
            if negative.contains(lw.as_str()) {
                score -= 1;
            }
        }
        match score.cmp(&0) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }

    fn key_point(text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return "no discernible topic".to_string();
        }
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if words.len() <= 8 {
            trimmed.to_string()
        } else {
            format!("{}...", words[..8].join(" "))
        }
    }

    fn suggestion(sentiment: Sentiment) -> &'static str {
        match sentiment {
            Sentiment::Positive => "Reinforce the positive experience and offer related products.",
            Sentiment::Negative => "Escalate to a senior agent and follow up within 24 hours.",
            Sentiment::Neutral => "Continue gathering requirements before recommending a plan.",
        }
    }
}

impl Default for TemplateInsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine for TemplateInsightEngine {
    fn infer(&self, call_id: &str, text: &str) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        let sentiment = Self::classify(&words);
        let key_point = Self::key_point(text);
        let suggestion = Self::suggestion(sentiment);
        tracing::debug!(call_id, sentiment = sentiment.label(), "generated insight");
        format!("Sentiment: {}\nKey Point: {}\nSuggestion: {}", sentiment.label(), key_point, suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_words_yield_positive_sentiment() {
        let engine = TemplateInsightEngine::new();
        let out = engine.infer("c1", "thanks so much, this is great");
        assert!(out.starts_with("Sentiment: Positive"));
    }

    #[test]
    fn negative_words_yield_negative_sentiment() {
        let engine = TemplateInsightEngine::new();
        let out = engine.infer("c1", "this is broken and I want a refund");
        assert!(out.starts_with("Sentiment: Negative"));
    }

    #[test]
    fn no_sentiment_words_yield_neutral() {
        let engine = TemplateInsightEngine::new();
        let out = engine.infer("c1", "the invoice is dated next Tuesday");
        assert!(out.starts_with("Sentiment: Neutral"));
    }

    #[test]
    fn empty_text_has_placeholder_key_point() {
        let engine = TemplateInsightEngine::new();
        let out = engine.infer("c1", "");
        assert!(out.contains("Key Point: no discernible topic"));
    }

    #[test]
    fn long_transcript_key_point_is_truncated() {
        let engine = TemplateInsightEngine::new();
        let text = "one two three four five six seven eight nine ten";
        let out = engine.infer("c1", text);
        assert!(out.contains("Key Point: one two three four five six seven eight..."));
    }
}

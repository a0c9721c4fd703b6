use std::collections::HashSet;

use vox_wire::WordTiming;

/// spec.md §4.3 step 5 ("Filtering for finals").
#[derive(Clone, Debug)]
pub struct FilterConfig {
    pub max_gap_secs: f32,
    pub confidence_threshold: f32,
    pub min_phrase_words: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { max_gap_secs: 0.5, confidence_threshold: 0.7, min_phrase_words: 1 }
    }
}

const ENGLISH_JUNK_PHRASES: &[&str] = &["the", "uh um", "the uh"];
const JAPANESE_FILLERS: &[&str] = &["えっと", "あの", "うーん"];

/// Apply the phrase-split/confidence/junk-word filter to a final result's
/// per-word metadata and rejoin the surviving phrases. Returns an empty
/// string if nothing survives.
pub fn filter_final(words: &[WordTiming], language: &str, cfg: &FilterConfig) -> String {
    if words.is_empty() {
        return String::new();
    }

    let is_japanese = language.starts_with("ja");
    let junk: HashSet<&str> = if is_japanese { HashSet::new() } else { ENGLISH_JUNK_PHRASES.iter().copied().collect() };

    let mut kept = Vec::new();
    for phrase in split_into_phrases(words, cfg.max_gap_secs) {
        if phrase.len() < cfg.min_phrase_words {
            continue;
        }
        let avg_confidence = phrase.iter().map(|w| w.confidence).sum::<f32>() / phrase.len() as f32;
        if avg_confidence < cfg.confidence_threshold {
            continue;
        }
        let collapsed = collapse_adjacent_repeats(&phrase);
        if collapsed.is_empty() {
            continue;
        }
        if is_japanese && collapsed.len() == 1 && JAPANESE_FILLERS.contains(&collapsed[0].word.as_str()) {
            continue;
        }
        let text = join_words(&collapsed, is_japanese);
        if text.trim().is_empty() {
            continue;
        }
        if !is_japanese && junk.contains(text.trim().to_lowercase().as_str()) {
            continue;
        }
        kept.push(text);
    }

    kept.join(if is_japanese { "" } else { " " })
}

fn split_into_phrases(words: &[WordTiming], max_gap_secs: f32) -> Vec<Vec<WordTiming>> {
    let mut phrases: Vec<Vec<WordTiming>> = Vec::new();
    let mut current: Vec<WordTiming> = Vec::new();
    for w in words {
        if let Some(last) = current.last() {
            if w.start - last.end > max_gap_secs {
                phrases.push(std::mem::take(&mut current));
            }
        }
        current.push(w.clone());
    }
    if !current.is_empty() {
        phrases.push(current);
    }
    phrases
}

fn collapse_adjacent_repeats(words: &[WordTiming]) -> Vec<WordTiming> {
    let mut out: Vec<WordTiming> = Vec::with_capacity(words.len());
    for w in words {
        let is_repeat = out.last().map(|p: &WordTiming| p.word.eq_ignore_ascii_case(&w.word)).unwrap_or(false);
        if !is_repeat {
            out.push(w.clone());
        }
    }
    out
}

fn join_words(words: &[WordTiming], is_japanese: bool) -> String {
    let sep = if is_japanese { "" } else { " " };
    words.iter().map(|w| w.word.as_str()).collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(word: &str, start: f32, end: f32, confidence: f32) -> WordTiming {
        WordTiming { word: word.to_string(), start, end, confidence }
    }

    #[test]
    fn drops_low_confidence_phrase() {
        let words = vec![w("hello", 0.0, 0.3, 0.9), w("there", 0.3, 0.6, 0.2)];
        // single phrase (no gap) -> average confidence 0.55 < 0.7 -> dropped
        assert_eq!(filter_final(&words, "en", &FilterConfig::default()), "");
    }

    #[test]
    fn splits_on_gap_and_keeps_confident_phrase() {
        let words = vec![
            w("hello", 0.0, 0.3, 0.95),
            w("there", 0.3, 0.6, 0.95),
            w("ignored", 3.0, 3.3, 0.1), // far gap, separate low-confidence phrase
        ];
        assert_eq!(filter_final(&words, "en", &FilterConfig::default()), "hello there");
    }

    #[test]
    fn drops_english_junk_phrase() {
        let words = vec![w("the", 0.0, 0.1, 0.95)];
        assert_eq!(filter_final(&words, "en", &FilterConfig::default()), "");
    }

    #[test]
    fn collapses_adjacent_repeats() {
        let words = vec![w("the", 0.0, 0.1, 0.95), w("the", 0.1, 0.2, 0.95), w("cat", 0.2, 0.3, 0.95)];
        assert_eq!(filter_final(&words, "en", &FilterConfig::default()), "the cat");
    }

    #[test]
    fn drops_standalone_japanese_filler() {
        let words = vec![w("えっと", 0.0, 0.2, 0.95)];
        assert_eq!(filter_final(&words, "ja", &FilterConfig::default()), "");
    }

    #[test]
    fn joins_japanese_without_space() {
        let words = vec![w("こんにちは", 0.0, 0.2, 0.95), w("世界", 0.2, 0.4, 0.95)];
        assert_eq!(filter_final(&words, "ja", &FilterConfig::default()), "こんにちは世界");
    }

    #[test]
    fn empty_words_yield_empty_string() {
        assert_eq!(filter_final(&[], "en", &FilterConfig::default()), "");
    }
}

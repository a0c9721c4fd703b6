use async_trait::async_trait;

use vox_wire::WordTiming;

/// What a recognizer produces for one fed chunk (or on finalize).
#[derive(Clone, Debug, PartialEq)]
pub enum RecognizerOutcome {
    /// Nothing to emit (more audio needed, or the chunk was silent).
    None,
    /// Running best guess for the current utterance.
    Partial(String),
    /// Committed transcript for a completed utterance, with optional
    /// per-word timing/confidence metadata for phrase filtering.
    Final { text: String, words: Option<Vec<WordTiming>> },
}

/// One incremental speech recognizer bound to a single speaker and
/// language. The recognizer model itself is an opaque provider (spec.md
/// §1) — this trait is the seam a real engine (Whisper, Vosk, a hosted
/// streaming STT API) plugs into.
#[async_trait]
pub trait Recognizer: Send {
    /// Feed exactly one accumulated chunk (already silence-gated).
    async fn feed(&mut self, pcm: &[u8]) -> RecognizerOutcome;

    /// Flush any buffered audio at session teardown, emitting a final
    /// transcript if one is pending.
    async fn finalize(&mut self) -> RecognizerOutcome;
}

/// Builds per-speaker recognizer instances bound to a language tag.
pub trait RecognizerFactory: Send + Sync {
    fn create(&self, language: &str) -> Box<dyn Recognizer>;
}

/// Deterministic stand-in recognizer used where no real speech engine is
/// wired in. It treats every third fed chunk as the end of an utterance:
/// the first two emit a partial, the third emits a final built from the
/// same running word count, with synthetic per-word timing so the phrase
/// filter has something to operate on. This is intentionally simple — the
/// real recognition model is out of scope per spec.md §1.
pub struct PlaceholderRecognizer {
    language: String,
    chunks_since_final: u32,
    words_this_utterance: Vec<String>,
}

impl PlaceholderRecognizer {
    pub fn new(language: impl Into<String>) -> Self {
        Self { language: language.into(), chunks_since_final: 0, words_this_utterance: Vec::new() }
    }

    fn next_word(&self) -> String {
        format!("{}-word-{}", self.language, self.words_this_utterance.len() + 1)
    }

    fn emit_final(&mut self) -> RecognizerOutcome {
        if self.words_this_utterance.is_empty() {
            self.chunks_since_final = 0;
            return RecognizerOutcome::None;
        }
        let mut t = 0.0f32;
        let words: Vec<WordTiming> = self
            .words_this_utterance
            .drain(..)
            .map(|w| {
                let start = t;
                let end = t + 0.25;
                t = end + 0.05;
                WordTiming { word: w, start, end, confidence: 0.9 }
            })
            .collect();
        let text = words.iter().map(|w| w.word.as_str()).collect::<Vec<_>>().join(" ");
        self.chunks_since_final = 0;
        RecognizerOutcome::Final { text, words: Some(words) }
    }
}

#[async_trait]
impl Recognizer for PlaceholderRecognizer {
    async fn feed(&mut self, pcm: &[u8]) -> RecognizerOutcome {
        if pcm.iter().all(|&b| b == 0) {
            return RecognizerOutcome::None;
        }
        self.words_this_utterance.push(self.next_word());
        self.chunks_since_final += 1;
        if self.chunks_since_final >= 3 {
            self.emit_final()
        } else {
            RecognizerOutcome::Partial(self.words_this_utterance.join(" "))
        }
    }

    async fn finalize(&mut self) -> RecognizerOutcome {
        self.emit_final()
    }
}

pub struct PlaceholderRecognizerFactory;

impl RecognizerFactory for PlaceholderRecognizerFactory {
    fn create(&self, language: &str) -> Box<dyn Recognizer> {
        Box::new(PlaceholderRecognizer::new(language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn silent_chunk_yields_none() {
        let mut r = PlaceholderRecognizer::new("en");
        let silence = vec![0u8; 100];
        assert_eq!(r.feed(&silence).await, RecognizerOutcome::None);
    }

    #[tokio::test]
    async fn third_chunk_emits_final() {
        let mut r = PlaceholderRecognizer::new("en");
        let chunk = vec![1u8; 100];
        assert!(matches!(r.feed(&chunk).await, RecognizerOutcome::Partial(_)));
        assert!(matches!(r.feed(&chunk).await, RecognizerOutcome::Partial(_)));
        match r.feed(&chunk).await {
            RecognizerOutcome::Final { words: Some(w), .. } => assert_eq!(w.len(), 3),
            other => panic!("expected final, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn finalize_with_no_pending_audio_is_none() {
        let mut r = PlaceholderRecognizer::new("en");
        assert_eq!(r.finalize().await, RecognizerOutcome::None);
    }
}

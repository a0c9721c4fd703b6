//! Silence gating, optional VAD hook, final-transcript phrase filtering,
//! and the recognizer trait/factory seam (spec.md §4.3).

pub mod filter;
pub mod recognizer;
pub mod rms;
pub mod vad;

pub use filter::{filter_final, FilterConfig};
pub use recognizer::{PlaceholderRecognizer, PlaceholderRecognizerFactory, Recognizer, RecognizerFactory, RecognizerOutcome};
pub use rms::{gate, rms_normalized, DEFAULT_SILENCE_THRESHOLD};
pub use vad::{gate_chunk, VadError, VoiceActivityDetector};

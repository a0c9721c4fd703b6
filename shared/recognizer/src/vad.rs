use crate::rms::{gate, DEFAULT_SILENCE_THRESHOLD};

#[derive(Debug, thiserror::Error)]
#[error("voice activity detector error: {0}")]
pub struct VadError(pub String);

/// Optional voice-activity detector hook (spec.md §4.3 step 1: "An
/// implementation may additionally run a voice-activity detector against
/// 20 ms frames; if it errors, fall back to the RMS test"). No
/// implementation is shipped — the detection model is an opaque provider
/// outside this crate's scope, same as the recognizer itself.
pub trait VoiceActivityDetector: Send + Sync {
    fn is_speech(&self, frame_i16: &[i16]) -> Result<bool, VadError>;
}

const VAD_FRAME_SECONDS: f64 = 0.02;

/// Silence-gate one PCM chunk, preferring `vad` (evaluated per 20ms
/// sub-frame; any voiced sub-frame keeps the whole chunk) and falling back
/// to the RMS test when no VAD is configured or it returns an error.
pub fn gate_chunk(
    pcm: &[u8],
    threshold: f32,
    sample_rate: u32,
    vad: Option<&dyn VoiceActivityDetector>,
) -> Vec<u8> {
    if let Some(v) = vad {
        match vad_any_frame_is_speech(pcm, sample_rate, v) {
            Ok(voiced) => {
                return if voiced { pcm.to_vec() } else { vec![0u8; pcm.len()] };
            }
            Err(_) => {
                // fall through to RMS per spec
            }
        }
    }
    gate(pcm, threshold)
}

fn vad_any_frame_is_speech(
    pcm: &[u8],
    sample_rate: u32,
    vad: &dyn VoiceActivityDetector,
) -> Result<bool, VadError> {
    let frame_len = ((sample_rate as f64) * VAD_FRAME_SECONDS).round() as usize;
    let frame_len = frame_len.max(1);
    let samples: Vec<i16> = pcm
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();
    for frame in samples.chunks(frame_len) {
        if vad.is_speech(frame)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysSpeech;
    impl VoiceActivityDetector for AlwaysSpeech {
        fn is_speech(&self, _frame: &[i16]) -> Result<bool, VadError> {
            Ok(true)
        }
    }

    struct AlwaysErrors;
    impl VoiceActivityDetector for AlwaysErrors {
        fn is_speech(&self, _frame: &[i16]) -> Result<bool, VadError> {
            Err(VadError("boom".into()))
        }
    }

    #[test]
    fn vad_says_speech_keeps_quiet_chunk() {
        let pcm = vec![0u8; 960 * 2];
        let gated = gate_chunk(&pcm, DEFAULT_SILENCE_THRESHOLD, 48_000, Some(&AlwaysSpeech));
        assert_eq!(gated, pcm);
    }

    #[test]
    fn vad_error_falls_back_to_rms() {
        let pcm = vec![0u8; 960 * 2]; // silent by RMS too
        let gated = gate_chunk(&pcm, DEFAULT_SILENCE_THRESHOLD, 48_000, Some(&AlwaysErrors));
        assert!(gated.iter().all(|&b| b == 0));
    }

    #[test]
    fn no_vad_uses_rms() {
        let pcm = vec![0u8; 640];
        let gated = gate_chunk(&pcm, DEFAULT_SILENCE_THRESHOLD, 48_000, None);
        assert!(gated.iter().all(|&b| b == 0));
    }
}

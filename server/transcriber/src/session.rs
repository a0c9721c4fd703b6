use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;
use vox_metrics::CallMetrics;
use vox_recognizer::{filter_final, gate, FilterConfig, Recognizer, RecognizerFactory, RecognizerOutcome};
use vox_wire::{Cohort, TranscriberEvent};

use crate::insight_client;
use crate::state::TranscriberState;

/// One item on a call's PCM queue (spec.md §3 "Per-call recognition
/// queue"). `Shutdown` is the sentinel that finalizes and terminates the
/// recognition-drain task.
pub enum PcmItem {
    Chunk { cohort: Cohort, pcm: Vec<u8> },
    Shutdown,
}

/// One item on a call's insight queue (spec.md §3 "Per-call insight
/// queue").
enum InsightItem {
    Request { call_id: String, text: String, sales_username: String },
    Shutdown,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub silence_threshold: f32,
    pub process_threshold_bytes: usize,
    pub filter: FilterConfig,
    pub insight_url: String,
    pub insight_timeout: Duration,
    pub queue_depth: usize,
}

struct SpeakerState {
    language: String,
    recognizer: Box<dyn Recognizer>,
    buffer: Vec<u8>,
    prev_partial: String,
}

/// Handle to a running call session: the sender half of both per-call
/// queues (spec.md §3). Dropping it without calling `shutdown` still
/// terminates both tasks once the channels close, but `shutdown` posts
/// the explicit sentinel spec.md §4.3 calls for, which lets
/// recognition-drain finalize buffered audio before exiting.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) pcm_tx: mpsc::Sender<PcmItem>,
    insight_tx: mpsc::Sender<InsightItem>,
}

impl SessionHandle {
    pub(crate) async fn shutdown(&self) {
        let _ = self.pcm_tx.send(PcmItem::Shutdown).await;
        let _ = self.insight_tx.send(InsightItem::Shutdown).await;
    }
}

/// Starts the two per-call supervisor tasks (recognition-drain,
/// insight-drain) described in spec.md §4.3 and §9 "Per-call task
/// lifetimes", and returns a handle to both queues.
#[allow(clippy::too_many_arguments)]
pub fn spawn(
    call_id: String,
    caller_group: Cohort,
    callee_group: Cohort,
    caller_language: String,
    callee_language: String,
    sales_username: Option<String>,
    state: Arc<TranscriberState>,
    recognizer_factory: Arc<dyn RecognizerFactory>,
    cfg: SessionConfig,
    call_metrics: Arc<CallMetrics>,
) -> SessionHandle {
    let (pcm_tx, pcm_rx) = mpsc::channel(cfg.queue_depth);
    let (insight_tx, insight_rx) = mpsc::channel(cfg.queue_depth);

    tokio::spawn(insight_drain(
        insight_rx,
        cfg.insight_url.clone(),
        cfg.insight_timeout,
        state.clone(),
        call_metrics.clone(),
    ));

    let mut speakers = HashMap::new();
    speakers.insert(
        caller_group,
        SpeakerState { language: caller_language.clone(), recognizer: recognizer_factory.create(&caller_language), buffer: Vec::new(), prev_partial: String::new() },
    );
    speakers.insert(
        callee_group,
        SpeakerState { language: callee_language.clone(), recognizer: recognizer_factory.create(&callee_language), buffer: Vec::new(), prev_partial: String::new() },
    );

    tokio::spawn(recognition_drain(pcm_rx, call_id, speakers, sales_username, state, insight_tx.clone(), cfg, call_metrics));

    SessionHandle { pcm_tx, insight_tx }
}

async fn recognition_drain(
    mut pcm_rx: mpsc::Receiver<PcmItem>,
    call_id: String,
    mut speakers: HashMap<Cohort, SpeakerState>,
    sales_username: Option<String>,
    state: Arc<TranscriberState>,
    insight_tx: mpsc::Sender<InsightItem>,
    cfg: SessionConfig,
    call_metrics: Arc<CallMetrics>,
) {
    while let Some(item) = pcm_rx.recv().await {
        match item {
            PcmItem::Shutdown => {
                let cohorts: Vec<Cohort> = speakers.keys().copied().collect();
                for cohort in cohorts {
                    // Feed whatever sub-threshold residue is still sitting in
                    // the buffer before finalizing, so the last utterance
                    // isn't silently dropped (spec.md §4.3 "Session
                    // teardown": "finalize any still-buffered PCM through
                    // each recognizer to emit any last transcript").
                    let residual: Vec<u8> = {
                        let speaker = speakers.get_mut(&cohort).expect("cohort present");
                        std::mem::take(&mut speaker.buffer)
                    };
                    if !residual.is_empty() {
                        let outcome = {
                            let speaker = speakers.get_mut(&cohort).expect("cohort present");
                            speaker.recognizer.feed(&residual).await
                        };
                        dispatch(&call_id, cohort, outcome, &mut speakers, &sales_username, &state, &insight_tx, &cfg, &call_metrics).await;
                    }
                    let outcome = {
                        let speaker = speakers.get_mut(&cohort).expect("cohort present");
                        speaker.recognizer.finalize().await
                    };
                    dispatch(&call_id, cohort, outcome, &mut speakers, &sales_username, &state, &insight_tx, &cfg, &call_metrics).await;
                }
                break;
            }
            PcmItem::Chunk { cohort, pcm } => {
                if !speakers.contains_key(&cohort) {
                    continue;
                }
                let gated = gate(&pcm, cfg.silence_threshold);
                speakers.get_mut(&cohort).expect("checked above").buffer.extend_from_slice(&gated);

                loop {
                    let ready = speakers.get(&cohort).map(|s| s.buffer.len() >= cfg.process_threshold_bytes).unwrap_or(false);
                    if !ready {
                        break;
                    }
                    let prefix: Vec<u8> = speakers
                        .get_mut(&cohort)
                        .expect("checked above")
                        .buffer
                        .drain(..cfg.process_threshold_bytes)
                        .collect();
                    let outcome = {
                        let speaker = speakers.get_mut(&cohort).expect("checked above");
                        speaker.recognizer.feed(&prefix).await
                    };
                    dispatch(&call_id, cohort, outcome, &mut speakers, &sales_username, &state, &insight_tx, &cfg, &call_metrics).await;
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn dispatch(
    call_id: &str,
    cohort: Cohort,
    outcome: RecognizerOutcome,
    speakers: &mut HashMap<Cohort, SpeakerState>,
    sales_username: &Option<String>,
    state: &Arc<TranscriberState>,
    insight_tx: &mpsc::Sender<InsightItem>,
    cfg: &SessionConfig,
    call_metrics: &Arc<CallMetrics>,
) {
    let speaker = speakers.get_mut(&cohort).expect("cohort present");

    match outcome {
        RecognizerOutcome::None => {}
        RecognizerOutcome::Partial(text) => {
            if text.is_empty() || text == speaker.prev_partial {
                return;
            }
            speaker.prev_partial = text.clone();
            call_metrics.recognizer_partial();
            let Some(sales) = sales_username else { return };
            state
                .send_to(sales, TranscriberEvent::Transcription { call_id: call_id.to_string(), group: cohort, text, is_final: false })
                .await;
        }
        RecognizerOutcome::Final { text, words } => {
            let final_text = match words {
                Some(w) => filter_final(&w, &speaker.language, &cfg.filter),
                None => text,
            };
            speaker.prev_partial.clear();
            if final_text.is_empty() {
                return;
            }
            call_metrics.recognizer_final(final_text.split_whitespace().count());
            let Some(sales) = sales_username else { return };
            state
                .send_to(
                    sales,
                    TranscriberEvent::Transcription { call_id: call_id.to_string(), group: cohort, text: final_text.clone(), is_final: true },
                )
                .await;
            if cohort == Cohort::Customers {
                let _ = insight_tx
                    .try_send(InsightItem::Request { call_id: call_id.to_string(), text: final_text, sales_username: sales.clone() });
            }
        }
    }
}

async fn insight_drain(
    mut insight_rx: mpsc::Receiver<InsightItem>,
    insight_url: String,
    timeout: Duration,
    state: Arc<TranscriberState>,
    call_metrics: Arc<CallMetrics>,
) {
    while let Some(item) = insight_rx.recv().await {
        let (call_id, text, sales_username) = match item {
            InsightItem::Shutdown => break,
            InsightItem::Request { call_id, text, sales_username } => (call_id, text, sales_username),
        };

        call_metrics.insight_requested();
        let started = std::time::Instant::now();
        match insight_client::request(&insight_url, &call_id, &text, timeout).await {
            Ok(reply) => {
                call_metrics.insight_received(started.elapsed().as_secs_f64());
                state.send_to(&sales_username, TranscriberEvent::Insight { call_id, text: reply }).await;
            }
            Err(e) => {
                warn!(call_id, error = %e, "insight request failed, skipping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use vox_metrics::LabelPolicy;
    use vox_recognizer::PlaceholderRecognizerFactory;

    use super::*;

    fn loud_chunk() -> Vec<u8> {
        let mut out = Vec::with_capacity(200);
        for i in 0..100 {
            let v: i16 = if i % 2 == 0 { 20_000 } else { -20_000 };
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    fn test_cfg() -> SessionConfig {
        SessionConfig {
            silence_threshold: vox_recognizer::DEFAULT_SILENCE_THRESHOLD,
            process_threshold_bytes: 200,
            filter: FilterConfig::default(),
            insight_url: "wss://127.0.0.1:1".to_string(),
            insight_timeout: StdDuration::from_millis(50),
            queue_depth: 16,
        }
    }

    #[tokio::test]
    async fn recognition_drain_reports_partials_and_final_to_sales_only() {
        let state = TranscriberState::new();
        let (sales_tx, mut sales_rx) = mpsc::channel(16);
        state.register(Cohort::Sales, "alice", "en".to_string(), sales_tx).await;

        let session = spawn(
            "call-1".to_string(),
            Cohort::Customers,
            Cohort::Sales,
            "en".to_string(),
            "en".to_string(),
            Some("alice".to_string()),
            state.clone(),
            Arc::new(PlaceholderRecognizerFactory),
            test_cfg(),
            Arc::new(CallMetrics::new("test_transcriber", LabelPolicy::default())),
        );

        let chunk = loud_chunk();
        for _ in 0..3 {
            session.pcm_tx.send(PcmItem::Chunk { cohort: Cohort::Customers, pcm: chunk.clone() }).await.unwrap();
        }
        session.shutdown().await;

        let mut saw_partial = false;
        let mut saw_final = false;
        while let Ok(Some(event)) = tokio::time::timeout(StdDuration::from_millis(200), sales_rx.recv()).await {
            match event {
                TranscriberEvent::Transcription { is_final: false, .. } => saw_partial = true,
                TranscriberEvent::Transcription { is_final: true, group, .. } => {
                    saw_final = true;
                    assert_eq!(group, Cohort::Customers);
                }
                _ => {}
            }
        }
        assert!(saw_partial, "expected at least one partial transcription");
        assert!(saw_final, "expected a final transcription once three chunks were fed");
    }

    #[tokio::test]
    async fn shutdown_with_no_audio_produces_no_events() {
        let state = TranscriberState::new();
        let (sales_tx, mut sales_rx) = mpsc::channel(16);
        state.register(Cohort::Sales, "alice", "en".to_string(), sales_tx).await;

        let session = spawn(
            "call-2".to_string(),
            Cohort::Customers,
            Cohort::Sales,
            "en".to_string(),
            "en".to_string(),
            Some("alice".to_string()),
            state.clone(),
            Arc::new(PlaceholderRecognizerFactory),
            test_cfg(),
            Arc::new(CallMetrics::new("test_transcriber", LabelPolicy::default())),
        );

        session.shutdown().await;
        let outcome = tokio::time::timeout(StdDuration::from_millis(200), sales_rx.recv()).await;
        assert!(outcome.is_err(), "expected no event within the timeout window, got {outcome:?}");
    }
}

//! Synthesis invocation and post-processing (trim, gain, clip).

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use tts_core::{
    ServiceConfig, SpeechEngine, SynthesisRequest, SynthesisResult, TtsError, TtsResult,
    VoiceTable,
};

use crate::engine::EngineGate;
use crate::metrics::TtsMetrics;
use crate::resolve::ParameterResolver;

/// Number of leading samples covering `duration_secs` of speech.
pub fn trim_len(sample_rate: u32, duration_secs: f32) -> usize {
    (sample_rate as f64 * duration_secs as f64).floor() as usize
}

/// Trim the engine row to the spoken duration, apply gain, then hard-clip to [-1, 1].
///
/// NaN samples become silence.
pub fn post_process(mut row: Vec<f32>, sample_rate: u32, duration_secs: f32, volume: f32) -> Vec<f32> {
    row.truncate(trim_len(sample_rate, duration_secs));
    for sample in &mut row {
        let gained = *sample * volume;
        *sample = if gained.is_nan() {
            0.0
        } else {
            gained.clamp(-1.0, 1.0)
        };
    }
    row
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

/// Immutable state shared by every request and connection.
///
/// Built once at bootstrap; nothing here is mutated afterwards.
#[derive(Debug)]
pub struct SynthesisService {
    config: ServiceConfig,
    voices: VoiceTable,
    engine: EngineGate,
    metrics: TtsMetrics,
}

impl SynthesisService {
    pub fn new(config: ServiceConfig, voices: VoiceTable, engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            config,
            voices,
            engine: EngineGate::new(engine),
            metrics: TtsMetrics::init_noop(),
        }
    }

    /// Attach a metrics recorder.
    pub fn with_metrics(mut self, metrics: TtsMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn voices(&self) -> &VoiceTable {
        &self.voices
    }

    pub fn metrics(&self) -> &TtsMetrics {
        &self.metrics
    }

    pub fn sample_rate(&self) -> u32 {
        self.engine.sample_rate()
    }

    pub fn resolver(&self) -> ParameterResolver<'_> {
        ParameterResolver::new(&self.config, &self.voices)
    }

    /// Run the engine for a resolved request and post-process its output.
    ///
    /// Blocks for the whole inference; async callers use [`Self::synthesize`].
    #[instrument(skip_all, fields(voice = %request.voice, lang = %request.lang))]
    pub fn invoke(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult> {
        let style = self
            .voices
            .get(&request.voice)
            .ok_or_else(|| TtsError::UnsupportedVoice(request.voice.clone()))?;

        info!(
            text = %preview(&request.text),
            speed = request.speed,
            volume = request.volume,
            quality = request.quality,
            "Synthesizing"
        );

        let start = Instant::now();
        let output = self.engine.synthesize(
            &request.text,
            request.lang,
            style,
            request.quality,
            request.speed,
        )?;
        let inference_ms = start.elapsed().as_secs_f64() * 1000.0;

        let duration_secs = output
            .duration
            .seconds()
            .ok_or_else(|| TtsError::engine("engine returned an empty duration"))?;
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(TtsError::engine(format!(
                "engine returned an invalid duration: {duration_secs}"
            )));
        }

        let row = output
            .waveform
            .into_iter()
            .next()
            .ok_or_else(|| TtsError::engine("engine returned an empty waveform"))?;

        let sample_rate = self.engine.sample_rate();
        let raw_len = row.len();
        let samples = post_process(row, sample_rate, duration_secs, request.volume);

        info!(duration_secs, "Generated audio");
        debug!(
            raw_samples = raw_len,
            samples = samples.len(),
            inference_ms,
            "Post-processed engine output"
        );

        self.metrics.record_inference_latency(inference_ms);
        if duration_secs > 0.0 {
            self.metrics
                .record_rtf(inference_ms / 1000.0 / duration_secs as f64);
        }

        Ok(SynthesisResult {
            samples,
            duration_secs,
            sample_rate,
        })
    }

    /// Run [`Self::invoke`] on the blocking pool so other connections keep progressing.
    pub async fn synthesize(self: &Arc<Self>, request: SynthesisRequest) -> TtsResult<SynthesisResult> {
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || service.invoke(&request))
            .await
            .map_err(|e| TtsError::engine(format!("synthesis task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_core::{EngineDuration, EngineOutput, Lang, StyleTensor, VoiceStyle};

    /// Engine returning a fixed waveform and duration.
    struct FixedEngine {
        sample_rate: u32,
        row: Vec<f32>,
        duration: EngineDuration,
    }

    impl SpeechEngine for FixedEngine {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn synthesize(
            &self,
            _text: &str,
            _lang: Lang,
            _style: &VoiceStyle,
            _total_step: u32,
            _speed: f32,
        ) -> TtsResult<EngineOutput> {
            Ok(EngineOutput {
                waveform: vec![self.row.clone(), vec![9.0; self.row.len()]],
                duration: self.duration.clone(),
            })
        }
    }

    struct FailingEngine;

    impl SpeechEngine for FailingEngine {
        fn sample_rate(&self) -> u32 {
            24_000
        }

        fn synthesize(
            &self,
            _text: &str,
            _lang: Lang,
            _style: &VoiceStyle,
            _total_step: u32,
            _speed: f32,
        ) -> TtsResult<EngineOutput> {
            Err(TtsError::engine("out of memory"))
        }
    }

    struct PanickingEngine;

    impl SpeechEngine for PanickingEngine {
        fn sample_rate(&self) -> u32 {
            24_000
        }

        fn synthesize(
            &self,
            _text: &str,
            _lang: Lang,
            _style: &VoiceStyle,
            _total_step: u32,
            _speed: f32,
        ) -> TtsResult<EngineOutput> {
            panic!("engine crashed");
        }
    }

    fn voices() -> VoiceTable {
        let tensor = StyleTensor::new(vec![1], vec![0.3]).unwrap();
        VoiceTable::from_styles([(
            "M4".to_string(),
            VoiceStyle {
                ttl: tensor.clone(),
                dp: tensor,
            },
        )])
    }

    fn request(volume: f32) -> SynthesisRequest {
        SynthesisRequest {
            text: "Bonjour".into(),
            lang: Lang::Fr,
            voice: "M4".into(),
            speed: 1.5,
            volume,
            quality: 5,
        }
    }

    fn service(engine: impl SpeechEngine + 'static) -> SynthesisService {
        SynthesisService::new(ServiceConfig::default(), voices(), Arc::new(engine))
    }

    #[test]
    fn test_trim_len_floors() {
        assert_eq!(trim_len(100, 0.5), 50);
        assert_eq!(trim_len(44_100, 1.0), 44_100);
        assert_eq!(trim_len(10, 0.25), 2);
        assert_eq!(trim_len(24_000, 0.0), 0);
    }

    #[test]
    fn test_post_process_clips_and_preserves_interior() {
        let row = vec![0.1, -0.2, 0.6, -0.7, 0.25, 0.0];
        let out = post_process(row, 4, 1.5, 2.0);
        assert_eq!(out, vec![0.2, -0.4, 1.0, -1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_post_process_output_stays_in_range() {
        let row = vec![0.0, 0.5, f32::NAN, -3.0];
        let out = post_process(row, 4, 1.0, f32::INFINITY);
        assert_eq!(out, vec![0.0, 1.0, 0.0, -1.0]);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_trims_to_reported_duration() {
        // 100 Hz, 0.5 s spoken out of 1.0 s returned.
        let svc = service(FixedEngine {
            sample_rate: 100,
            row: vec![0.1; 100],
            duration: EngineDuration::Scalar(0.5),
        });

        let result = svc.invoke(&request(1.0)).unwrap();
        assert_eq!(result.num_samples(), 50);
        assert_eq!(result.sample_rate, 100);
        assert_eq!(result.duration_secs, 0.5);
    }

    #[test]
    fn test_batched_duration_uses_first_entry() {
        let svc = service(FixedEngine {
            sample_rate: 100,
            row: vec![0.1; 100],
            duration: EngineDuration::Batch(vec![0.25, 0.75]),
        });

        let result = svc.invoke(&request(1.0)).unwrap();
        assert_eq!(result.num_samples(), 25);
    }

    #[test]
    fn test_only_first_row_is_used() {
        let svc = service(FixedEngine {
            sample_rate: 10,
            row: vec![0.1; 10],
            duration: EngineDuration::Scalar(1.0),
        });

        let result = svc.invoke(&request(1.0)).unwrap();
        assert!(result.samples.iter().all(|s| (*s - 0.1).abs() < 1e-6));
    }

    #[test]
    fn test_gain_then_clip() {
        let svc = service(FixedEngine {
            sample_rate: 4,
            row: vec![0.3, -0.3, 0.6, -0.9],
            duration: EngineDuration::Scalar(1.0),
        });

        let result = svc.invoke(&request(2.0)).unwrap();
        assert_eq!(result.samples, vec![0.6, -0.6, 1.0, -1.0]);
    }

    #[test]
    fn test_invocation_is_idempotent() {
        let svc = service(crate::engine::MockEngine::new(16_000));
        let a = svc.invoke(&request(2.0)).unwrap();
        let b = svc.invoke(&request(2.0)).unwrap();

        assert_eq!(a.num_samples(), trim_len(16_000, a.duration_secs));
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn test_empty_duration_is_engine_failure() {
        let svc = service(FixedEngine {
            sample_rate: 10,
            row: vec![0.1; 10],
            duration: EngineDuration::Batch(Vec::new()),
        });

        assert!(matches!(svc.invoke(&request(1.0)), Err(TtsError::Engine(_))));
    }

    #[test]
    fn test_engine_error_propagates() {
        let svc = service(FailingEngine);
        let err = svc.invoke(&request(1.0)).unwrap_err();
        assert!(matches!(err, TtsError::Engine(ref msg) if msg == "out of memory"));
        assert!(!err.is_caller_fault());
    }

    #[test]
    fn test_unknown_voice_not_passed_to_engine() {
        let svc = service(FailingEngine);
        let mut req = request(1.0);
        req.voice = "F9".into();
        assert!(matches!(
            svc.invoke(&req),
            Err(TtsError::UnsupportedVoice(_))
        ));
    }

    #[tokio::test]
    async fn test_async_synthesis() {
        let svc = Arc::new(service(FixedEngine {
            sample_rate: 100,
            row: vec![0.2; 100],
            duration: EngineDuration::Scalar(0.3),
        }));

        let result = svc.synthesize(request(1.0)).await.unwrap();
        assert_eq!(result.num_samples(), 30);
    }

    #[tokio::test]
    async fn test_engine_panic_becomes_engine_failure() {
        let svc = Arc::new(service(PanickingEngine));
        let err = svc.synthesize(request(1.0)).await.unwrap_err();
        assert!(matches!(err, TtsError::Engine(_)));
    }
}

//! Engine access: the process-wide gate and the mock engine.

use std::f32::consts::PI;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use tts_core::{
    EngineDuration, EngineOutput, Lang, SpeechEngine, TtsError, TtsResult, VoiceStyle,
};

/// Shared handle to the loaded engine.
///
/// Calls into engines that are not reentrant are serialized through one
/// mutex for the whole process. The sample rate is read once here.
pub struct EngineGate {
    engine: Arc<dyn SpeechEngine>,
    sample_rate: u32,
    lock: Option<Mutex<()>>,
}

impl std::fmt::Debug for EngineGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineGate")
            .field("sample_rate", &self.sample_rate)
            .field("serialized", &self.lock.is_some())
            .finish()
    }
}

impl EngineGate {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        let sample_rate = engine.sample_rate();
        let lock = (!engine.is_reentrant()).then(|| Mutex::new(()));
        Self {
            engine,
            sample_rate,
            lock,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether calls are serialized.
    pub fn is_serialized(&self) -> bool {
        self.lock.is_some()
    }

    /// Run one engine call, holding the gate for its full duration.
    ///
    /// Any error the engine raises is reported as an engine failure.
    pub fn synthesize(
        &self,
        text: &str,
        lang: Lang,
        style: &VoiceStyle,
        total_step: u32,
        speed: f32,
    ) -> TtsResult<EngineOutput> {
        let _guard = self.lock.as_ref().map(|lock| lock.lock());
        self.engine
            .synthesize(text, lang, style, total_step, speed)
            .map_err(|e| match e {
                TtsError::Engine(_) => e,
                other => TtsError::engine(other.to_string()),
            })
    }
}

/// Load the engine served by the process.
///
/// Failure here is fatal to startup.
pub fn load_engine(model_dir: impl AsRef<Path>, sample_rate: u32) -> TtsResult<Arc<dyn SpeechEngine>> {
    let model_dir = model_dir.as_ref();
    info!(dir = %model_dir.display(), "Loading TTS engine");
    let engine = MockEngine::load(model_dir, sample_rate)?;
    if engine.sample_rate() == 0 {
        return Err(TtsError::Bootstrap(
            "engine reported a zero sample rate".to_string(),
        ));
    }
    info!(sample_rate = engine.sample_rate(), "TTS engine loaded");
    Ok(Arc::new(engine))
}

/// Seconds of speech the mock engine produces per character at speed 1.0.
const MOCK_SECS_PER_CHAR: f32 = 0.06;

/// Deterministic stand-in engine that renders a tone per voice.
///
/// Like the neural engine it pads its output with silence past the spoken
/// duration, so trimming is exercised end to end.
#[derive(Debug, Clone)]
pub struct MockEngine {
    sample_rate: u32,
    padding_secs: f32,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl MockEngine {
    pub fn new(sample_rate: u32) -> Self {
        info!(sample_rate, "Creating mock TTS engine");
        Self {
            sample_rate,
            padding_secs: 0.25,
        }
    }

    /// Bring the engine up from its model asset directory.
    ///
    /// The directory must exist and be listable.
    pub fn load(model_dir: impl AsRef<Path>, sample_rate: u32) -> TtsResult<Self> {
        let model_dir = model_dir.as_ref();
        let entries = std::fs::read_dir(model_dir).map_err(|e| {
            TtsError::Bootstrap(format!(
                "cannot open model directory {}: {e}",
                model_dir.display()
            ))
        })?;
        debug!(
            dir = %model_dir.display(),
            assets = entries.count(),
            "Model directory opened"
        );
        Ok(Self::new(sample_rate))
    }

    fn pitch_hz(style: &VoiceStyle, lang: Lang) -> f32 {
        let energy: f32 = style.dp.data.iter().map(|v| v.abs()).sum();
        let lang_offset = Lang::ALL.iter().position(|l| *l == lang).unwrap_or(0) as f32;
        120.0 + (energy * 37.0) % 120.0 + lang_offset * 5.0
    }
}

impl SpeechEngine for MockEngine {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize(
        &self,
        text: &str,
        lang: Lang,
        style: &VoiceStyle,
        total_step: u32,
        speed: f32,
    ) -> TtsResult<EngineOutput> {
        if text.trim().is_empty() {
            return Err(TtsError::engine("nothing to synthesize"));
        }
        if speed <= 0.0 || total_step == 0 {
            return Err(TtsError::engine(format!(
                "invalid inference settings: speed={speed}, total_step={total_step}"
            )));
        }

        let chars = text.chars().count() as f32;
        let duration = (chars * MOCK_SECS_PER_CHAR / speed).max(0.1);
        let rate = self.sample_rate as f32;
        let spoken = (duration * rate) as usize;
        let total = spoken + (self.padding_secs * rate) as usize;

        let freq = Self::pitch_hz(style, lang);
        // More steps give a cleaner (louder) tone, mirroring refinement.
        let amplitude = 0.2 + 0.02 * total_step.min(10) as f32;

        let row = (0..total)
            .map(|i| {
                if i < spoken {
                    amplitude * (2.0 * PI * freq * i as f32 / rate).sin()
                } else {
                    0.0
                }
            })
            .collect();

        Ok(EngineOutput {
            waveform: vec![row],
            duration: EngineDuration::Batch(vec![duration]),
        })
    }

    fn is_reentrant(&self) -> bool {
        true
    }
}

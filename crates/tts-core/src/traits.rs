//! Boundary to the inference engine.

use crate::error::TtsResult;
use crate::types::Lang;
use crate::voice::VoiceStyle;

/// Duration reported by the engine, either a scalar or a batch of one.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineDuration {
    Scalar(f32),
    Batch(Vec<f32>),
}

impl EngineDuration {
    /// Duration in seconds of the first (only) batch entry.
    pub fn seconds(&self) -> Option<f32> {
        match self {
            Self::Scalar(secs) => Some(*secs),
            Self::Batch(values) => values.first().copied(),
        }
    }
}

/// Raw engine output before trimming and gain.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// Batched waveform rows; synthesis only ever uses the first row.
    pub waveform: Vec<Vec<f32>>,
    /// Spoken duration.
    pub duration: EngineDuration,
}

/// Text-to-speech inference engine.
///
/// Implementations are opaque: they receive text, language, a voice style,
/// a refinement step count, and a speed factor, and return a waveform whose
/// tail may contain padding beyond the spoken duration.
pub trait SpeechEngine: Send + Sync {
    /// Fixed output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Run inference.
    ///
    /// # Arguments
    /// * `text` - Text to speak
    /// * `lang` - Language of the text
    /// * `style` - Speaker style bundle
    /// * `total_step` - Number of refinement steps
    /// * `speed` - Speech speed multiplier
    fn synthesize(
        &self,
        text: &str,
        lang: Lang,
        style: &VoiceStyle,
        total_step: u32,
        speed: f32,
    ) -> TtsResult<EngineOutput>;

    /// Whether concurrent `synthesize` calls are safe.
    ///
    /// Engines that do not opt in are serialized process-wide.
    fn is_reentrant(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_normalization() {
        assert_eq!(EngineDuration::Scalar(1.5).seconds(), Some(1.5));
        assert_eq!(EngineDuration::Batch(vec![2.25, 9.0]).seconds(), Some(2.25));
        assert_eq!(EngineDuration::Batch(Vec::new()).seconds(), None);
    }
}

//! Core data types for the synthesis path.

use serde::{Deserialize, Serialize};

use crate::error::{TtsError, TtsResult};

/// Voice identifiers the service attempts to load at startup.
pub const SUPPORTED_VOICES: [&str; 10] = [
    "M1", "M2", "M3", "M4", "M5", "F1", "F2", "F3", "F4", "F5",
];

/// Supported languages for TTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// English.
    En,
    /// French.
    #[default]
    Fr,
    /// Spanish.
    Es,
    /// Portuguese.
    Pt,
    /// Korean.
    Ko,
}

impl Lang {
    /// All supported languages, in advertised order.
    pub const ALL: [Lang; 5] = [Lang::En, Lang::Fr, Lang::Es, Lang::Pt, Lang::Ko];

    /// Two-letter language code.
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Fr => "fr",
            Lang::Es => "es",
            Lang::Pt => "pt",
            Lang::Ko => "ko",
        }
    }

    /// Codes of every supported language.
    pub fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(Lang::code).collect()
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Lang {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == s)
            .ok_or_else(|| TtsError::UnsupportedLanguage(s.to_string()))
    }
}

/// A numeric parameter as supplied by a caller.
///
/// Query strings always carry text, JSON bodies may carry numbers or strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericParam {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl NumericParam {
    /// Convert to a float that is finite at `f32` precision.
    pub fn to_f32(&self, name: &'static str) -> TtsResult<f32> {
        let value = match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| TtsError::invalid_parameter(name, s.as_str()))?,
            Self::Other(v) => return Err(TtsError::invalid_parameter(name, v.to_string())),
        };

        let value = value as f32;
        if !value.is_finite() {
            return Err(TtsError::invalid_parameter(name, self.describe()));
        }
        Ok(value)
    }

    /// Convert to a step count of at least one.
    ///
    /// Floats are truncated toward zero; strings must hold an integer.
    pub fn to_steps(&self, name: &'static str) -> TtsResult<u32> {
        let value = match self {
            Self::Int(v) => *v,
            Self::Float(v) if v.is_finite() => v.trunc() as i64,
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| TtsError::invalid_parameter(name, s.as_str()))?,
            _ => return Err(TtsError::invalid_parameter(name, self.describe())),
        };

        u32::try_from(value)
            .ok()
            .filter(|steps| *steps >= 1)
            .ok_or_else(|| TtsError::invalid_parameter(name, self.describe()))
    }

    fn describe(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Other(v) => v.to_string(),
        }
    }
}

impl From<f64> for NumericParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for NumericParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for NumericParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Unresolved synthesis parameters, exactly as a caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SynthesisParams {
    pub text: Option<String>,
    pub language: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<NumericParam>,
    pub volume: Option<NumericParam>,
    pub quality: Option<NumericParam>,
}

impl SynthesisParams {
    /// Parameters carrying only the text to synthesize.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// A fully resolved, validated synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    /// Text to synthesize (never empty).
    pub text: String,
    /// Target language.
    pub lang: Lang,
    /// Voice id, present in the voice table.
    pub voice: String,
    /// Speech speed multiplier.
    pub speed: f32,
    /// Linear gain applied after trimming.
    pub volume: f32,
    /// Engine refinement step count.
    pub quality: u32,
}

/// Post-processed synthesis output.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Mono samples, trimmed, gained and clipped to [-1, 1].
    pub samples: Vec<f32>,
    /// Spoken duration reported by the engine.
    pub duration_secs: f32,
    /// Engine sample rate in Hz.
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Number of samples.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Duration of the emitted samples in milliseconds.
    pub fn duration_ms(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 * 1000.0 / self.sample_rate as f32
    }
}

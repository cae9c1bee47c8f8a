//! Parameter resolution: caller values → configuration defaults → validation.

use tracing::warn;

use tts_core::{
    Lang, NumericParam, ServiceConfig, SynthesisParams, SynthesisRequest, TtsError, TtsResult,
    VoiceTable,
};

/// Split a composite voice token such as `fr_M4` into language and voice id.
///
/// Tokens without an underscore are a bare voice id.
pub fn split_voice_token(token: &str) -> (Option<&str>, &str) {
    match token.split_once('_') {
        Some((lang, voice)) => (Some(lang), voice),
        None => (None, token),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Merges caller parameters with the process configuration.
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'a> {
    config: &'a ServiceConfig,
    voices: &'a VoiceTable,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(config: &'a ServiceConfig, voices: &'a VoiceTable) -> Self {
        Self { config, voices }
    }

    /// Resolve request/response parameters. Unknown voices are rejected.
    pub fn resolve(&self, params: SynthesisParams) -> TtsResult<SynthesisRequest> {
        let text = Self::require_text(params.text)?;

        let speed = Self::float_or(params.speed.as_ref(), "speed", self.config.speed)?;
        let volume = Self::float_or(params.volume.as_ref(), "volume", self.config.volume_boost)?;
        let quality = match &params.quality {
            Some(value) => value.to_steps("quality")?,
            None => self.config.quality,
        };

        let lang = self.lang_or_default(non_empty(params.language.as_deref()))?;

        let voice = non_empty(params.voice.as_deref())
            .unwrap_or(&self.config.default_voice)
            .to_string();
        if !self.voices.contains(&voice) {
            return Err(TtsError::UnsupportedVoice(voice));
        }

        Self::check_speed(speed)?;

        Ok(SynthesisRequest {
            text,
            lang,
            voice,
            speed,
            volume,
            quality,
        })
    }

    /// Resolve a streaming synthesize command.
    ///
    /// The voice token may be composite (`fr_M4`). An unknown voice id is
    /// replaced with the configured default instead of failing.
    pub fn resolve_voice_token(
        &self,
        text: Option<String>,
        voice_token: Option<&str>,
    ) -> TtsResult<SynthesisRequest> {
        let text = Self::require_text(text)?;

        let (lang_code, voice_id) = match non_empty(voice_token) {
            Some(token) => split_voice_token(token),
            None => (None, ""),
        };

        let lang = self.lang_or_default(non_empty(lang_code))?;

        let default_voice = self.config.default_voice.as_str();
        let mut voice = non_empty(Some(voice_id)).unwrap_or(default_voice);
        if !self.voices.contains(voice) {
            warn!(
                requested = voice,
                fallback = default_voice,
                "Voice not found, using default"
            );
            voice = default_voice;
        }
        if !self.voices.contains(voice) {
            return Err(TtsError::UnsupportedVoice(voice.to_string()));
        }

        Self::check_speed(self.config.speed)?;

        Ok(SynthesisRequest {
            text,
            lang,
            voice: voice.to_string(),
            speed: self.config.speed,
            volume: self.config.volume_boost,
            quality: self.config.quality,
        })
    }

    fn require_text(text: Option<String>) -> TtsResult<String> {
        text.filter(|t| !t.is_empty()).ok_or(TtsError::MissingInput)
    }

    fn lang_or_default(&self, code: Option<&str>) -> TtsResult<Lang> {
        match code {
            Some(code) => code.parse(),
            None => Ok(self.config.default_language),
        }
    }

    fn float_or(value: Option<&NumericParam>, name: &'static str, default: f32) -> TtsResult<f32> {
        match value {
            Some(value) => value.to_f32(name),
            None => Ok(default),
        }
    }

    fn check_speed(speed: f32) -> TtsResult<()> {
        if speed > 0.0 {
            Ok(())
        } else {
            Err(TtsError::invalid_parameter("speed", speed.to_string()))
        }
    }
}

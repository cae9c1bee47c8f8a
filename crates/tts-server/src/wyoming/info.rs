//! Capability metadata returned for `describe`.

use serde::Serialize;
use serde_json::Value;

use tts_core::{Lang, TtsResult, VoiceTable};

use super::event::Event;
use super::messages::INFO;

pub const PROGRAM_NAME: &str = "supertonic";
const PROGRAM_DESCRIPTION: &str = "Supertonic2 neural text-to-speech";
const ATTRIBUTION_NAME: &str = "Supertone";
const ATTRIBUTION_URL: &str = "https://github.com/supertone-inc/supertonic";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribution {
    pub name: String,
    pub url: String,
}

impl Default for Attribution {
    fn default() -> Self {
        Self {
            name: ATTRIBUTION_NAME.to_string(),
            url: ATTRIBUTION_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtsVoice {
    /// `<language>_<voiceId>`.
    pub name: String,
    pub description: String,
    pub attribution: Attribution,
    pub installed: bool,
    pub version: Option<String>,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtsProgram {
    pub name: String,
    pub description: String,
    pub attribution: Attribution,
    pub installed: bool,
    pub version: Option<String>,
    pub voices: Vec<TtsVoice>,
    pub supports_synthesize_streaming: bool,
}

/// Full `info` payload; only the `tts` list is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub asr: Vec<Value>,
    pub tts: Vec<TtsProgram>,
    pub handle: Vec<Value>,
    pub intent: Vec<Value>,
    pub wake: Vec<Value>,
}

impl Info {
    /// Advertise every supported language × loaded voice pair as its own voice.
    pub fn build(voices: &VoiceTable) -> Self {
        let version = Some(env!("CARGO_PKG_VERSION").to_string());

        let tts_voices = Lang::ALL
            .iter()
            .flat_map(|lang| {
                let version = version.clone();
                voices.ids().into_iter().map(move |id| TtsVoice {
                    name: format!("{}_{id}", lang.code()),
                    description: format!("Supertonic {id} ({})", lang.code()),
                    attribution: Attribution::default(),
                    installed: true,
                    version: version.clone(),
                    languages: vec![lang.code().to_string()],
                })
            })
            .collect();

        Self {
            asr: Vec::new(),
            tts: vec![TtsProgram {
                name: PROGRAM_NAME.to_string(),
                description: PROGRAM_DESCRIPTION.to_string(),
                attribution: Attribution::default(),
                installed: true,
                version,
                voices: tts_voices,
                supports_synthesize_streaming: false,
            }],
            handle: Vec::new(),
            intent: Vec::new(),
            wake: Vec::new(),
        }
    }

    pub fn to_event(&self) -> TtsResult<Event> {
        Ok(Event::new(INFO).with_data(serde_json::to_value(self)?))
    }
}

//! Typed views of the events this server consumes and produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use audio_codec::{CHANNELS, SAMPLE_WIDTH};
use tts_core::{TtsError, TtsResult};

use super::event::Event;

pub const DESCRIBE: &str = "describe";
pub const INFO: &str = "info";
pub const SYNTHESIZE: &str = "synthesize";
pub const AUDIO_START: &str = "audio-start";
pub const AUDIO_CHUNK: &str = "audio-chunk";
pub const AUDIO_STOP: &str = "audio-stop";

/// Voice selection inside a synthesize command.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SynthesizeVoice {
    /// Voice token, possibly composite (`fr_M4`).
    pub name: Option<String>,
}

/// Synthesize command data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Synthesize {
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<SynthesizeVoice>,
}

impl Synthesize {
    /// Voice token named by the command, if any.
    pub fn voice_token(&self) -> Option<&str> {
        self.voice.as_ref().and_then(|v| v.name.as_deref())
    }
}

/// Inbound events the session reacts to.
#[derive(Debug)]
pub enum ClientEvent {
    Describe,
    /// A synthesize command; malformed data is carried as the error.
    Synthesize(TtsResult<Synthesize>),
    /// Any other event type, ignored.
    Other(String),
}

impl From<Event> for ClientEvent {
    fn from(event: Event) -> Self {
        match event.event_type.as_str() {
            DESCRIBE => Self::Describe,
            SYNTHESIZE => Self::Synthesize(
                serde_json::from_value(Value::Object(event.data))
                    .map_err(|e| TtsError::protocol(format!("invalid synthesize data: {e}"))),
            ),
            _ => Self::Other(event.event_type),
        }
    }
}

/// Format fields carried by every audio event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub rate: u32,
    /// Bytes per sample.
    pub width: u16,
    pub channels: u16,
}

impl AudioFormat {
    /// Mono signed 16-bit PCM at `rate`.
    pub fn pcm16(rate: u32) -> Self {
        Self {
            rate,
            width: SAMPLE_WIDTH,
            channels: CHANNELS,
        }
    }

    fn to_value(self) -> Value {
        serde_json::json!({
            "rate": self.rate,
            "width": self.width,
            "channels": self.channels,
        })
    }
}

pub fn audio_start(format: AudioFormat) -> Event {
    Event::new(AUDIO_START).with_data(format.to_value())
}

pub fn audio_chunk(format: AudioFormat, pcm: Vec<u8>) -> Event {
    Event::new(AUDIO_CHUNK)
        .with_data(format.to_value())
        .with_payload(pcm)
}

/// Terminal event for both completed and failed requests.
pub fn audio_stop() -> Event {
    Event::new(AUDIO_STOP)
}

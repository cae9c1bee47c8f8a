//! # tts-core
//!
//! Core types, traits, and error definitions for the Supertonic TTS service.
//!
//! This crate provides the foundational abstractions shared by the runtime,
//! the audio codec, and both protocol front-ends:
//!
//! - Request types (`Lang`, `SynthesisParams`, `SynthesisRequest`)
//! - The `SpeechEngine` boundary to the inference engine
//! - The voice style table loaded once at startup
//! - Unified error handling via `TtsError`
//! - The process-wide `ServiceConfig`

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod voice;

pub use config::ServiceConfig;
pub use error::{TtsError, TtsResult};
pub use traits::{EngineDuration, EngineOutput, SpeechEngine};
pub use types::{
    Lang, NumericParam, SUPPORTED_VOICES, SynthesisParams, SynthesisRequest, SynthesisResult,
};
pub use voice::{StyleTensor, VoiceStyle, VoiceTable};

//! # runtime
//!
//! Request-independent runtime for the Supertonic TTS service.
//!
//! This crate provides:
//! - Parameter resolution against the process configuration
//! - Gated engine access and synthesis post-processing
//! - A deterministic mock engine
//! - Structured logging and metrics

pub mod engine;
pub mod logging;
pub mod metrics;
pub mod resolve;
pub mod synthesis;

pub use engine::{EngineGate, MockEngine, load_engine};
pub use metrics::TtsMetrics;
pub use resolve::{ParameterResolver, split_voice_token};
pub use synthesis::{SynthesisService, post_process, trim_len};

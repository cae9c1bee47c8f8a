//! # tts-server
//!
//! Network front-ends for the Supertonic TTS service.
//!
//! Provides:
//! - HTTP request/response API returning WAV audio
//! - Wyoming-compatible streaming protocol server
//! - Optional zeroconf advertisement of the streaming listener
//! - Bootstrap and graceful shutdown

pub mod discovery;
pub mod http;
pub mod server;
pub mod wyoming;

pub use server::{ServerConfig, TtsServer};

//! # audio-codec
//!
//! Output encoding for synthesized speech.
//!
//! - Float → signed 16-bit little-endian PCM
//! - Fixed-size PCM chunking for the streaming protocol
//! - In-memory WAV encoding for the request/response API

pub mod pcm;
pub mod wav;

pub use pcm::{CHANNELS, CHUNK_SAMPLES, SAMPLE_WIDTH, pcm16_chunks, sample_to_i16, to_pcm16_le};
pub use wav::{decode_wav, encode_wav};
